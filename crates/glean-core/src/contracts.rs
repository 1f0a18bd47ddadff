//! Output contracts: the shapes a model's structured answer must decode into,
//! one per stage, plus the downstream checks an orchestrator can run on them.

use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::context::{AttributeField, CandidateEntity, EntityTypeCatalog};
use crate::error::{GleanError, Result};

/// A record the model must produce. The schema is handed to the client for
/// structured output.
pub trait OutputContract: DeserializeOwned + JsonSchema {
    fn response_schema() -> Result<serde_json::Value> {
        Ok(serde_json::to_value(schemars::schema_for!(Self))?)
    }
}

pub fn summary_description(max_summary_chars: usize) -> String {
    format!(
        "Summary containing the important information about the entity. Under {max_summary_chars} characters."
    )
}

/// Schema of a summary-bearing contract with the character budget written
/// into the `summary` field description.
pub fn schema_with_summary_budget<T: OutputContract>(
    max_summary_chars: usize,
) -> Result<serde_json::Value> {
    let mut schema = T::response_schema()?;
    if let Some(summary) = schema
        .pointer_mut("/properties/summary")
        .and_then(|s| s.as_object_mut())
    {
        summary.insert(
            "description".to_string(),
            serde_json::Value::String(summary_description(max_summary_chars)),
        );
    }
    Ok(schema)
}

/// Attribute-stage schema: the budgeted summary plus one nullable property
/// per declared field. Undeclared keys are not allowed.
pub fn attribute_schema(
    max_summary_chars: usize,
    fields: &[AttributeField],
) -> Result<serde_json::Value> {
    let mut schema = schema_with_summary_budget::<ExtractedAttributes>(max_summary_chars)?;
    if let Some(root) = schema.as_object_mut() {
        let properties = root
            .entry("properties")
            .or_insert_with(|| serde_json::Value::Object(Default::default()));
        if let Some(properties) = properties.as_object_mut() {
            for field in fields.iter().filter(|f| f.name != "summary") {
                properties.insert(
                    field.name.clone(),
                    serde_json::json!({
                        "type": [field.kind.as_str(), "null"],
                        "description": field.description,
                    }),
                );
            }
        }
        root.insert(
            "additionalProperties".to_string(),
            serde_json::Value::Bool(false),
        );
    }
    Ok(schema)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExtractedEntity {
    /// Name of the extracted entity
    pub name: String,
    /// ID of the classified entity type. Must be one of the provided entity_type_id integers.
    pub entity_type_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExtractedEntities {
    /// List of extracted entities
    pub extracted_entities: Vec<ExtractedEntity>,
}

impl OutputContract for ExtractedEntities {}

impl ExtractedEntities {
    /// Every name is non-empty and every type id exists in the catalog.
    pub fn check_against(&self, catalog: &EntityTypeCatalog) -> Result<()> {
        for entity in &self.extracted_entities {
            if entity.name.trim().is_empty() {
                return Err(GleanError::ContractViolation(
                    "extracted entity with empty name".to_string(),
                ));
            }
            if !catalog.contains_id(entity.entity_type_id) {
                return Err(GleanError::ContractViolation(format!(
                    "entity '{}' has unknown entity_type_id {}",
                    entity.name, entity.entity_type_id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MissedEntities {
    /// Names of entities that weren't extracted
    pub missed_entities: Vec<String>,
}

impl OutputContract for MissedEntities {}

impl MissedEntities {
    /// Names not already present among `extracted`, compared case-insensitively.
    pub fn novel<'a>(&'a self, extracted: &[CandidateEntity]) -> Vec<&'a str> {
        let known: HashSet<String> = extracted
            .iter()
            .map(|e| e.name.trim().to_lowercase())
            .collect();
        self.missed_entities
            .iter()
            .map(|n| n.as_str())
            .filter(|n| !n.trim().is_empty() && !known.contains(&n.trim().to_lowercase()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EntityClassificationTriple {
    /// UUID of the entity
    pub uuid: String,
    /// Name of the entity
    pub name: String,
    /// Type of the entity. Must be one of the provided types or None
    #[serde(default)]
    pub entity_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EntityClassification {
    /// List of entities classification triples.
    pub entity_classifications: Vec<EntityClassificationTriple>,
}

impl OutputContract for EntityClassification {}

impl EntityClassification {
    /// One triple per input entity, identity carried forward unchanged, and
    /// each type either absent or a catalog name.
    ///
    /// Inputs may repeat a `(uuid, name)` pair; each occurrence is matched by
    /// exactly one triple.
    pub fn check_against(
        &self,
        entities: &[CandidateEntity],
        catalog: &EntityTypeCatalog,
    ) -> Result<()> {
        if self.entity_classifications.len() != entities.len() {
            return Err(GleanError::ContractViolation(format!(
                "expected {} classifications, got {}",
                entities.len(),
                self.entity_classifications.len()
            )));
        }

        // uuid -> names still waiting for a classification
        let mut expected: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entity in entities {
            expected
                .entry(entity.uuid.as_str())
                .or_default()
                .push(entity.name.as_str());
        }

        for triple in &self.entity_classifications {
            let pending = expected.get_mut(triple.uuid.as_str()).ok_or_else(|| {
                GleanError::ContractViolation(format!(
                    "classification for unknown uuid {}",
                    triple.uuid
                ))
            })?;
            if let Some(pos) = pending.iter().position(|name| *name == triple.name) {
                pending.remove(pos);
            } else if let Some(name) = pending.first() {
                return Err(GleanError::ContractViolation(format!(
                    "classification for {} renamed '{}' to '{}'",
                    triple.uuid, name, triple.name
                )));
            } else {
                return Err(GleanError::ContractViolation(format!(
                    "uuid {} classified more often than it was given",
                    triple.uuid
                )));
            }

            if let Some(entity_type) = &triple.entity_type {
                if !catalog.contains_name(entity_type) {
                    return Err(GleanError::ContractViolation(format!(
                        "entity '{}' classified as '{}', which is not in the catalog",
                        triple.name, entity_type
                    )));
                }
            }
        }
        Ok(())
    }

    /// uuid -> chosen type name, skipping "no match" triples.
    pub fn assignments(&self) -> BTreeMap<&str, &str> {
        self.entity_classifications
            .iter()
            .filter_map(|t| t.entity_type.as_deref().map(|ty| (t.uuid.as_str(), ty)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EntitySummary {
    /// Summary containing the important information about the entity.
    pub summary: String,
}

impl OutputContract for EntitySummary {}

impl EntitySummary {
    pub fn char_count(&self) -> usize {
        self.summary.chars().count()
    }

    /// Reports an over-budget summary. Never truncates.
    pub fn check_budget(&self, max_summary_chars: usize) -> Result<()> {
        let count = self.char_count();
        if count > max_summary_chars {
            return Err(GleanError::ContractViolation(format!(
                "summary is {count} characters, budget is {max_summary_chars}"
            )));
        }
        Ok(())
    }
}

/// Attribute-stage answer: the refreshed summary plus the properties declared
/// as `AttributeField`s for the target's type. Decoding accepts any key; use
/// `check_against` with the declared fields to reject the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExtractedAttributes {
    /// Summary containing the important information about the entity.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl OutputContract for ExtractedAttributes {}

impl ExtractedAttributes {
    /// Attributes with a non-null, non-empty value.
    pub fn present(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.attributes.iter().filter(|(_, v)| match v {
            serde_json::Value::Null => false,
            serde_json::Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    }

    /// Every key is a declared field and every non-null value has the
    /// declared kind.
    pub fn check_against(&self, declared: &[AttributeField]) -> Result<()> {
        for (key, value) in &self.attributes {
            let field = declared.iter().find(|f| &f.name == key).ok_or_else(|| {
                GleanError::ContractViolation(format!("undeclared attribute '{key}'"))
            })?;
            if !field.kind.accepts(value) {
                return Err(GleanError::ContractViolation(format!(
                    "attribute '{key}' should be {}, got {value}",
                    field.kind.as_str()
                )));
            }
        }
        Ok(())
    }

    pub fn check_budget(&self, max_summary_chars: usize) -> Result<()> {
        match &self.summary {
            Some(summary) => EntitySummary {
                summary: summary.clone(),
            }
            .check_budget(max_summary_chars),
            None => Ok(()),
        }
    }
}
