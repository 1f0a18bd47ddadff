use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback type assigned when no caller-defined type applies.
pub const DEFAULT_ENTITY_TYPE_ID: i64 = 0;
pub const DEFAULT_ENTITY_TYPE_NAME: &str = "Entity";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeSource {
    Message,
    Json,
    Text,
}

/// One unit of prior input (a message, JSON document or text chunk).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub uuid: Uuid,
    pub name: String,
    pub content: String,
    pub source: EpisodeSource,
    pub source_description: String,
    pub valid_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(
        name: String,
        content: String,
        source: EpisodeSource,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name,
            content,
            source,
            source_description: String::new(),
            valid_at,
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self::new(
            format!("message-{}", now.timestamp_millis()),
            content.into(),
            EpisodeSource::Message,
            now,
        )
    }
}

/// JSON type of a declared attribute value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Number => "number",
            AttributeKind::Boolean => "boolean",
        }
    }

    /// Whether `value` has this kind. `null` is accepted for every kind.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (_, serde_json::Value::Null) => true,
            (AttributeKind::String, serde_json::Value::String(_)) => true,
            (AttributeKind::Integer, serde_json::Value::Number(n)) => n.is_i64() || n.is_u64(),
            (AttributeKind::Number, serde_json::Value::Number(_)) => true,
            (AttributeKind::Boolean, serde_json::Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// A property the attribute stage may fill in for entities of one type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeField {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: AttributeKind,
}

impl AttributeField {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: AttributeKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityTypeDef {
    pub entity_type_id: i64,
    pub entity_type_name: String,
    pub entity_type_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeField>,
}

impl EntityTypeDef {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            entity_type_id: id,
            entity_type_name: name.into(),
            entity_type_description: description.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, field: AttributeField) -> Self {
        self.attributes.push(field);
        self
    }
}

/// Caller-supplied enumeration of permissible entity types.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EntityTypeCatalog(Vec<EntityTypeDef>);

impl EntityTypeCatalog {
    pub fn new(types: Vec<EntityTypeDef>) -> Self {
        Self(types)
    }

    /// Prepend the catch-all `Entity` type (id 0) unless id 0 is already taken.
    pub fn with_default_type(mut self) -> Self {
        if !self.contains_id(DEFAULT_ENTITY_TYPE_ID) {
            self.0.insert(
                0,
                EntityTypeDef::new(
                    DEFAULT_ENTITY_TYPE_ID,
                    DEFAULT_ENTITY_TYPE_NAME,
                    "Default entity classification. Use this entity type if the entity is not one of the other listed types.",
                ),
            );
        }
        self
    }

    pub fn types(&self) -> &[EntityTypeDef] {
        &self.0
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.entity_type_name.as_str()).collect()
    }

    pub fn contains_id(&self, id: i64) -> bool {
        self.0.iter().any(|t| t.entity_type_id == id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|t| t.entity_type_name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attribute fields declared by every type named in `labels`, in catalog
    /// order. When two types declare the same field name the first one wins.
    pub fn attribute_fields_for(&self, labels: &[String]) -> Vec<AttributeField> {
        let mut fields: Vec<AttributeField> = Vec::new();
        for def in self.0.iter().filter(|t| labels.contains(&t.entity_type_name)) {
            for field in &def.attributes {
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// An already-extracted entity as seen by reflexion and classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateEntity {
    pub uuid: String,
    pub name: String,
}

impl CandidateEntity {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
        }
    }
}

/// The single target entity of the attribute and summary stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityNode {
    pub uuid: Uuid,
    pub name: String,
    pub labels: Vec<String>,
    pub summary: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl EntityNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            labels: vec![DEFAULT_ENTITY_TYPE_NAME.to_string()],
            summary: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Inputs for one stage invocation.
///
/// Every field is optional here; each builder validates the fields it needs
/// before rendering and reports the first absent one as `MissingInput`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub episode_content: Option<String>,
    pub previous_episodes: Option<Vec<Episode>>,
    pub entity_types: Option<EntityTypeCatalog>,
    pub custom_prompt: Option<String>,
    pub source_description: Option<String>,
    pub extracted_entities: Option<Vec<CandidateEntity>>,
    pub node: Option<EntityNode>,
    /// Attribute fields for the target node. When unset they are looked up in
    /// `entity_types` by the node's labels.
    #[serde(default)]
    pub attribute_fields: Option<Vec<AttributeField>>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_episode_content(mut self, content: impl Into<String>) -> Self {
        self.episode_content = Some(content.into());
        self
    }

    /// Prior episodes in any order; builders render them oldest first by
    /// `valid_at`, keeping the given order for equal timestamps.
    pub fn with_previous_episodes(mut self, episodes: Vec<Episode>) -> Self {
        self.previous_episodes = Some(episodes);
        self
    }

    pub fn with_entity_types(mut self, catalog: EntityTypeCatalog) -> Self {
        self.entity_types = Some(catalog);
        self
    }

    pub fn with_custom_prompt(mut self, custom_prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(custom_prompt.into());
        self
    }

    pub fn with_source_description(mut self, description: impl Into<String>) -> Self {
        self.source_description = Some(description.into());
        self
    }

    pub fn with_extracted_entities(mut self, entities: Vec<CandidateEntity>) -> Self {
        self.extracted_entities = Some(entities);
        self
    }

    pub fn with_node(mut self, node: EntityNode) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_attribute_fields(mut self, fields: Vec<AttributeField>) -> Self {
        self.attribute_fields = Some(fields);
        self
    }
}
