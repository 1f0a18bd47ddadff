//! Typed access to the `PromptContext` fields a stage needs. Each accessor
//! fails with `MissingInput` naming the stage and the field.

use glean_core::context::{
    AttributeField, CandidateEntity, EntityNode, EntityTypeCatalog, Episode, PromptContext,
};
use glean_core::error::{GleanError, Result};
use glean_core::prompt::PromptName;

pub(crate) struct Inputs<'a> {
    prompt: PromptName,
    context: &'a PromptContext,
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(prompt: PromptName, context: &'a PromptContext) -> Self {
        Self { prompt, context }
    }

    fn missing(&self, field: &'static str) -> GleanError {
        tracing::debug!(prompt = %self.prompt, field, "Required prompt input missing");
        GleanError::MissingInput {
            prompt: self.prompt,
            field,
        }
    }

    /// Current episode content; blank content counts as missing.
    pub(crate) fn episode_content(&self) -> Result<&'a str> {
        match self.context.episode_content.as_deref() {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(self.missing("episode_content")),
        }
    }

    /// Prior episode contents, oldest first by `valid_at`. Equal timestamps
    /// keep the caller's order. An empty history is valid.
    pub(crate) fn previous_episodes(&self) -> Result<Vec<&'a str>> {
        let episodes = self
            .context
            .previous_episodes
            .as_ref()
            .ok_or_else(|| self.missing("previous_episodes"))?;
        let mut ordered: Vec<&'a Episode> = episodes.iter().collect();
        ordered.sort_by_key(|ep| ep.valid_at);
        Ok(ordered.into_iter().map(|ep| ep.content.as_str()).collect())
    }

    pub(crate) fn entity_types(&self) -> Result<&'a EntityTypeCatalog> {
        self.context
            .entity_types
            .as_ref()
            .ok_or_else(|| self.missing("entity_types"))
    }

    pub(crate) fn source_description(&self) -> Result<&'a str> {
        self.context
            .source_description
            .as_deref()
            .ok_or_else(|| self.missing("source_description"))
    }

    pub(crate) fn extracted_entities(&self) -> Result<&'a [CandidateEntity]> {
        self.context
            .extracted_entities
            .as_deref()
            .ok_or_else(|| self.missing("extracted_entities"))
    }

    pub(crate) fn node(&self) -> Result<&'a EntityNode> {
        let node = self.context.node.as_ref().ok_or_else(|| self.missing("node"))?;
        if node.name.trim().is_empty() {
            return Err(self.missing("node.name"));
        }
        Ok(node)
    }

    /// Declared attribute fields for the target node: the explicit list if
    /// given, else the catalog's fields for the node's labels, else none.
    pub(crate) fn attribute_fields(&self) -> Vec<AttributeField> {
        if let Some(fields) = &self.context.attribute_fields {
            return fields.clone();
        }
        match (&self.context.entity_types, &self.context.node) {
            (Some(catalog), Some(node)) => catalog.attribute_fields_for(&node.labels),
            _ => Vec::new(),
        }
    }

    pub(crate) fn custom_prompt(&self) -> &'a str {
        self.context.custom_prompt.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use glean_core::context::{AttributeKind, EntityTypeDef, EpisodeSource};

    #[test]
    fn test_blank_content_is_missing() {
        let ctx = PromptContext::new().with_episode_content("   \n");
        let err = Inputs::new(PromptName::ExtractText, &ctx)
            .episode_content()
            .unwrap_err();
        assert!(matches!(
            err,
            GleanError::MissingInput {
                prompt: PromptName::ExtractText,
                field: "episode_content"
            }
        ));
    }

    #[test]
    fn test_empty_history_is_present() {
        let ctx = PromptContext::new().with_previous_episodes(vec![]);
        let inputs = Inputs::new(PromptName::Reflexion, &ctx);
        assert!(inputs.previous_episodes().unwrap().is_empty());

        let ctx = PromptContext::new().with_previous_episodes(vec![Episode::message("a")]);
        assert_eq!(
            Inputs::new(PromptName::Reflexion, &ctx).previous_episodes().unwrap(),
            vec!["a"]
        );
    }

    #[test]
    fn test_unnamed_node_is_missing() {
        let ctx = PromptContext::new().with_node(EntityNode::new(""));
        let err = Inputs::new(PromptName::ExtractSummary, &ctx).node().unwrap_err();
        assert!(err.to_string().contains("node.name"));
    }

    #[test]
    fn test_history_ordered_by_valid_at() {
        let base = Utc::now();
        let at = |content: &str, minutes: i64| {
            Episode::new(
                content.to_string(),
                content.to_string(),
                EpisodeSource::Message,
                base + Duration::minutes(minutes),
            )
        };
        let ctx = PromptContext::new().with_previous_episodes(vec![
            at("Chris: my sister julia", 2),
            at("Chris: my sister katie", 1),
            at("Chris: she moved", 2),
        ]);
        assert_eq!(
            Inputs::new(PromptName::ExtractMessage, &ctx)
                .previous_episodes()
                .unwrap(),
            vec!["Chris: my sister katie", "Chris: my sister julia", "Chris: she moved"]
        );
    }

    #[test]
    fn test_attribute_fields_resolution() {
        let catalog = EntityTypeCatalog::new(vec![EntityTypeDef::new(1, "Person", "A human")
            .with_attribute(AttributeField::new("phone", "Phone number", AttributeKind::String))]);
        let node = EntityNode::new("Sarah Chen").with_label("Person");

        let from_catalog = PromptContext::new()
            .with_entity_types(catalog.clone())
            .with_node(node.clone());
        let names: Vec<String> = Inputs::new(PromptName::ExtractAttributes, &from_catalog)
            .attribute_fields()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["phone"]);

        let explicit = from_catalog.clone().with_attribute_fields(vec![]);
        assert!(Inputs::new(PromptName::ExtractAttributes, &explicit)
            .attribute_fields()
            .is_empty());

        let no_catalog = PromptContext::new().with_node(node);
        assert!(Inputs::new(PromptName::ExtractAttributes, &no_catalog)
            .attribute_fields()
            .is_empty());
    }

    #[test]
    fn test_custom_prompt_optional() {
        let ctx = PromptContext::new();
        assert_eq!(Inputs::new(PromptName::ExtractJson, &ctx).custom_prompt(), "");
    }
}
