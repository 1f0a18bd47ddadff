use std::collections::HashMap;
use std::sync::Arc;

use glean_core::config::PromptConfig;
use glean_core::context::PromptContext;
use glean_core::error::{GleanError, Result};
use glean_core::message::{Message, Role};
use glean_core::prompt::{PromptBuilder, PromptName};

use crate::snippets::DO_NOT_ESCAPE_UNICODE;

/// Versioned lookup table from stage name to builder.
///
/// Several formulations of one stage can be registered side by side; callers
/// either pin a version or get the configured default.
#[derive(Clone)]
pub struct PromptLibrary {
    builders: HashMap<(PromptName, String), Arc<dyn PromptBuilder>>,
    default_version: String,
    preserve_unicode: bool,
}

impl PromptLibrary {
    /// An empty library. See [`crate::prompt_library`] for the stock one.
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            builders: HashMap::new(),
            default_version: config.prompt_version.clone(),
            preserve_unicode: config.preserve_unicode,
        }
    }

    pub fn register(&mut self, builder: Arc<dyn PromptBuilder>) {
        let key = (builder.name(), builder.version().to_string());
        if self.builders.contains_key(&key) {
            tracing::warn!(
                prompt = %key.0,
                version = %key.1,
                "Replacing registered prompt builder"
            );
        }
        self.builders.insert(key, builder);
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    pub fn get(&self, name: PromptName, version: &str) -> Result<Arc<dyn PromptBuilder>> {
        self.builders
            .get(&(name, version.to_string()))
            .cloned()
            .ok_or_else(|| GleanError::UnknownPrompt {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    /// The builder for `name` at the configured default version.
    pub fn resolve(&self, name: PromptName) -> Result<Arc<dyn PromptBuilder>> {
        self.get(name, &self.default_version)
    }

    pub fn build(&self, name: PromptName, context: &PromptContext) -> Result<Vec<Message>> {
        self.build_version(name, &self.default_version, context)
    }

    /// Build by stable string id, e.g. `"extract_message"`.
    pub fn build_by_id(&self, id: &str, context: &PromptContext) -> Result<Vec<Message>> {
        let name: PromptName = id.parse()?;
        self.build(name, context)
    }

    pub fn build_version(
        &self,
        name: PromptName,
        version: &str,
        context: &PromptContext,
    ) -> Result<Vec<Message>> {
        let builder = self.get(name, version)?;
        let mut messages = builder.build(context)?;

        if self.preserve_unicode {
            for message in messages.iter_mut().filter(|m| m.role == Role::System) {
                message.content.push_str(DO_NOT_ESCAPE_UNICODE);
            }
        }

        tracing::debug!(
            prompt = %name,
            version,
            messages = messages.len(),
            bytes = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Built prompt"
        );

        Ok(messages)
    }

    pub fn response_schema(&self, name: PromptName) -> Result<serde_json::Value> {
        self.resolve(name)?.response_schema()
    }

    /// Schema to send alongside `build(name, context)`.
    pub fn response_schema_for(
        &self,
        name: PromptName,
        context: &PromptContext,
    ) -> Result<serde_json::Value> {
        self.resolve(name)?.response_schema_for(context)
    }

    /// Registered stage names, in stage order.
    pub fn names(&self) -> Vec<PromptName> {
        let mut names: Vec<PromptName> = self.builders.keys().map(|(name, _)| *name).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn versions(&self, name: PromptName) -> Vec<&str> {
        let mut versions: Vec<&str> = self
            .builders
            .keys()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .collect();
        versions.sort();
        versions
    }
}
