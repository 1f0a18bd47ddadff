use std::fmt;
use std::str::FromStr;

use crate::context::PromptContext;
use crate::error::{GleanError, Result};
use crate::message::Message;

/// Stage identifiers exposed to the orchestrator. The string ids are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PromptName {
    ExtractMessage,
    ExtractJson,
    ExtractText,
    Reflexion,
    ClassifyNodes,
    ExtractAttributes,
    ExtractSummary,
}

impl PromptName {
    pub const ALL: [PromptName; 7] = [
        PromptName::ExtractMessage,
        PromptName::ExtractJson,
        PromptName::ExtractText,
        PromptName::Reflexion,
        PromptName::ClassifyNodes,
        PromptName::ExtractAttributes,
        PromptName::ExtractSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptName::ExtractMessage => "extract_message",
            PromptName::ExtractJson => "extract_json",
            PromptName::ExtractText => "extract_text",
            PromptName::Reflexion => "reflexion",
            PromptName::ClassifyNodes => "classify_nodes",
            PromptName::ExtractAttributes => "extract_attributes",
            PromptName::ExtractSummary => "extract_summary",
        }
    }
}

impl fmt::Display for PromptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptName {
    type Err = GleanError;

    fn from_str(s: &str) -> Result<Self> {
        PromptName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| GleanError::UnknownPrompt {
                name: s.to_string(),
                version: "*".to_string(),
            })
    }
}

/// Builds the instruction payload for one stage.
///
/// Implementations are pure: the same context always yields the same
/// messages, and nothing is shared between calls.
pub trait PromptBuilder: Send + Sync {
    fn name(&self) -> PromptName;

    fn version(&self) -> &str;

    /// Context fields that must be present before `build` renders anything.
    fn required_fields(&self) -> &'static [&'static str];

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>>;

    /// JSON schema of the stage's output contract.
    fn response_schema(&self) -> Result<serde_json::Value>;

    /// Schema for one invocation. Stages whose contract depends on the
    /// context (declared attribute fields) override this.
    fn response_schema_for(&self, _context: &PromptContext) -> Result<serde_json::Value> {
        self.response_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_name_round_trip() {
        for name in PromptName::ALL {
            assert_eq!(name.as_str().parse::<PromptName>().unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_prompt_name() {
        let err = "extract_edges".parse::<PromptName>().unwrap_err();
        assert!(matches!(err, GleanError::UnknownPrompt { .. }));
    }
}
