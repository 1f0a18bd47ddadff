use serde::{Deserialize, Serialize};

use crate::error::{GleanError, Result};

/// Character budget for entity summaries, shared by the summary and
/// attribute contracts.
pub const MAX_SUMMARY_CHARS: usize = 500;

pub const DEFAULT_PROMPT_VERSION: &str = "v1";

/// A worked example rendered into the conversational extraction prompt.
///
/// `entities` excludes the speaker, who is always prepended when rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityExample {
    pub message: String,
    pub entities: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ActivityExample {
    pub fn new(message: &str, entities: &[&str]) -> Self {
        Self {
            message: message.to_string(),
            entities: entities.iter().map(|e| e.to_string()).collect(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Controls how actionable statements in conversation are extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityPolicy {
    pub enabled: bool,
    /// Re-extract every entity an activity references, even if already known.
    pub reextract_referenced: bool,
    pub triggers: Vec<String>,
    pub reminder_phrases: Vec<String>,
    pub examples: Vec<ActivityExample>,
}

impl Default for ActivityPolicy {
    fn default() -> Self {
        let triggers = [
            "schedule", "follow up", "prepare", "review", "call", "meet", "contact", "arrange",
            "coordinate", "remind", "take", "go", "buy", "pick up",
        ];
        let reminder_phrases = ["remind me to...", "I need to...", "I should..."];
        Self {
            enabled: true,
            reextract_referenced: true,
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            reminder_phrases: reminder_phrases.iter().map(|p| p.to_string()).collect(),
            examples: vec![
                ActivityExample::new(
                    "Follow up with Sarah Chen about mortgage",
                    &["PersonNode(Sarah Chen)", "ActivityNode(follow up about mortgage)"],
                ),
                ActivityExample::new(
                    "Meet with inspector Mike for Johnson property",
                    &[
                        "PersonNode(Mike)",
                        "PropertyNode(Johnson property)",
                        "ActivityNode(meet with inspector)",
                    ],
                ),
                ActivityExample::new(
                    "Remind me to tell Lisa about the wedding",
                    &["PersonNode(Lisa)", "ActivityNode(tell Lisa about wedding)"],
                ),
                ActivityExample::new(
                    "Call mom tonight",
                    &["PersonNode(mom)", "ActivityNode(call mom)"],
                ),
                ActivityExample::new(
                    "Remind me to take out trash",
                    &["ActivityNode(take out trash)"],
                )
                .with_note("Activity connects only to speaker since no other entities mentioned"),
                ActivityExample::new(
                    "I need to check the Smith property listing",
                    &["PropertyNode(Smith property)", "ActivityNode(check listing)"],
                ),
            ],
        }
    }
}

impl ActivityPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptConfig {
    pub prompt_version: String,
    pub max_summary_chars: usize,
    pub preserve_unicode: bool,
    pub pretty_json: bool,
    #[serde(default)]
    pub activity: ActivityPolicy,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            prompt_version: DEFAULT_PROMPT_VERSION.to_string(),
            max_summary_chars: MAX_SUMMARY_CHARS,
            preserve_unicode: true,
            pretty_json: false,
            activity: ActivityPolicy::default(),
        }
    }
}

impl PromptConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unset variables take
    /// their defaults; unparsable ones fall back with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            prompt_version: lookup("GLEAN_PROMPT_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.prompt_version),
            max_summary_chars: lookup("GLEAN_MAX_SUMMARY_CHARS")
                .map(|raw| match raw.trim().parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        tracing::warn!(
                            value = %raw,
                            "Invalid GLEAN_MAX_SUMMARY_CHARS, using default"
                        );
                        MAX_SUMMARY_CHARS
                    }
                })
                .unwrap_or(defaults.max_summary_chars),
            preserve_unicode: parse_flag(lookup("GLEAN_PRESERVE_UNICODE"), "GLEAN_PRESERVE_UNICODE")
                .unwrap_or(defaults.preserve_unicode),
            pretty_json: parse_flag(lookup("GLEAN_PRETTY_JSON"), "GLEAN_PRETTY_JSON")
                .unwrap_or(defaults.pretty_json),
            activity: defaults.activity,
        }
    }

    /// Rejects configs that cannot drive a library, e.g. ones deserialized
    /// from a file rather than built through `from_env`.
    pub fn validate(&self) -> Result<()> {
        if self.prompt_version.trim().is_empty() {
            return Err(GleanError::Config("prompt_version must not be empty".to_string()));
        }
        if self.max_summary_chars == 0 {
            return Err(GleanError::Config("max_summary_chars must be greater than 0".to_string()));
        }
        if self.activity.enabled && self.activity.examples.iter().any(|e| e.entities.is_empty()) {
            return Err(GleanError::Config(
                "activity examples must list at least one entity".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(raw: Option<String>, key: &str) -> Option<bool> {
    let raw = raw?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid boolean flag, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = PromptConfig::from_lookup(|_| None);
        assert_eq!(config, PromptConfig::default());
        assert_eq!(config.max_summary_chars, MAX_SUMMARY_CHARS);
        assert_eq!(config.prompt_version, "v1");
        assert!(config.preserve_unicode);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = PromptConfig::from_lookup(lookup_from(&[
            ("GLEAN_PROMPT_VERSION", "v2"),
            ("GLEAN_MAX_SUMMARY_CHARS", "250"),
            ("GLEAN_PRESERVE_UNICODE", "off"),
            ("GLEAN_PRETTY_JSON", "1"),
        ]));
        assert_eq!(config.prompt_version, "v2");
        assert_eq!(config.max_summary_chars, 250);
        assert!(!config.preserve_unicode);
        assert!(config.pretty_json);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = PromptConfig::from_lookup(lookup_from(&[
            ("GLEAN_MAX_SUMMARY_CHARS", "0"),
            ("GLEAN_PRETTY_JSON", "maybe"),
            ("GLEAN_PROMPT_VERSION", "  "),
        ]));
        assert_eq!(config.max_summary_chars, MAX_SUMMARY_CHARS);
        assert!(!config.pretty_json);
        assert_eq!(config.prompt_version, DEFAULT_PROMPT_VERSION);
    }

    #[test]
    fn test_default_activity_policy() {
        let policy = ActivityPolicy::default();
        assert!(policy.enabled);
        assert!(policy.reextract_referenced);
        assert!(policy.triggers.iter().any(|t| t == "remind"));
        assert!(policy
            .examples
            .iter()
            .any(|e| e.message == "Call mom tonight"));
        assert!(!ActivityPolicy::disabled().enabled);
    }

    #[test]
    fn test_config_deserializes_without_activity() {
        let json = r#"{"prompt_version":"v1","max_summary_chars":300,"preserve_unicode":false,"pretty_json":true}"#;
        let config: PromptConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_summary_chars, 300);
        assert_eq!(config.activity, ActivityPolicy::default());
    }

    #[test]
    fn test_validate() {
        assert!(PromptConfig::default().validate().is_ok());
        assert!(PromptConfig::from_lookup(|_| None).validate().is_ok());

        let zero = PromptConfig {
            max_summary_chars: 0,
            ..PromptConfig::default()
        };
        assert!(matches!(zero.validate(), Err(GleanError::Config(_))));

        let mut bad_example = PromptConfig::default();
        bad_example.activity.examples.push(ActivityExample::new("Do it", &[]));
        assert!(matches!(bad_example.validate(), Err(GleanError::Config(_))));
    }
}
