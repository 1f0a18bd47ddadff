//! Modality adapters: initial entity extraction from a conversational
//! message, a JSON document, or plain text.

use glean_core::config::{ActivityPolicy, PromptConfig};
use glean_core::context::PromptContext;
use glean_core::contracts::{ExtractedEntities, OutputContract};
use glean_core::error::Result;
use glean_core::helpers::to_prompt_json;
use glean_core::message::Message;
use glean_core::prompt::{PromptBuilder, PromptName};

use crate::inputs::Inputs;
use crate::snippets::catalog_block;
use crate::template::render_template;
use crate::V1;

const MESSAGE_SYSTEM: &str = "You are an AI assistant that extracts entity nodes from conversational messages.
Your primary task is to extract and classify the speaker and other significant entities mentioned in the conversation. They are a professional who is using an app to help them remember the details about the people, locations, properties, transactions, tasks, and events that makes them great at their job.";

const MESSAGE_SYSTEM_ACTIVITY: &str = "

Pay special attention to extracting tasks and to-dos when users mention things they need to do, complete, or remember. These should be classified as Activity entities with appropriate temporal information captured as attributes.";

const MESSAGE_USER: &str = r#"
<ENTITY TYPES>
{{entity_types}}
</ENTITY TYPES>

<PREVIOUS MESSAGES>
{{previous_episodes}}
</PREVIOUS MESSAGES>

<CURRENT MESSAGE>
{{episode_content}}
</CURRENT MESSAGE>

Instructions:

You are given a conversation context and a CURRENT MESSAGE. Your task is to extract **entity nodes** mentioned **explicitly or implicitly** in the CURRENT MESSAGE.
Pronoun references such as he/she/they or this/that/those should be disambiguated to the names of the reference entities. Self references such as "I" or "me" or "myself" should be disambiguated to the speaker. Only extract distinct entities from the CURRENT MESSAGE. Don't extract pronouns like you, me, he/she/they, we/us as entities.

1. **Speaker Extraction**: Always extract the speaker (the part before the colon `:` in each dialogue line) as the first entity node.{{speaker_hint}}
   - If the speaker is mentioned again in the message, treat both mentions as a **single entity**.

2. **Entity Identification**:
   - Extract all significant entities, concepts, or actors that are **explicitly or implicitly** mentioned in the CURRENT MESSAGE. Use the PREVIOUS MESSAGES to determine if a reference in the current message (example "she has red hair" the reference being 'she', or "they want a blue house" referencing individuals previously mentioned) is a reference to an entity previously mentioned.
   - To disambiguate those references, treat the last PREVIOUS MESSAGES as the most recent and prefer the most recently mentioned matching entity (example: if the first message is "my sister katie", the second message is "my sister julia" and the current message is "she has red hair", the reference is to julia).
   - **Exclude** entities mentioned only in the PREVIOUS MESSAGES (they are for context only) unless you are certain they are being mentioned in the CURRENT MESSAGE.

3. **Entity Classification**:
   - Use the descriptions in ENTITY TYPES to classify each extracted entity.
   - Assign the appropriate `entity_type_id` for each one.

4. **Exclusions**:
   - Do NOT extract entities representing relationships between other entities.
   - Do NOT extract dates, times, or other temporal information; these will be handled separately.
   - Do NOT extract things that are attributes of entities, such as phone number or email addresses or dollar amounts.{{activity_exception}}

5. **Formatting**:
   - Be **explicit and unambiguous** in naming entities (e.g., use full names when available).

{{custom_prompt}}
{{activity_section}}"#;

const JSON_SYSTEM: &str = "You are an AI assistant that extracts entity nodes from JSON.
Your primary task is to extract and classify relevant entities from JSON files.";

const JSON_USER: &str = r#"
<ENTITY TYPES>
{{entity_types}}
</ENTITY TYPES>

<SOURCE DESCRIPTION>
{{source_description}}
</SOURCE DESCRIPTION>

<JSON>
{{episode_content}}
</JSON>

{{custom_prompt}}

Given the above source description and JSON, extract relevant entities from the provided JSON.
For each entity extracted, also determine its entity type based on the provided ENTITY TYPES and their descriptions.
Indicate the classified entity type by providing its entity_type_id.

Guidelines:
1. Extract all entities that the JSON represents. This will often be something like a "name" or "user" field.
2. Extract all entities mentioned in all other properties throughout the JSON structure, including nested objects and arrays, not only the top level.
3. Do NOT extract any properties that contain dates.
"#;

const TEXT_SYSTEM: &str = "You are an AI assistant that extracts entity nodes from text.
Your primary task is to extract and classify the speaker and other significant entities mentioned in the provided text.";

const TEXT_USER: &str = r#"
<ENTITY TYPES>
{{entity_types}}
</ENTITY TYPES>

<TEXT>
{{episode_content}}
</TEXT>

Given the above text, extract entities from the TEXT that are explicitly or implicitly mentioned.
For each entity extracted, also determine its entity type based on the provided ENTITY TYPES and their descriptions.
Indicate the classified entity type by providing its entity_type_id.

{{custom_prompt}}

Guidelines:
1. Extract significant entities, concepts, or actors mentioned in the text.
2. Avoid creating nodes for relationships or actions.
3. Avoid creating nodes for temporal information like dates, times or years (these will be added to edges later).
4. Be as explicit as possible in your node names, using full names and avoiding abbreviations.
"#;

/// Speaker of a conversational turn: the text before the first colon on the
/// first non-empty line, unless that colon sits inside a clock time or a URL.
pub fn detect_speaker(content: &str) -> Option<&str> {
    let line = content.lines().find(|l| !l.trim().is_empty())?;
    let (speaker, rest) = line.split_once(':')?;
    // "10:30" and "https://" are not turn prefixes
    let clock = speaker.ends_with(|c: char| c.is_ascii_digit())
        && rest.starts_with(|c: char| c.is_ascii_digit());
    if clock || rest.starts_with("//") {
        return None;
    }
    let speaker = speaker.trim();
    if speaker.is_empty() || speaker.chars().count() > 80 {
        return None;
    }
    Some(speaker)
}

fn activity_section(policy: &ActivityPolicy, speaker: Option<&str>) -> String {
    if !policy.enabled {
        return String::new();
    }

    let speaker_node = match speaker {
        Some(name) => format!("PersonNode({name})"),
        None => "PersonNode(speaker)".to_string(),
    };

    let mut section = String::from("\n**UNIFIED ACTIVITY EXTRACTION**:\n");
    section.push_str(
        "- **ACTIVITY TRIGGERS**: Extract Activity entities when the message contains any actionable items or to-dos:\n",
    );
    if !policy.triggers.is_empty() {
        section.push_str(&format!("  * Action words: {}\n", policy.triggers.join(", ")));
    }
    if !policy.reminder_phrases.is_empty() {
        let phrases: Vec<String> = policy
            .reminder_phrases
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect();
        section.push_str(&format!(
            "  * Any imperative or reminder statements: {}\n",
            phrases.join(", ")
        ));
    }

    section.push_str("- **EXTRACTION STRATEGY**:\n");
    if policy.reextract_referenced {
        section.push_str(
            "  * Activity + mentioned entities = Extract Activity entity + re-extract ALL mentioned people/properties (even if they exist in previous episodes)\n",
        );
        section.push_str(
            "  * **CRITICAL**: When extracting Activity entities, always re-extract mentioned people/properties as entities in the same episode to enable automatic edge creation\n",
        );
    } else {
        section.push_str(
            "  * Extract the Activity entity itself; other entities follow the rules above\n",
        );
    }
    section.push_str(&format!(
        "  * The speaker is always the first entity, so {speaker_node} comes first in every extraction\n"
    ));

    if !policy.examples.is_empty() {
        section.push_str("- **EXAMPLES**:\n");
        for example in &policy.examples {
            let mut nodes = vec![speaker_node.clone()];
            nodes.extend(
                example
                    .entities
                    .iter()
                    .filter(|e| policy.reextract_referenced || e.starts_with("ActivityNode("))
                    .cloned(),
            );
            section.push_str(&format!(
                "  * \"{}\" → Extract: {}",
                example.message,
                nodes.join(", ")
            ));
            if let Some(note) = &example.note {
                section.push_str(&format!(" - NOTE: {note}"));
            }
            section.push('\n');
        }
    }
    section
}

pub struct ExtractMessage {
    pretty_json: bool,
    activity: ActivityPolicy,
}

impl ExtractMessage {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
            activity: config.activity.clone(),
        }
    }
}

impl PromptBuilder for ExtractMessage {
    fn name(&self) -> PromptName {
        PromptName::ExtractMessage
    }

    fn version(&self) -> &str {
        V1
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["entity_types", "previous_episodes", "episode_content"]
    }

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>> {
        let inputs = Inputs::new(self.name(), context);
        let entity_types = inputs.entity_types()?;
        let previous = inputs.previous_episodes()?;
        let content = inputs.episode_content()?;
        let custom_prompt = inputs.custom_prompt();

        let speaker = detect_speaker(content);
        let speaker_hint = match speaker {
            Some(name) => format!(" The speaker of the CURRENT MESSAGE is \"{name}\"."),
            None => String::new(),
        };
        let activity_exception = if self.activity.enabled {
            "\n   - **EXCEPTION**: DO extract activity or action entities that represent any actionable items, to-dos, or activities (e.g., \"follow up with client\", \"take out trash\", \"call mom\", \"schedule inspection\", \"go to store\")."
        } else {
            ""
        };

        let system = if self.activity.enabled {
            format!("{MESSAGE_SYSTEM}{MESSAGE_SYSTEM_ACTIVITY}")
        } else {
            MESSAGE_SYSTEM.to_string()
        };

        let entity_types = catalog_block(entity_types, self.pretty_json)?;
        let previous = to_prompt_json(&previous, self.pretty_json)?;
        let activity = activity_section(&self.activity, speaker);
        let user = render_template(
            MESSAGE_USER,
            &[
                ("entity_types", entity_types.as_str()),
                ("previous_episodes", previous.as_str()),
                ("episode_content", content),
                ("speaker_hint", speaker_hint.as_str()),
                ("activity_exception", activity_exception),
                ("custom_prompt", custom_prompt),
                ("activity_section", activity.as_str()),
            ],
        )?;

        Ok(vec![Message::system(system), Message::user(user)])
    }

    fn response_schema(&self) -> Result<serde_json::Value> {
        ExtractedEntities::response_schema()
    }
}

pub struct ExtractJson {
    pretty_json: bool,
}

impl ExtractJson {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
        }
    }
}

impl PromptBuilder for ExtractJson {
    fn name(&self) -> PromptName {
        PromptName::ExtractJson
    }

    fn version(&self) -> &str {
        V1
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["entity_types", "source_description", "episode_content"]
    }

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>> {
        let inputs = Inputs::new(self.name(), context);
        let entity_types = inputs.entity_types()?;
        let source_description = inputs.source_description()?;
        let content = inputs.episode_content()?;

        let entity_types = catalog_block(entity_types, self.pretty_json)?;
        let user = render_template(
            JSON_USER,
            &[
                ("entity_types", entity_types.as_str()),
                ("source_description", source_description),
                ("episode_content", content),
                ("custom_prompt", inputs.custom_prompt()),
            ],
        )?;

        Ok(vec![Message::system(JSON_SYSTEM), Message::user(user)])
    }

    fn response_schema(&self) -> Result<serde_json::Value> {
        ExtractedEntities::response_schema()
    }
}

pub struct ExtractText {
    pretty_json: bool,
}

impl ExtractText {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
        }
    }
}

impl PromptBuilder for ExtractText {
    fn name(&self) -> PromptName {
        PromptName::ExtractText
    }

    fn version(&self) -> &str {
        V1
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["entity_types", "episode_content"]
    }

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>> {
        let inputs = Inputs::new(self.name(), context);
        let entity_types = inputs.entity_types()?;
        let content = inputs.episode_content()?;

        let entity_types = catalog_block(entity_types, self.pretty_json)?;
        let user = render_template(
            TEXT_USER,
            &[
                ("entity_types", entity_types.as_str()),
                ("episode_content", content),
                ("custom_prompt", inputs.custom_prompt()),
            ],
        )?;

        Ok(vec![Message::system(TEXT_SYSTEM), Message::user(user)])
    }

    fn response_schema(&self) -> Result<serde_json::Value> {
        ExtractedEntities::response_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glean_core::context::{EntityTypeCatalog, EntityTypeDef, Episode};
    use glean_core::error::GleanError;
    use glean_core::message::Role;

    fn catalog() -> EntityTypeCatalog {
        EntityTypeCatalog::new(vec![
            EntityTypeDef::new(1, "Person", "A human being"),
            EntityTypeDef::new(2, "Activity", "An actionable item or to-do"),
            EntityTypeDef::new(3, "Property", "A real estate property"),
        ])
        .with_default_type()
    }

    fn message_context(content: &str) -> PromptContext {
        PromptContext::new()
            .with_entity_types(catalog())
            .with_previous_episodes(vec![])
            .with_episode_content(content)
    }

    fn extraction_lines(user: &str) -> Vec<&str> {
        user.lines().filter(|l| l.contains("→ Extract:")).collect()
    }

    #[test]
    fn test_detect_speaker() {
        assert_eq!(detect_speaker("Chris: Remind me to call mom"), Some("Chris"));
        assert_eq!(detect_speaker("\n  Sarah Chen : hi\nBob: yo"), Some("Sarah Chen"));
        assert_eq!(detect_speaker("no colon here"), None);
        assert_eq!(detect_speaker(": empty speaker"), None);
        assert_eq!(detect_speaker(""), None);
    }

    #[test]
    fn test_detect_speaker_ignores_times_and_urls() {
        assert_eq!(detect_speaker("Meeting moved to 10:30"), None);
        assert_eq!(detect_speaker("see https://example.com: now"), None);
        assert_eq!(detect_speaker("Chris: at 10:30"), Some("Chris"));
        assert_eq!(detect_speaker("Agent 7: on it"), Some("Agent 7"));
    }

    #[test]
    fn test_message_prompt_shape() {
        let builder = ExtractMessage::new(&PromptConfig::default());
        let messages = builder
            .build(&message_context("Chris: Remind me to call mom tonight"))
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[0].content.contains("Activity entities"));

        let user = &messages[1].content;
        assert!(user.contains(
            "<CURRENT MESSAGE>\nChris: Remind me to call mom tonight\n</CURRENT MESSAGE>"
        ));
        assert!(user.contains("<PREVIOUS MESSAGES>\n[]\n</PREVIOUS MESSAGES>"));
        assert!(user.contains(r#""entity_type_name":"Activity""#));
        assert!(user.contains("The speaker of the CURRENT MESSAGE is \"Chris\"."));
        assert!(user.contains("**single entity**"));
        assert!(user.contains("Do NOT extract dates, times"));
    }

    #[test]
    fn test_speaker_is_first_in_every_example() {
        let builder = ExtractMessage::new(&PromptConfig::default());
        let messages = builder
            .build(&message_context("Chris: Remind me to take out trash"))
            .unwrap();
        let lines = extraction_lines(&messages[1].content);
        assert!(!lines.is_empty());
        for line in lines {
            let extracted = line.split("→ Extract: ").nth(1).unwrap();
            assert!(extracted.starts_with("PersonNode(Chris)"), "{line}");
        }
    }

    #[test]
    fn test_activity_examples_render_with_speaker() {
        let builder = ExtractMessage::new(&PromptConfig::default());
        let user = builder
            .build(&message_context("Chris: Remind me to call mom tonight"))
            .unwrap()
            .remove(1)
            .content;
        assert!(user.contains(
            "\"Call mom tonight\" → Extract: PersonNode(Chris), PersonNode(mom), ActivityNode(call mom)"
        ));
        assert!(user.contains(
            "\"Remind me to take out trash\" → Extract: PersonNode(Chris), ActivityNode(take out trash) - NOTE: Activity connects only to speaker"
        ));
        assert!(user.contains("re-extract ALL mentioned people/properties"));
    }

    #[test]
    fn test_activity_policy_disabled() {
        let config = PromptConfig {
            activity: ActivityPolicy::disabled(),
            ..PromptConfig::default()
        };
        let messages = ExtractMessage::new(&config)
            .build(&message_context("Chris: Remind me to call mom"))
            .unwrap();
        assert!(!messages[0].content.contains("Activity entities"));
        assert!(!messages[1].content.contains("UNIFIED ACTIVITY EXTRACTION"));
        assert!(!messages[1].content.contains("**EXCEPTION**"));
    }

    #[test]
    fn test_activity_policy_without_reextraction() {
        let mut config = PromptConfig::default();
        config.activity.reextract_referenced = false;
        let user = ExtractMessage::new(&config)
            .build(&message_context("Chris: Call mom tonight"))
            .unwrap()
            .remove(1)
            .content;
        assert!(!user.contains("re-extract ALL"));
        assert!(user.contains(
            "\"Call mom tonight\" → Extract: PersonNode(Chris), ActivityNode(call mom)"
        ));
    }

    #[test]
    fn test_no_speaker_detected() {
        let user = ExtractMessage::new(&PromptConfig::default())
            .build(&message_context("remind me to water the plants"))
            .unwrap()
            .remove(1)
            .content;
        assert!(!user.contains("The speaker of the CURRENT MESSAGE is"));
        assert!(user.contains("→ Extract: PersonNode(speaker)"));
    }

    #[test]
    fn test_previous_episodes_oldest_first() {
        let ctx = message_context("Chris: she has red hair").with_previous_episodes(vec![
            Episode::message("Chris: my sister katie"),
            Episode::message("Chris: my sister julia"),
        ]);
        let user = ExtractMessage::new(&PromptConfig::default())
            .build(&ctx)
            .unwrap()
            .remove(1)
            .content;
        assert!(user.contains(r#"["Chris: my sister katie","Chris: my sister julia"]"#));
        assert!(user.contains("most recently mentioned matching entity"));
    }

    #[test]
    fn test_message_missing_fields() {
        let builder = ExtractMessage::new(&PromptConfig::default());
        let no_history = PromptContext::new()
            .with_entity_types(catalog())
            .with_episode_content("Chris: hi");
        assert!(matches!(
            builder.build(&no_history),
            Err(GleanError::MissingInput {
                field: "previous_episodes",
                ..
            })
        ));

        let no_types = PromptContext::new()
            .with_previous_episodes(vec![])
            .with_episode_content("Chris: hi");
        assert!(matches!(
            builder.build(&no_types),
            Err(GleanError::MissingInput {
                field: "entity_types",
                ..
            })
        ));

        let empty = message_context("");
        assert!(matches!(
            builder.build(&empty),
            Err(GleanError::MissingInput {
                field: "episode_content",
                ..
            })
        ));
    }

    #[test]
    fn test_custom_prompt_is_embedded_verbatim() {
        let ctx = message_context("Chris: hi").with_custom_prompt("Also extract {{pets}}.");
        let user = ExtractMessage::new(&PromptConfig::default())
            .build(&ctx)
            .unwrap()
            .remove(1)
            .content;
        assert!(user.contains("Also extract {{pets}}."));
    }

    #[test]
    fn test_json_prompt() {
        let ctx = PromptContext::new()
            .with_entity_types(catalog())
            .with_source_description("CRM contact export")
            .with_episode_content(
                r#"{"name": "Sarah Chen", "employer": {"name": "First Bank"}, "created": "2024-01-01"}"#,
            );
        let messages = ExtractJson::new(&PromptConfig::default()).build(&ctx).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("from JSON"));
        let user = &messages[1].content;
        assert!(user.contains("<SOURCE DESCRIPTION>\nCRM contact export\n</SOURCE DESCRIPTION>"));
        assert!(user.contains(r#""employer": {"name": "First Bank"}"#));
        assert!(user.contains("nested objects and arrays"));
        assert!(user.contains("Do NOT extract any properties that contain dates"));
    }

    #[test]
    fn test_json_requires_source_description() {
        let ctx = PromptContext::new()
            .with_entity_types(catalog())
            .with_episode_content("{}");
        let err = ExtractJson::new(&PromptConfig::default()).build(&ctx).unwrap_err();
        assert!(matches!(
            err,
            GleanError::MissingInput {
                prompt: PromptName::ExtractJson,
                field: "source_description"
            }
        ));
    }

    #[test]
    fn test_text_prompt() {
        let ctx = PromptContext::new()
            .with_entity_types(catalog())
            .with_episode_content("The WHO published guidance in 2021.");
        let messages = ExtractText::new(&PromptConfig::default()).build(&ctx).unwrap();
        let user = &messages[1].content;
        assert!(user.contains("<TEXT>\nThe WHO published guidance in 2021.\n</TEXT>"));
        assert!(user.contains("Avoid creating nodes for relationships or actions"));
        assert!(user.contains("avoiding abbreviations"));
        assert!(!user.contains("{{"));
    }

    #[test]
    fn test_builds_are_deterministic() {
        let builder = ExtractMessage::new(&PromptConfig::default());
        let ctx = message_context("Chris: Remind me to call mom tonight");
        assert_eq!(builder.build(&ctx).unwrap(), builder.build(&ctx).unwrap());
    }

    #[test]
    fn test_extraction_schema() {
        let schema = ExtractText::new(&PromptConfig::default())
            .response_schema()
            .unwrap();
        assert!(schema.pointer("/properties/extracted_entities").is_some());
    }
}
