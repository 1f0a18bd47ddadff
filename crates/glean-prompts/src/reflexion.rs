use glean_core::config::PromptConfig;
use glean_core::context::PromptContext;
use glean_core::contracts::{MissedEntities, OutputContract};
use glean_core::error::Result;
use glean_core::helpers::to_prompt_json;
use glean_core::message::Message;
use glean_core::prompt::{PromptBuilder, PromptName};

use crate::inputs::Inputs;
use crate::template::render_template;
use crate::V1;

const SYSTEM: &str =
    "You are an AI assistant that determines which entities have not been extracted from the given context";

const USER: &str = r#"
<PREVIOUS MESSAGES>
{{previous_episodes}}
</PREVIOUS MESSAGES>
<CURRENT MESSAGE>
{{episode_content}}
</CURRENT MESSAGE>

<EXTRACTED ENTITIES>
{{extracted_entities}}
</EXTRACTED ENTITIES>

Given the above previous messages, current message, and list of extracted entities; determine if any entities haven't been
extracted.

Guidelines:
1. Only report entities that appear in the CURRENT MESSAGE. The PREVIOUS MESSAGES are context only.
2. Do not report any entity that is already listed in EXTRACTED ENTITIES, including under a different capitalization.
3. Apply the same exclusions as extraction: no relationships, no dates or times, no attributes such as phone numbers or amounts.
4. If every entity has already been extracted, return an empty list.
"#;

/// Completeness check over a previous extraction pass.
pub struct Reflexion {
    pretty_json: bool,
}

impl Reflexion {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
        }
    }
}

impl PromptBuilder for Reflexion {
    fn name(&self) -> PromptName {
        PromptName::Reflexion
    }

    fn version(&self) -> &str {
        V1
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["previous_episodes", "episode_content", "extracted_entities"]
    }

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>> {
        let inputs = Inputs::new(self.name(), context);
        let previous = inputs.previous_episodes()?;
        let content = inputs.episode_content()?;
        let extracted = inputs.extracted_entities()?;

        let names: Vec<&str> = extracted.iter().map(|e| e.name.as_str()).collect();
        let previous = to_prompt_json(&previous, self.pretty_json)?;
        let names = to_prompt_json(&names, self.pretty_json)?;

        let user = render_template(
            USER,
            &[
                ("previous_episodes", previous.as_str()),
                ("episode_content", content),
                ("extracted_entities", names.as_str()),
            ],
        )?;

        Ok(vec![Message::system(SYSTEM), Message::user(user)])
    }

    fn response_schema(&self) -> Result<serde_json::Value> {
        MissedEntities::response_schema()
    }
}
