use glean_core::config::PromptConfig;
use glean_core::context::PromptContext;
use glean_core::contracts::{schema_with_summary_budget, EntitySummary};
use glean_core::error::Result;
use glean_core::helpers::to_prompt_json;
use glean_core::message::Message;
use glean_core::prompt::{PromptBuilder, PromptName};

use crate::inputs::Inputs;
use crate::snippets::{entity_block, summary_instructions};
use crate::template::render_template;
use crate::V1;

const SYSTEM: &str = "You are a helpful assistant that extracts entity summaries from the provided text.";

const USER: &str = r#"
Given the MESSAGES and the ENTITY, update the summary that combines relevant information about the entity
from the messages and relevant information from the existing summary.

{{summary_instructions}}

<MESSAGES>
{{previous_episodes}}
{{episode_content}}
</MESSAGES>

<ENTITY>
{{node}}
</ENTITY>
"#;

/// Refreshes one entity's running summary from new evidence.
pub struct ExtractSummary {
    pretty_json: bool,
    max_summary_chars: usize,
}

impl ExtractSummary {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
            max_summary_chars: config.max_summary_chars,
        }
    }
}

impl PromptBuilder for ExtractSummary {
    fn name(&self) -> PromptName {
        PromptName::ExtractSummary
    }

    fn version(&self) -> &str {
        V1
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["previous_episodes", "episode_content", "node"]
    }

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>> {
        let inputs = Inputs::new(self.name(), context);
        let previous = inputs.previous_episodes()?;
        let content = inputs.episode_content()?;
        let node = inputs.node()?;

        let previous = to_prompt_json(&previous, self.pretty_json)?;
        let content = to_prompt_json(content, self.pretty_json)?;
        let node = entity_block(node, self.pretty_json)?;
        let instructions = summary_instructions(self.max_summary_chars);

        let user = render_template(
            USER,
            &[
                ("summary_instructions", instructions.as_str()),
                ("previous_episodes", previous.as_str()),
                ("episode_content", content.as_str()),
                ("node", node.as_str()),
            ],
        )?;

        Ok(vec![Message::system(SYSTEM), Message::user(user)])
    }

    fn response_schema(&self) -> Result<serde_json::Value> {
        schema_with_summary_budget::<EntitySummary>(self.max_summary_chars)
    }
}
