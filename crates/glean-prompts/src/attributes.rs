use glean_core::config::PromptConfig;
use glean_core::context::PromptContext;
use glean_core::contracts::attribute_schema;
use glean_core::error::Result;
use glean_core::helpers::to_prompt_json;
use glean_core::message::Message;
use glean_core::prompt::{PromptBuilder, PromptName};

use crate::inputs::Inputs;
use crate::snippets::{entity_block, PRESERVE_DOMAIN_VOCABULARY};
use crate::template::render_template;
use crate::V1;

const SYSTEM: &str = "You are a helpful assistant that extracts entity properties from the provided text.";

const USER: &str = r#"
<MESSAGES>
{{previous_episodes}}
{{episode_content}}
</MESSAGES>

<ATTRIBUTES>
{{attribute_fields}}
</ATTRIBUTES>

Given the above MESSAGES and the specific ENTITY below, extract attributes ONLY for that ENTITY.
- Do NOT extract or infer attributes from other entities or speakers.
- If there is no clear attribute information about the ENTITY in the MESSAGES, return None or empty values for all attributes.
- Only set attribute values that are clearly and explicitly related to the ENTITY below.

Guidelines:
1. Do not hallucinate entity property values if they cannot be found in the current context.
2. Only use the provided MESSAGES and ENTITY to set attribute values.
3. The summary attribute represents a summary of the ENTITY, and should be updated with new information about the ENTITY from the MESSAGES. Only summarize information specific to this one ENTITY, not all entities detected in the MESSAGES. Summaries must be no longer than {{max_summary_chars}} characters.
4. {{preserve_vocabulary}}
5. Return only `summary` and the attributes listed in ATTRIBUTES, using each attribute's name and type exactly. Do not invent other attributes.{{no_attributes}}

Example:
If the ENTITY is "John's dog" and the MESSAGES only mention "John went to the park," then all attributes for an Entity "John's dog" should be None or empty.

ENTITY TO EXTRACT attributes for:

<ENTITY>
{{node}}
</ENTITY>
"#;

const NO_ATTRIBUTES: &str = " No attributes are declared for this ENTITY, so return only `summary`.";

/// Attribute extraction for exactly one target entity per call.
pub struct ExtractAttributes {
    pretty_json: bool,
    max_summary_chars: usize,
}

impl ExtractAttributes {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
            max_summary_chars: config.max_summary_chars,
        }
    }
}

impl PromptBuilder for ExtractAttributes {
    fn name(&self) -> PromptName {
        PromptName::ExtractAttributes
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
        let fields = inputs.attribute_fields();

        let previous = to_prompt_json(&previous, self.pretty_json)?;
        let content = to_prompt_json(content, self.pretty_json)?;
        let node = entity_block(node, self.pretty_json)?;
        let budget = self.max_summary_chars.to_string();
        let no_attributes = if fields.is_empty() { NO_ATTRIBUTES } else { "" };
        let fields = to_prompt_json(&fields, self.pretty_json)?;

        let user = render_template(
            USER,
            &[
                ("previous_episodes", previous.as_str()),
                ("episode_content", content.as_str()),
                ("max_summary_chars", budget.as_str()),
                ("preserve_vocabulary", PRESERVE_DOMAIN_VOCABULARY),
                ("node", node.as_str()),
                ("attribute_fields", fields.as_str()),
                ("no_attributes", no_attributes),
            ],
        )?;

        Ok(vec![Message::system(SYSTEM), Message::user(user)])
    }

    /// Summary only; use `response_schema_for` to include declared fields.
    fn response_schema(&self) -> Result<serde_json::Value> {
        attribute_schema(self.max_summary_chars, &[])
    }

    fn response_schema_for(&self, context: &PromptContext) -> Result<serde_json::Value> {
        let fields = Inputs::new(self.name(), context).attribute_fields();
        attribute_schema(self.max_summary_chars, &fields)
    }
}
