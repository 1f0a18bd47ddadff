use serde::Serialize;

use glean_core::config::PromptConfig;
use glean_core::context::PromptContext;
use glean_core::contracts::{EntityClassification, OutputContract};
use glean_core::error::Result;
use glean_core::helpers::to_prompt_json;
use glean_core::message::Message;
use glean_core::prompt::{PromptBuilder, PromptName};

use crate::inputs::Inputs;
use crate::template::render_template;
use crate::V1;

const SYSTEM: &str =
    "You are an AI assistant that classifies entity nodes given the context from which they were extracted";

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

<ENTITY TYPES>
{{entity_types}}
</ENTITY TYPES>

Given the above conversation, extracted entities, and provided entity types and their descriptions, classify the extracted entities.

Guidelines:
1. Each entity must have exactly one type.
2. Only use the provided ENTITY TYPES as types, do not use additional types to classify entities.
3. If none of the provided entity types accurately classify an extracted node, the type should be set to None.
4. Return exactly one classification per extracted entity, copying its uuid and name unchanged. Do not add, drop, merge, or rename entities.{{empty_catalog}}
"#;

const EMPTY_CATALOG: &str =
    "\n5. No entity types are provided, so set the type of every entity to None.";

#[derive(Serialize)]
struct TypeView<'a> {
    entity_type: &'a str,
    description: &'a str,
}

pub struct ClassifyNodes {
    pretty_json: bool,
}

impl ClassifyNodes {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            pretty_json: config.pretty_json,
        }
    }
}

impl PromptBuilder for ClassifyNodes {
    fn name(&self) -> PromptName {
        PromptName::ClassifyNodes
    }

    fn version(&self) -> &str {
        V1
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[
            "previous_episodes",
            "episode_content",
            "extracted_entities",
            "entity_types",
        ]
    }

    fn build(&self, context: &PromptContext) -> Result<Vec<Message>> {
        let inputs = Inputs::new(self.name(), context);
        let previous = inputs.previous_episodes()?;
        let content = inputs.episode_content()?;
        let extracted = inputs.extracted_entities()?;
        let catalog = inputs.entity_types()?;

        let types: Vec<TypeView<'_>> = catalog
            .types()
            .iter()
            .map(|t| TypeView {
                entity_type: &t.entity_type_name,
                description: &t.entity_type_description,
            })
            .collect();

        let previous = to_prompt_json(&previous, self.pretty_json)?;
        let extracted = to_prompt_json(extracted, self.pretty_json)?;
        let types = to_prompt_json(&types, self.pretty_json)?;
        let empty_catalog = if catalog.is_empty() { EMPTY_CATALOG } else { "" };

        let user = render_template(
            USER,
            &[
                ("previous_episodes", previous.as_str()),
                ("episode_content", content),
                ("extracted_entities", extracted.as_str()),
                ("entity_types", types.as_str()),
                ("empty_catalog", empty_catalog),
            ],
        )?;

        Ok(vec![Message::system(SYSTEM), Message::user(user)])
    }

    fn response_schema(&self) -> Result<serde_json::Value> {
        EntityClassification::response_schema()
    }
}
