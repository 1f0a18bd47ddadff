pub mod client;
pub mod config;
pub mod context;
pub mod contracts;
pub mod error;
pub mod helpers;
pub mod message;
pub mod prompt;

pub use client::{decode_response, ModelClient};
pub use config::{ActivityExample, ActivityPolicy, PromptConfig, MAX_SUMMARY_CHARS};
pub use context::{
    AttributeField, AttributeKind, CandidateEntity, EntityNode, EntityTypeCatalog, EntityTypeDef,
    Episode, EpisodeSource, PromptContext,
};
pub use contracts::{
    attribute_schema, schema_with_summary_budget, EntityClassification,
    EntityClassificationTriple, EntitySummary, ExtractedAttributes, ExtractedEntities,
    ExtractedEntity, MissedEntities, OutputContract,
};
pub use error::{GleanError, Result};
pub use helpers::to_prompt_json;
pub use message::{Message, Role};
pub use prompt::{PromptBuilder, PromptName};
