use std::sync::Arc;

use glean_core::config::PromptConfig;
use glean_core::error::Result;

mod attributes;
mod classify;
mod extract_nodes;
mod inputs;
mod library;
mod reflexion;
pub mod snippets;
mod summary;
pub mod template;

pub use attributes::ExtractAttributes;
pub use classify::ClassifyNodes;
pub use extract_nodes::{detect_speaker, ExtractJson, ExtractMessage, ExtractText};
pub use library::PromptLibrary;
pub use reflexion::Reflexion;
pub use summary::ExtractSummary;

pub const V1: &str = "v1";

/// The stock library: every stage at `v1`.
pub fn prompt_library(config: &PromptConfig) -> PromptLibrary {
    let mut library = PromptLibrary::new(config);
    library.register(Arc::new(ExtractMessage::new(config)));
    library.register(Arc::new(ExtractJson::new(config)));
    library.register(Arc::new(ExtractText::new(config)));
    library.register(Arc::new(Reflexion::new(config)));
    library.register(Arc::new(ClassifyNodes::new(config)));
    library.register(Arc::new(ExtractAttributes::new(config)));
    library.register(Arc::new(ExtractSummary::new(config)));
    library
}

/// Like [`prompt_library`], but rejects an unusable config first.
pub fn try_prompt_library(config: &PromptConfig) -> Result<PromptLibrary> {
    config.validate()?;
    Ok(prompt_library(config))
}
