//! Text fragments shared by several stages.

use std::collections::BTreeMap;

use serde::Serialize;

use glean_core::context::{EntityNode, EntityTypeCatalog};
use glean_core::error::Result;
use glean_core::helpers::to_prompt_json;

pub const DO_NOT_ESCAPE_UNICODE: &str = "\nDo not escape unicode characters.\n";

pub const PRESERVE_DOMAIN_VOCABULARY: &str = "PRESERVE domain-specific vocabulary: Retain exact role titles, classification categories, technical terms, system names, issue types, and specialized phrases from the source text. These terms are essential for search retrieval. Do not generalize specific terminology.";

pub fn summary_instructions(max_summary_chars: usize) -> String {
    format!(
        r#"Guidelines:
1. Output only factual content. Never explain what you're doing, why, or mention limitations/constraints.
2. Only use the provided MESSAGES and ENTITY to write the summary.
3. Merge the existing summary with new information from the MESSAGES. Rewrite it as one narrative; do not append new sentences to the end of the old summary and do not repeat facts it already states.
4. If the MESSAGES contain no new information about the ENTITY, return the existing summary unchanged.
5. Keep information that is still true from the existing summary. Replace information the MESSAGES show to be outdated.
6. {PRESERVE_DOMAIN_VOCABULARY}
7. STATE FACTS DIRECTLY IN UNDER {max_summary_chars} CHARACTERS.

Example summaries:
BAD: "This is the only activity in the context. The user listened to this song. No other details were provided to include in this summary."
GOOD: "User played 'Blue Monday' by New Order (electronic genre) on 2024-12-03 at 14:22 UTC."
BAD: "Based on the messages provided, the user attended a meeting. This summary focuses on that event as it was the main topic discussed."
GOOD: "User attended Q3 planning meeting with sales team on March 15."
BAD: "The context shows John ordered pizza. Due to limited information, this summary is brief."
GOOD: "John ordered pepperoni pizza from Mario's at 7:30 PM, delivered to office.""#
    )
}

/// The target-entity view embedded in attribute and summary prompts.
#[derive(Serialize)]
struct NodeView<'a> {
    name: &'a str,
    summary: &'a str,
    entity_types: &'a [String],
    attributes: &'a BTreeMap<String, serde_json::Value>,
}

pub fn entity_block(node: &EntityNode, pretty: bool) -> Result<String> {
    to_prompt_json(
        &NodeView {
            name: &node.name,
            summary: &node.summary,
            entity_types: &node.labels,
            attributes: &node.attributes,
        },
        pretty,
    )
}

/// Catalog entry as listed to the extraction stages; declared attribute
/// fields belong to the attribute stage only.
#[derive(Serialize)]
struct CatalogEntryView<'a> {
    entity_type_id: i64,
    entity_type_name: &'a str,
    entity_type_description: &'a str,
}

pub fn catalog_block(catalog: &EntityTypeCatalog, pretty: bool) -> Result<String> {
    let entries: Vec<CatalogEntryView<'_>> = catalog
        .types()
        .iter()
        .map(|t| CatalogEntryView {
            entity_type_id: t.entity_type_id,
            entity_type_name: &t.entity_type_name,
            entity_type_description: &t.entity_type_description,
        })
        .collect();
    to_prompt_json(&entries, pretty)
}
