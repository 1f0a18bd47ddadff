use serde::Serialize;

use crate::error::Result;

/// Render a value as the JSON block embedded in prompts.
///
/// Output is deterministic for a given value: struct fields keep declaration
/// order and attribute maps are `BTreeMap`s. Non-ASCII text is written as-is.
pub fn to_prompt_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}
