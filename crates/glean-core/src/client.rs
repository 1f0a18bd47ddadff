use async_trait::async_trait;

use crate::contracts::OutputContract;
use crate::error::{GleanError, Result};
use crate::message::Message;

/// The external model-invocation client. Implementations send the messages
/// with the given response schema and return the decoded JSON answer.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate_response(
        &self,
        messages: &[Message],
        response_schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Decode a model answer into a stage's output contract.
pub fn decode_response<T: OutputContract>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(error = %e, "Model answer does not match the output contract");
        GleanError::Decode(e.to_string())
    })
}
