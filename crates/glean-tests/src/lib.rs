//! Shared fixtures for the integration tests: a scripted model client and
//! the catalog/context builders the scenarios reuse.

use std::collections::VecDeque;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use glean_core::client::ModelClient;
use glean_core::context::{EntityTypeCatalog, EntityTypeDef, Episode, EpisodeSource};
use glean_core::error::{GleanError, Result};
use glean_core::message::Message;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Answers calls in order from a fixed script and records what it was sent.
pub struct ScriptedClient {
    answers: Mutex<VecDeque<serde_json::Value>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    pub fn new(answers: Vec<serde_json::Value>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn generate_response(
        &self,
        messages: &[Message],
        _response_schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(|| GleanError::Decode("script exhausted".to_string()))
    }
}

pub fn realtor_catalog() -> EntityTypeCatalog {
    EntityTypeCatalog::new(vec![
        EntityTypeDef::new(1, "Person", "A human being mentioned by name or role"),
        EntityTypeDef::new(2, "Activity", "An actionable item, task, or to-do"),
        EntityTypeDef::new(3, "Property", "A real estate property or listing"),
    ])
    .with_default_type()
}

/// Message episodes spaced one minute apart, oldest first.
pub fn history(lines: &[&str]) -> Vec<Episode> {
    let start = Utc::now() - Duration::minutes(lines.len() as i64);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            Episode::new(
                format!("message-{i}"),
                line.to_string(),
                EpisodeSource::Message,
                start + Duration::minutes(i as i64),
            )
        })
        .collect()
}
