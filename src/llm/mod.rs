//! # LLM Integration
//!
//! The model client contract consumed by agent steps, plus the lenient
//! output parser that recovers structured actions from model text.
//!
//! ## Module Organization
//!
//! - [`parse`] - Three-tier recovery of an [`parse::AgentAction`] from raw model output

pub mod parse;

use async_trait::async_trait;

use crate::error::Result;

pub use parse::{parse_agent_action, AgentAction};

/// A completion-capable language model.
///
/// Implementations wrap a provider SDK; tests supply canned outputs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Scripted client returning queued responses in order.
///
/// Once the script is exhausted the final response repeats, so workflows
/// that loop on follow-up questions terminate deterministically in tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    pub struct ScriptedLlmClient {
        responses: Mutex<Vec<String>>,
        pub prompts_seen: Mutex<Vec<String>>,
    }

    impl ScriptedLlmClient {
        pub fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                prompts_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlmClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts_seen.lock().push(prompt.to_string());
            let mut responses = self.responses.lock();
            if responses.len() > 1 {
                Ok(responses.remove(0))
            } else {
                Ok(responses
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "{}".to_string()))
            }
        }
    }
}
