//! Dialogue collaborator: produces the interviewer's next reply

use crate::groq::GroqClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use interview_common::config::DialogueConfig;
use interview_common::types::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shown in place of a reply when the model cannot be reached
pub const DIALOGUE_FALLBACK: &str = "I apologize, but I'm having trouble connecting. Please try again.";

#[async_trait]
pub trait Dialogue: Send + Sync {
    fn name(&self) -> &'static str;

    /// Next interviewer reply for the given role-tagged conversation
    async fn reply(&self, messages: &[Message]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions against Groq
pub struct GroqDialogue {
    client: Arc<GroqClient>,
    model: String,
    temperature: f32,
}

impl GroqDialogue {
    pub fn new(client: Arc<GroqClient>, config: &DialogueConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Dialogue for GroqDialogue {
    fn name(&self) -> &'static str {
        "groq"
    }

    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn reply(&self, messages: &[Message]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
        };

        let response = self
            .client
            .send(|| Ok(self.client.post("chat/completions").json(&body)))
            .await?;

        let completion: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion")?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .context("Chat completion contained no text")?;

        debug!(reply_chars = content.len(), "Received interviewer reply");
        Ok(content)
    }
}
