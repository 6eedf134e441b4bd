//! Transcription collaborator: turns recorded audio into candidate text

use crate::groq::GroqClient;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use interview_common::config::DialogueConfig;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::{debug, instrument};

#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Whisper transcription through Groq's audio endpoint
pub struct GroqTranscriber {
    client: Arc<GroqClient>,
    model: String,
}

impl GroqTranscriber {
    pub fn new(client: Arc<GroqClient>, config: &DialogueConfig) -> Self {
        Self {
            client,
            model: config.transcription_model.clone(),
        }
    }

    fn form(&self, audio: &[u8]) -> Result<Form> {
        let file = Part::bytes(audio.to_vec())
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .context("Failed to build audio part")?;

        Ok(Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", "en")
            .text("response_format", "text"))
    }
}

#[async_trait]
impl Transcriber for GroqTranscriber {
    fn name(&self) -> &'static str {
        "groq"
    }

    #[instrument(skip(self, audio), fields(model = %self.model, audio_bytes = audio.len()))]
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        if audio.is_empty() {
            bail!("No audio recorded");
        }

        let response = self
            .client
            .send(|| Ok(self.client.post("audio/transcriptions").multipart(self.form(audio)?)))
            .await?;

        let text = response
            .text()
            .await
            .context("Failed to read transcription")?
            .trim()
            .to_string();

        debug!(chars = text.len(), "Audio transcribed");
        Ok(text)
    }
}
