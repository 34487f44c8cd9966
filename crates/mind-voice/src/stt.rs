//! Speech-to-text: turn a recorded clip into text for the access gate and
//! the turn pipeline.

use std::time::Duration;

use async_trait::async_trait;
use mind_core::config::MindConfig;

use crate::error::{VoiceError, VoiceResult};

/// A clip recorded by the client, exactly as uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAudio {
    pub bytes: Vec<u8>,
    /// MIME type reported by the client, e.g. `audio/wav`.
    pub content_type: String,
}

impl RecordedAudio {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name the upload is sent under; providers sniff the extension.
    pub fn file_name(&self) -> String {
        let mime = self
            .content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        let ext = match mime.as_str() {
            "audio/webm" | "video/webm" => "webm",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/ogg" => "ogg",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
            "audio/flac" | "audio/x-flac" => "flac",
            _ => "wav",
        };
        format!("recording.{}", ext)
    }
}

/// Backend that converts a recording into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe one clip. `Ok(None)` means nothing intelligible was heard.
    async fn transcribe(&self, audio: &RecordedAudio) -> VoiceResult<Option<String>>;
}

/// OpenAI-compatible transcription endpoint (`/audio/transcriptions`).
#[derive(Debug, Clone)]
pub struct OpenAiTranscriber {
    base_url: String,
    api_key: String,
    model: String,
    /// ISO-639-1 code derived from the configured language tag.
    language: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        language_tag: &str,
        timeout: Duration,
    ) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoiceError::Config(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            language: primary_language(language_tag),
            client,
        })
    }

    /// Build from the `[transcription]` section.
    pub fn from_config(config: &MindConfig) -> VoiceResult<Self> {
        let api_key = config
            .transcription_api_key()
            .map_err(|e| VoiceError::Config(e.to_string()))?;
        let section = &config.transcription;
        Self::new(
            section.base_url.clone(),
            api_key,
            section.model.clone(),
            &section.language,
            Duration::from_secs(section.timeout_secs),
        )
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl SpeechToText for OpenAiTranscriber {
    async fn transcribe(&self, audio: &RecordedAudio) -> VoiceResult<Option<String>> {
        if audio.is_empty() {
            return Err(VoiceError::EmptyAudio);
        }
        let url = format!(
            "{}/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );
        let part = reqwest::multipart::Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name())
            .mime_str(&audio.content_type)
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Transcription(format!(
                "STT API error {}: {}",
                status, body
            )));
        }
        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let text = recognized_text(&json);
        tracing::debug!(
            chars = text.as_ref().map(|t| t.chars().count()).unwrap_or(0),
            "Recording transcribed"
        );
        Ok(text)
    }
}

/// Extract the recognized text, treating blank results as unrecognized.
fn recognized_text(json: &serde_json::Value) -> Option<String> {
    json.get("text")
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// "es-MX" → "es". Falls back to the whole tag when there is no subtag.
fn primary_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .trim()
        .to_ascii_lowercase()
}
