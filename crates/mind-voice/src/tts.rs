//! Text-to-speech providers.
//!
//! Each provider renders reply text into MP3 bytes. Providers never retry;
//! fallback between them is the job of [`crate::chain::SynthesisChain`].

use std::time::Duration;

use async_trait::async_trait;
use mind_core::config::{ElevenLabsConfig, OpenAiSpeechConfig};

use crate::error::{VoiceError, VoiceResult};

/// Backend that turns text into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short identifier used in logs and in `synthesis.order`.
    fn name(&self) -> &str;

    /// Render `text` to audio bytes. Empty output counts as a failure.
    async fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>>;
}

fn build_client(provider: &str, timeout: Duration) -> VoiceResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VoiceError::synthesis(provider, e.to_string()))
}

/// Read an audio response, mapping non-success statuses and empty bodies to errors.
async fn audio_body(provider: &str, res: reqwest::Response) -> VoiceResult<Vec<u8>> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(VoiceError::synthesis(
            provider,
            format!("TTS API error {}: {}", status, body),
        ));
    }
    let bytes = res
        .bytes()
        .await
        .map_err(|e| VoiceError::synthesis(provider, e.to_string()))?;
    if bytes.is_empty() {
        return Err(VoiceError::synthesis(provider, "empty audio response"));
    }
    Ok(bytes.to_vec())
}

/// Keep at most `max_chars` leading characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// =============================================================================
// ElevenLabs
// =============================================================================

/// ElevenLabs text-to-speech. Sends only the leading `max_chars` characters.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    max_chars: usize,
    client: reqwest::Client,
}

impl ElevenLabsSynthesizer {
    pub const NAME: &'static str = "elevenlabs";

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
        max_chars: usize,
        timeout: Duration,
    ) -> VoiceResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
            max_chars,
            client: build_client(Self::NAME, timeout)?,
        })
    }

    /// Build from `[synthesis.elevenlabs]`. `Ok(None)` when no key is set.
    pub fn from_config(section: &ElevenLabsConfig, timeout: Duration) -> VoiceResult<Option<Self>> {
        let Some(api_key) = section.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        Self::new(
            section.base_url.clone(),
            api_key,
            section.voice_id.clone(),
            section.model_id.clone(),
            section.max_chars,
            timeout,
        )
        .map(Some)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>> {
        let text = truncate_chars(text.trim(), self.max_chars);
        if text.is_empty() {
            return Err(VoiceError::synthesis(Self::NAME, "nothing to synthesize"));
        }
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            self.voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });
        let res = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::synthesis(Self::NAME, e.to_string()))?;
        audio_body(Self::NAME, res).await
    }
}

// =============================================================================
// OpenAI-compatible speech
// =============================================================================

/// OpenAI-compatible speech endpoint (`/audio/speech`).
#[derive(Debug, Clone)]
pub struct OpenAiSynthesizer {
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    client: reqwest::Client,
}

impl OpenAiSynthesizer {
    pub const NAME: &'static str = "openai";

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        timeout: Duration,
    ) -> VoiceResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            voice: voice.into(),
            client: build_client(Self::NAME, timeout)?,
        })
    }

    pub fn from_config(
        section: &OpenAiSpeechConfig,
        api_key: &str,
        timeout: Duration,
    ) -> VoiceResult<Self> {
        Self::new(
            section.base_url.clone(),
            api_key,
            section.model.clone(),
            section.voice.clone(),
            timeout,
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceError::synthesis(Self::NAME, "nothing to synthesize"));
        }
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": "mp3",
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::synthesis(Self::NAME, e.to_string()))?;
        audio_body(Self::NAME, res).await
    }
}
