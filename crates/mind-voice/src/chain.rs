//! Ordered fallback across synthesis providers.

use std::sync::Arc;
use std::time::Duration;

use mind_core::config::MindConfig;

use crate::error::{VoiceError, VoiceResult};
use crate::tts::{ElevenLabsSynthesizer, OpenAiSynthesizer, SpeechSynthesizer};

/// Audio produced by one provider of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub provider: String,
    pub bytes: Vec<u8>,
}

/// Providers tried in order; the first success wins.
///
/// Each provider is attempted at most once per call. When all of them fail
/// the caller gets `None` and keeps the reply text-only.
#[derive(Clone, Default)]
pub struct SynthesisChain {
    providers: Vec<Arc<dyn SpeechSynthesizer>>,
}

impl SynthesisChain {
    pub fn new(providers: Vec<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { providers }
    }

    /// Build the chain from `synthesis.order`.
    ///
    /// Providers without credentials are skipped with a log line rather than
    /// failing startup.
    pub fn from_config(config: &MindConfig) -> VoiceResult<Self> {
        let section = &config.synthesis;
        let timeout = Duration::from_secs(section.timeout_secs);
        let mut providers: Vec<Arc<dyn SpeechSynthesizer>> = Vec::new();

        for name in &section.order {
            match name.as_str() {
                ElevenLabsSynthesizer::NAME => {
                    match ElevenLabsSynthesizer::from_config(&section.elevenlabs, timeout)? {
                        Some(p) => providers.push(Arc::new(p)),
                        None => tracing::info!("ElevenLabs key not configured; provider skipped"),
                    }
                }
                OpenAiSynthesizer::NAME => match config.openai_speech_api_key() {
                    Ok(key) => providers.push(Arc::new(OpenAiSynthesizer::from_config(
                        &section.openai,
                        key,
                        timeout,
                    )?)),
                    Err(e) => tracing::info!(error = %e, "OpenAI speech provider skipped"),
                },
                other => {
                    return Err(VoiceError::Config(format!(
                        "unknown synthesis provider '{}'",
                        other
                    )))
                }
            }
        }

        let chain = Self::new(providers);
        tracing::info!(providers = ?chain.provider_names(), "Synthesis chain ready");
        Ok(chain)
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try each provider in order and return the first audio produced.
    pub async fn synthesize(&self, text: &str) -> Option<SynthesizedAudio> {
        for provider in &self.providers {
            match provider.synthesize(text).await {
                Ok(bytes) if !bytes.is_empty() => {
                    tracing::debug!(
                        provider = provider.name(),
                        bytes = bytes.len(),
                        "Reply synthesized"
                    );
                    return Some(SynthesizedAudio {
                        provider: provider.name().to_string(),
                        bytes,
                    });
                }
                Ok(_) => {
                    tracing::warn!(provider = provider.name(), "Provider returned no audio");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Synthesis failed");
                }
            }
        }
        if !self.providers.is_empty() {
            tracing::warn!("All synthesis providers failed; reply stays text-only");
        }
        None
    }
}
