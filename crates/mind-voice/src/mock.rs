//! In-memory speech providers for tests and offline development.
//!
//! Both mocks record every call so callers can assert how often, and in
//! what order, providers were reached.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{VoiceError, VoiceResult};
use crate::stt::{RecordedAudio, SpeechToText};
use crate::tts::SpeechSynthesizer;

/// Transcriber that returns scripted results in order.
///
/// Once the script is exhausted the last entry repeats.
#[derive(Debug, Default)]
pub struct MockTranscriber {
    script: Mutex<VecDeque<Option<String>>>,
    last: Mutex<Option<String>>,
    calls: Mutex<usize>,
}

impl MockTranscriber {
    /// Always hears `text`.
    pub fn hearing(text: impl Into<String>) -> Self {
        Self::scripted(vec![Some(text.into())])
    }

    /// Never recognizes anything.
    pub fn silent() -> Self {
        Self::scripted(vec![None])
    }

    pub fn scripted(script: Vec<Option<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl SpeechToText for MockTranscriber {
    async fn transcribe(&self, audio: &RecordedAudio) -> VoiceResult<Option<String>> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        if audio.is_empty() {
            return Err(VoiceError::EmptyAudio);
        }
        let mut last = self
            .last
            .lock()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let next = self
            .script
            .lock()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?
            .pop_front();
        if let Some(result) = next {
            *last = result;
        }
        Ok(last.clone())
    }
}

/// Synthesizer that either returns fixed bytes or always fails.
#[derive(Debug)]
pub struct MockSynthesizer {
    name: String,
    output: Option<Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn succeeding(name: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            output: Some(audio),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Texts this provider was asked to render, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        self.output
            .clone()
            .ok_or_else(|| VoiceError::synthesis(&self.name, "mock provider unavailable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> RecordedAudio {
        RecordedAudio::new(vec![0u8; 16], "audio/wav")
    }

    #[tokio::test]
    async fn test_scripted_transcriber_repeats_last() {
        let stt = MockTranscriber::scripted(vec![None, Some("demo".to_string())]);
        assert_eq!(stt.transcribe(&clip()).await.unwrap(), None);
        assert_eq!(stt.transcribe(&clip()).await.unwrap().as_deref(), Some("demo"));
        assert_eq!(stt.transcribe(&clip()).await.unwrap().as_deref(), Some("demo"));
        assert_eq!(stt.calls(), 3);
    }

    #[tokio::test]
    async fn test_transcriber_rejects_empty_clip() {
        let stt = MockTranscriber::hearing("demo");
        let empty = RecordedAudio::new(Vec::new(), "audio/wav");
        assert!(matches!(
            stt.transcribe(&empty).await,
            Err(VoiceError::EmptyAudio)
        ));
    }

    #[tokio::test]
    async fn test_synthesizer_records_calls() {
        let ok = MockSynthesizer::succeeding("ok", vec![7]);
        assert_eq!(ok.synthesize("uno").await.unwrap(), vec![7]);
        assert_eq!(ok.calls(), vec!["uno"]);

        let bad = MockSynthesizer::failing("bad");
        assert!(bad.synthesize("dos").await.is_err());
        assert_eq!(bad.calls(), vec!["dos"]);
    }
}
