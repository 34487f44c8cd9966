use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MindError, Result};

/// Environment variable holding the generation-service key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the ElevenLabs key.
pub const ENV_ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
/// Environment variable overriding the HTTP port.
pub const ENV_PORT: &str = "QMIND_PORT";

/// Synthesis provider identifiers accepted in `synthesis.order`.
pub const KNOWN_SYNTHESIS_PROVIDERS: [&str; 2] = ["elevenlabs", "openai"];

/// Top-level configuration for Quantum Mind.
///
/// Loaded from `~/.quantum-mind/config.toml` by default. Every section is
/// optional; secrets may also arrive through the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MindConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl MindConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MindConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// wipe a key coming from the file.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(ENV_OPENAI_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(key) = non_blank(ENV_ELEVENLABS_API_KEY) {
            self.synthesis.elevenlabs.api_key = Some(key);
        }
        if let Some(port) = non_blank(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid {}", ENV_PORT),
            }
        }
    }

    /// Check the settings the service cannot start without.
    pub fn validate(&self) -> Result<()> {
        self.generation_api_key()?;

        if self.access.keys.is_empty() {
            return Err(MindError::Config(
                "access.keys must contain at least one passphrase".to_string(),
            ));
        }
        if let Some(unknown) = self
            .synthesis
            .order
            .iter()
            .find(|p| !KNOWN_SYNTHESIS_PROVIDERS.contains(&p.as_str()))
        {
            return Err(MindError::Config(format!(
                "unknown synthesis provider '{}'. Must be one of: {}",
                unknown,
                KNOWN_SYNTHESIS_PROVIDERS.join(", ")
            )));
        }
        if self.server.session_idle_secs == 0 {
            return Err(MindError::Config(
                "server.session_idle_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(MindError::Config(format!(
                "generation.temperature must be between 0.0 and 2.0, got {}",
                self.generation.temperature
            )));
        }
        Ok(())
    }

    /// The generation-service key. Required.
    pub fn generation_api_key(&self) -> Result<&str> {
        self.generation
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                MindError::Config(format!(
                    "generation API key missing: set generation.api_key or {}",
                    ENV_OPENAI_API_KEY
                ))
            })
    }

    /// Key used for transcription; falls back to the generation key.
    pub fn transcription_api_key(&self) -> Result<&str> {
        match self.transcription.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => Ok(k),
            _ => self.generation_api_key(),
        }
    }

    /// Key used for OpenAI speech; falls back to the generation key.
    pub fn openai_speech_api_key(&self) -> Result<&str> {
        match self.synthesis.openai.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => Ok(k),
            _ => self.generation_api_key(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for uploaded recordings, in bytes.
    pub max_audio_bytes: usize,
    /// Sessions untouched for this long are dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_audio_bytes: 10 * 1024 * 1024,
            session_idle_secs: 30 * 60,
        }
    }
}

/// Access gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Passphrase → display name.
    pub keys: BTreeMap<String, String>,
    /// Frequent mis-transcription → passphrase it stands for.
    pub aliases: BTreeMap<String, String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            keys: BTreeMap::from([("demo".to_string(), "Usuario Demo".to_string())]),
            aliases: BTreeMap::from([("demos".to_string(), "demo".to_string())]),
        }
    }
}

/// Language-generation service settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

/// Speech-to-text settings (OpenAI-compatible transcription endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// BCP-47 language hint, e.g. "es-MX".
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            language: "es-MX".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Speech-synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Providers in the order they are tried.
    pub order: Vec<String>,
    pub timeout_secs: u64,
    pub elevenlabs: ElevenLabsConfig,
    pub openai: OpenAiSpeechConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            order: vec!["elevenlabs".to_string(), "openai".to_string()],
            timeout_secs: 30,
            elevenlabs: ElevenLabsConfig::default(),
            openai: OpenAiSpeechConfig::default(),
        }
    }
}

/// ElevenLabs text-to-speech. Disabled unless a key is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    /// Only this many leading characters are sent.
    pub max_chars: usize,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            max_chars: 400,
        }
    }
}

/// OpenAI-compatible speech endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub voice: String,
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "tts-1".to_string(),
            voice: "nova".to_string(),
        }
    }
}
