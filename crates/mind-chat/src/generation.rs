//! Language-generation client.
//!
//! One prompt in, one reply out. Calls are stateless: no conversation
//! history is threaded to the service.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mind_core::config::MindConfig;
use serde::Deserialize;

use crate::error::ChatError;

/// Service that turns a prompt into reply text.
#[async_trait]
pub trait ChatGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Generation(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            temperature,
            client,
        })
    }

    /// Build from the `[generation]` section. Fails without an API key.
    pub fn from_config(config: &MindConfig) -> Result<Self, ChatError> {
        let api_key = config
            .generation_api_key()
            .map_err(|e| ChatError::Generation(e.to_string()))?;
        let section = &config.generation;
        Self::new(
            section.base_url.clone(),
            api_key,
            section.model.clone(),
            section.max_tokens,
            section.temperature,
            Duration::from_secs(section.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChatError::Generation(format!(
                "LLM API error {}: {}",
                status, body
            )));
        }
        let parsed: CompletionResponse = res
            .json()
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?;
        reply_text(parsed)
    }
}

fn reply_text(response: CompletionResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ChatError::Generation("empty completion".to_string()))
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Generator that replays scripted replies and records every prompt.
///
/// `None` entries in the script simulate a service failure. Once the script
/// runs out the last entry repeats.
#[derive(Debug, Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Option<String>>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::scripted(vec![Some(text.into())])
    }

    pub fn failing() -> Self {
        Self::scripted(vec![None])
    }

    pub fn scripted(script: Vec<Option<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let mut last = self
            .last
            .lock()
            .map_err(|e| ChatError::Generation(e.to_string()))?;
        let next = self
            .script
            .lock()
            .map_err(|e| ChatError::Generation(e.to_string()))?
            .pop_front();
        if let Some(entry) = next {
            *last = entry;
        }
        last.clone()
            .ok_or_else(|| ChatError::Generation("mock generation unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::Arc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn generator(base: String) -> OpenAiGenerator {
        OpenAiGenerator::new(base, "sk-test", "gpt-4.1-mini", 300, 0.7, Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_single_user_message() {
        let seen: Arc<Mutex<Option<(String, serde_json::Value)>>> = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&seen);
        let router = Router::new().route(
            "/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let captured = Arc::clone(&captured);
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    *captured.lock().unwrap() = Some((auth, body));
                    Json(serde_json::json!({
                        "choices": [{ "message": { "role": "assistant", "content": "Te entiendo." } }]
                    }))
                }
            }),
        );
        let base = serve(router).await;

        let reply = generator(base).generate("Actúa como psicólogo.").await.unwrap();
        assert_eq!(reply, "Te entiendo.");

        let (auth, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(auth, "Bearer sk-test");
        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["max_tokens"], 300);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Actúa como psicólogo.");
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;
        let err = generator(base).generate("hola").await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_generate_empty_choices() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(serde_json::json!({ "choices": [] })) }),
        );
        let base = serve(router).await;
        let err = generator(base).generate("hola").await.unwrap_err();
        assert!(err.to_string().contains("empty completion"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = MindConfig::default();
        assert!(OpenAiGenerator::from_config(&config).is_err());
        config.generation.api_key = Some("sk".to_string());
        let generator = OpenAiGenerator::from_config(&config).unwrap();
        assert_eq!(generator.model(), "gpt-4.1-mini");
    }

    #[tokio::test]
    async fn test_mock_generator_script() {
        let generator = MockGenerator::scripted(vec![Some("uno".to_string()), None]);
        assert_eq!(generator.generate("a").await.unwrap(), "uno");
        assert!(generator.generate("b").await.is_err());
        assert!(generator.generate("c").await.is_err());
        assert_eq!(generator.prompts(), vec!["a", "b", "c"]);
    }
}
