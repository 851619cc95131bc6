//! OpenAI chat-completions provider.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{json, Value};

use super::provider::{AiProvider, ProviderError};

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    http_client: HttpClient,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            http_client: HttpClient::new(),
        }
    }

    /// Override the API base URL (for tests and proxies)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}


#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Authentication(format!(
                    "HTTP {}",
                    response.status()
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimit),
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(ProviderError::Provider(format!("HTTP {}: {}", status, text)));
            }
            _ => {}
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing choices[0].message.content".to_string())
            })
    }
}
