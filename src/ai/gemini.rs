//! Google Gemini generateContent provider.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{json, Value};

use super::provider::{AiProvider, ProviderError};

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    http_client: HttpClient,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            http_client: HttpClient::new(),
        }
    }

    /// Override the API base URL (for tests and proxies)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_maps_to_network_error() {
        let provider = GeminiProvider::new("key".to_string(), "model".to_string())
            .with_base_url("http://127.0.0.1:9".to_string());

        match provider.complete("system", "prompt").await {
            Err(ProviderError::Network(_)) => {}
            other => panic!("expected a network error, got {:?}", other),
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .http_client
            .post(&url)
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

        parsed["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::InvalidResponse(
                    "missing candidates[0].content.parts[0].text".to_string(),
                )
            })
    }
}
