//! Groq vision models through Groq's OpenAI-compatible endpoint.

use super::openai::caption::{vision_request, CompletionLimits};
use super::openai::OpenAiHttpClient;
use super::{clean_caption, CaptionService, REQUEST_TIMEOUT};
use crate::{Error, Result};
use async_trait::async_trait;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

pub struct GroqCaptionClient {
    http: OpenAiHttpClient,
    model: String,
}

impl GroqCaptionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, REQUEST_TIMEOUT, client)
                .with_base_url(GROQ_BASE_URL.to_string())
                .with_service_name("Groq"),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl CaptionService for GroqCaptionClient {
    async fn generate_caption(&self, image_png: &[u8]) -> Result<String> {
        tracing::debug!(
            "Requesting Groq caption ({} bytes, model {})",
            image_png.len(),
            self.model
        );

        let request = vision_request(
            &self.model,
            image_png,
            CompletionLimits {
                max_tokens: Some(500),
                temperature: Some(0.7),
                ..CompletionLimits::default()
            },
        );

        let response = self.http.chat_completion(&request).await?;

        response
            .first_text()
            .and_then(clean_caption)
            .ok_or_else(|| Error::ProviderRequestFailed("No caption from Groq".to_string()))
    }
}
