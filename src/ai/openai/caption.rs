use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent, MessagePart};
use crate::ai::{clean_caption, png_data_url, CaptionService, REQUEST_TIMEOUT};
use crate::{prompts, Error, Result};
use async_trait::async_trait;

/// Token and sampling limits attached to a caption request.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CompletionLimits {
    pub max_completion_tokens: Option<u32>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Single user message carrying the caption prompt and the image as a data URL.
pub(crate) fn vision_request(
    model: &str,
    image_png: &[u8],
    limits: CompletionLimits,
) -> ChatCompletionRequest {
    let user_message = ChatMessage {
        role: "user".to_string(),
        content: Some(ChatMessageContent::Parts(vec![
            MessagePart::text(&prompts::caption_prompt()),
            MessagePart::image(png_data_url(image_png)),
        ])),
    };

    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![user_message],
        max_completion_tokens: limits.max_completion_tokens,
        max_tokens: limits.max_tokens,
        temperature: limits.temperature,
    }
}

pub struct OpenAiCaptionClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiCaptionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, REQUEST_TIMEOUT, client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl CaptionService for OpenAiCaptionClient {
    async fn generate_caption(&self, image_png: &[u8]) -> Result<String> {
        tracing::debug!(
            "Requesting OpenAI caption ({} bytes, model {})",
            image_png.len(),
            self.model
        );

        let request = vision_request(
            &self.model,
            image_png,
            CompletionLimits {
                max_completion_tokens: Some(20_000),
                ..CompletionLimits::default()
            },
        );

        let response = self.http.chat_completion(&request).await?;

        response
            .first_text()
            .and_then(clean_caption)
            .ok_or_else(|| Error::ProviderRequestFailed("No caption from OpenAI".to_string()))
    }
}
