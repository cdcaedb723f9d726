use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part};
use crate::ai::{clean_caption, encode_base64, CaptionService, REQUEST_TIMEOUT};
use crate::{prompts, Error, Result};
use async_trait::async_trait;

pub struct GeminiCaptionClient {
    http: GeminiHttpClient,
}

impl GeminiCaptionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, REQUEST_TIMEOUT, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl CaptionService for GeminiCaptionClient {
    async fn generate_caption(&self, image_png: &[u8]) -> Result<String> {
        tracing::debug!(
            "Requesting Gemini caption ({} bytes, model {})",
            image_png.len(),
            self.http.model()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: prompts::caption_prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: encode_base64(image_png),
                        },
                    },
                ],
            }],
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        response
            .first_text()
            .and_then(clean_caption)
            .ok_or_else(|| Error::ProviderRequestFailed("No caption from Gemini".to_string()))
    }
}
