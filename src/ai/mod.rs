//! Caption generation through hosted vision-language models
//!
//! Each provider client turns a PNG-encoded image into one short caption.
//! [`CaptionGenerator`] holds whichever providers were configured and
//! dispatches to them.

pub mod gemini;
pub mod groq;
pub mod mock;
pub mod openai;

pub use gemini::GeminiCaptionClient;
pub use groq::GroqCaptionClient;
pub use mock::MockCaptionClient;
pub use openai::OpenAiCaptionClient;

use crate::models::{Config, Provider};
use crate::render::encode_png;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use image::RgbImage;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn generate_caption(&self, image_png: &[u8]) -> Result<String>;
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub(crate) fn png_data_url(image_png: &[u8]) -> String {
    format!("data:image/png;base64,{}", encode_base64(image_png))
}

/// Trim a model answer; blank answers count as no caption.
pub(crate) fn clean_caption(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Routes caption requests to the configured provider clients.
#[derive(Default)]
pub struct CaptionGenerator {
    services: HashMap<Provider, Box<dyn CaptionService>>,
}

impl CaptionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for every provider that has an API key.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();
        let mut generator = Self::new();

        for provider in Provider::ALL {
            let Some(api_key) = config.api_key(provider) else {
                debug!("{} API key not set; provider unavailable", provider);
                continue;
            };
            let api_key = api_key.to_string();
            let model = config.model(provider).to_string();
            info!("{} provider configured (model: {})", provider, model);

            let service: Box<dyn CaptionService> = match provider {
                Provider::OpenAi => Box::new(OpenAiCaptionClient::new_with_client(
                    api_key,
                    model,
                    http_client.clone(),
                )),
                Provider::Gemini => Box::new(GeminiCaptionClient::new_with_client(
                    api_key,
                    model,
                    http_client.clone(),
                )),
                Provider::Groq => Box::new(GroqCaptionClient::new_with_client(
                    api_key,
                    model,
                    http_client.clone(),
                )),
            };
            generator.services.insert(provider, service);
        }

        generator
    }

    pub fn with_service(mut self, provider: Provider, service: Box<dyn CaptionService>) -> Self {
        self.services.insert(provider, service);
        self
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.services.contains_key(&provider)
    }

    /// Caption `image` with `provider`.
    ///
    /// Fails with [`Error::ProviderNotConfigured`] when no key was supplied for
    /// that provider; provider failures are passed through unchanged.
    pub async fn generate(&self, image: &RgbImage, provider: Provider) -> Result<String> {
        let service = self
            .services
            .get(&provider)
            .ok_or(Error::ProviderNotConfigured(provider))?;

        let image_png = encode_png(image)?;
        info!(
            "Generating caption with {} ({}x{} image)",
            provider,
            image.width(),
            image.height()
        );

        service.generate_caption(&image_png).await.map_err(|e| {
            error!("{} caption generation failed: {}", provider, e);
            e
        })
    }
}
