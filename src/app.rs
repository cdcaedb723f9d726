//! Application orchestration: caption an image, composite the caption, save
//! the PNG and record the generation in history.

use crate::ai::CaptionGenerator;
use crate::history::{HistoryStore, JsonHistoryStore};
use crate::models::{image_display_name, Config, HistoryEntry, OverlayPosition, Provider};
use crate::render::{encode_png, load_image, overlay, with_background, BackgroundStyle, FontHandle};
use crate::{Error, Result};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// How the caption is placed on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionStyle {
    Overlay { position: OverlayPosition },
    Background(BackgroundStyle),
}

impl Default for CaptionStyle {
    fn default() -> Self {
        CaptionStyle::Overlay {
            position: OverlayPosition::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub style: CaptionStyle,
    pub font: FontHandle,
}

/// Result of a caption run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionOutcome {
    pub caption: String,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Composite `caption` onto a copy of `image` according to `options`.
pub fn compose(image: &RgbImage, caption: &str, options: &RenderOptions) -> RgbImage {
    match &options.style {
        CaptionStyle::Overlay { position } => overlay(image, caption, *position, &options.font),
        CaptionStyle::Background(style) => with_background(image, caption, &options.font, style),
    }
}

/// `captioned_<name>.png` next to the source image.
pub fn default_output_path(image_path: &Path) -> PathBuf {
    let mut output = image_path.with_file_name(format!(
        "captioned_{}",
        image_display_name(image_path)
    ));
    output.set_extension("png");
    output
}

pub struct App {
    captions: CaptionGenerator,
    history: Box<dyn HistoryStore>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub captions: CaptionGenerator,
    pub history: Box<dyn HistoryStore>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            captions: services.captions,
            history: services.history,
        }
    }

    /// Construct an app with every keyed provider and the JSON history file.
    pub fn new(config: &Config) -> Self {
        info!("Caption history file: {}", config.history_path.display());
        Self::with_services(AppServices {
            captions: CaptionGenerator::from_config(config),
            history: Box::new(JsonHistoryStore::new(config.history_path.clone())),
        })
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub fn captions(&self) -> &CaptionGenerator {
        &self.captions
    }

    /// Caption `image_path` with `provider`, record it, and save the composited PNG.
    ///
    /// Nothing is recorded when caption generation fails.
    pub async fn caption_image(
        &self,
        image_path: &Path,
        provider: Provider,
        options: &RenderOptions,
        output: Option<&Path>,
    ) -> Result<CaptionOutcome> {
        let image = Self::load(image_path).await?;

        let caption = self.captions.generate(&image, provider).await?;
        info!("Caption from {}: {}", provider, caption);

        self.history.append(HistoryEntry::new(
            &image_display_name(image_path),
            provider.key(),
            &caption,
        ))?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(image_path));
        Self::render_and_save(image, caption, options.clone(), output).await
    }

    /// Composite a caption supplied by the caller, without calling a provider.
    pub async fn render_caption(
        &self,
        image_path: &Path,
        caption: &str,
        options: &RenderOptions,
        output: Option<&Path>,
    ) -> Result<CaptionOutcome> {
        let image = Self::load(image_path).await?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(image_path));
        Self::render_and_save(image, caption.to_string(), options.clone(), output).await
    }

    async fn load(image_path: &Path) -> Result<RgbImage> {
        let path = image_path.to_path_buf();
        tokio::task::spawn_blocking(move || load_image(&path))
            .await
            .map_err(|e| Error::Invariant(format!("Image load task join error: {}", e)))?
    }

    async fn render_and_save(
        image: RgbImage,
        caption: String,
        options: RenderOptions,
        output: PathBuf,
    ) -> Result<CaptionOutcome> {
        tokio::task::spawn_blocking(move || {
            let composed = compose(&image, &caption, &options);
            let png = encode_png(&composed)?;
            fs::write(&output, png)?;
            info!(
                "Saved {}x{} captioned image to {}",
                composed.width(),
                composed.height(),
                output.display()
            );
            Ok(CaptionOutcome {
                caption,
                output_path: output,
                width: composed.width(),
                height: composed.height(),
            })
        })
        .await
        .map_err(|e| Error::Invariant(format!("Render task join error: {}", e)))?
    }
}
