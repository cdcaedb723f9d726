//! Data models and configuration
//!
//! Defines caption providers, history records, overlay placement and the
//! environment-driven configuration object.

use crate::{Error, Result};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Hosted vision-language service used to caption an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "gemini")]
    Gemini,
    #[value(name = "groq")]
    Groq,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Gemini, Provider::Groq];

    /// Short identifier recorded in history entries.
    pub fn key(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_ICG",
            Provider::Gemini => "GEMINI_API_ICG",
            Provider::Groq => "GROQ_API_ICG",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-5-nano",
            Provider::Gemini => "gemini-2.5-flash-lite",
            Provider::Groq => "meta-llama/llama-4-scout-17b-16e-instruct",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Groq => "GROQ",
        };
        f.write_str(label)
    }
}

/// Vertical anchor for overlay captions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OverlayPosition {
    Top,
    #[default]
    Bottom,
    Center,
}

/// One recorded caption generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub image_name: String,
    pub model: String,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    Human,
    Assistant,
}

/// A single message of the request/answer transcript derived from history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl HistoryEntry {
    /// Create an entry stamped with the current local time.
    pub fn new(image_name: &str, model: &str, caption: &str) -> Self {
        Self {
            timestamp: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            image_name: image_name.to_string(),
            model: model.to_string(),
            caption: caption.to_string(),
        }
    }

    /// Render the entry as the human request followed by the model's answer.
    pub fn to_turns(&self) -> [ChatTurn; 2] {
        [
            ChatTurn {
                role: TurnRole::Human,
                content: format!(
                    "Generate caption for {} using {}.",
                    self.image_name, self.model
                ),
            },
            ChatTurn {
                role: TurnRole::Assistant,
                content: self.caption.clone(),
            },
        ]
    }
}

const DEFAULT_FONT_SIZE: f32 = 24.0;
const DEFAULT_HISTORY_FILE: &str = "caption_metadata.json";
const DEFAULT_FONTS_DIR: &str = "fonts";
const BUNDLED_FONT_FILE: &str = "Poppins-Regular.ttf";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_key: Option<String>,
    pub groq_key: Option<String>,
    pub gemini_key: Option<String>,
    pub openai_model: String,
    pub groq_model: String,
    pub gemini_model: String,
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub fonts_dir: PathBuf,
    pub history_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_key: None,
            groq_key: None,
            gemini_key: None,
            openai_model: Provider::OpenAi.default_model().to_string(),
            groq_model: Provider::Groq.default_model().to_string(),
            gemini_model: Provider::Gemini.default_model().to_string(),
            font_path: None,
            font_size: DEFAULT_FONT_SIZE,
            fonts_dir: PathBuf::from(DEFAULT_FONTS_DIR),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
        }
    }
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let font_size = match get("CAPTION_FONT_SIZE") {
            Some(raw) => {
                let size: f32 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("CAPTION_FONT_SIZE is not a number: {}", raw))
                })?;
                if !(size.is_finite() && size > 0.0) {
                    return Err(Error::Config(format!(
                        "CAPTION_FONT_SIZE must be positive, got {}",
                        raw
                    )));
                }
                size
            }
            None => defaults.font_size,
        };

        Ok(Self {
            openai_key: get(Provider::OpenAi.api_key_var()),
            groq_key: get(Provider::Groq.api_key_var()),
            gemini_key: get(Provider::Gemini.api_key_var()),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            groq_model: get("GROQ_MODEL").unwrap_or(defaults.groq_model),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            font_path: get("CAPTION_FONT_PATH").map(PathBuf::from),
            font_size,
            fonts_dir: get("CAPTION_FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fonts_dir),
            history_path: get("CAPTION_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_path),
        })
    }

    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_key.as_deref(),
            Provider::Gemini => self.gemini_key.as_deref(),
            Provider::Groq => self.groq_key.as_deref(),
        }
    }

    pub fn model(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai_model,
            Provider::Gemini => &self.gemini_model,
            Provider::Groq => &self.groq_model,
        }
    }

    /// Which providers have a key available, in display order.
    pub fn provider_status(&self) -> Vec<(Provider, bool)> {
        Provider::ALL
            .iter()
            .map(|provider| (*provider, self.api_key(*provider).is_some()))
            .collect()
    }

    /// The configured font, or the bundled font in `fonts_dir` when it exists.
    pub fn font_path_or_default(&self) -> Option<PathBuf> {
        if let Some(path) = &self.font_path {
            return Some(path.clone());
        }
        let bundled = self.fonts_dir.join(BUNDLED_FONT_FILE);
        bundled.exists().then_some(bundled)
    }
}

/// Parse a `#RRGGBB` (or `RRGGBB`) color string.
pub fn parse_hex_color(input: &str) -> Result<Rgb<u8>> {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(Error::Config(format!(
            "Invalid color '{}'. Expected format: #RRGGBB",
            input
        )));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| {
            Error::Config(format!(
                "Invalid color '{}'. Expected format: #RRGGBB",
                input
            ))
        })
    };

    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

/// File name used in history records for an image path.
pub fn image_display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
