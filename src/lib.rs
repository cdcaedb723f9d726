//! Multi-provider image caption generator
//!
//! Asks a hosted vision-language model (OpenAI, Gemini or Groq) for a short
//! caption, renders that caption onto the image as an overlay or in a
//! letterboxed band, and keeps an append-only history of every generation.

pub mod ai;
pub mod app;
pub mod error;
pub mod history;
pub mod models;
pub mod prompts;
pub mod render;

pub use error::{Error, Result};
