//! Caption layout and compositing
//!
//! Wraps caption text against measured glyph widths and composites it onto
//! images, either as an overlay or in a letterboxed band, then encodes the
//! result as PNG for download.

pub mod background;
pub mod font;
pub mod layout;
pub mod overlay;

pub use background::{background_text_height, with_background, BackgroundStyle};
pub use font::{
    available_fonts, resolve_font, BitmapFont, FontChoice, FontHandle, OverlayPalette,
    ScalableFont, TextRenderer,
};
pub use layout::{wrap, WrappedLine, WrappedText};
pub use overlay::overlay;

use crate::Result;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Decode an image file into 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
