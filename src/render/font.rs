//! Glyph sources used for both measuring and drawing caption text.
//!
//! Two backends exist: a built-in 8x8 bitmap font that needs no files, and
//! scalable TrueType/OpenType fonts rasterized through `ab_glyph`. Whichever
//! one is selected measures and draws through the same [`TextRenderer`]
//! implementation so wrapped widths never drift from rendered widths.

use crate::{Error, Result};
use ab_glyph::{FontVec, PxScale};
use font8x8::legacy::BASIC_LEGACY;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Backing plate and text colors used by overlay captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPalette {
    pub plate: Rgb<u8>,
    pub text: Rgb<u8>,
}

pub const OVERLAY_PALETTE: OverlayPalette = OverlayPalette {
    plate: Rgb([0, 0, 0]),
    text: Rgb([66, 140, 255]),
};

/// Measures and draws a single line of text.
pub trait TextRenderer {
    /// Width and height in pixels of `text` rendered on one line.
    fn measure(&self, text: &str) -> (u32, u32);

    /// Draw `text` with its top-left corner at (`x`, `y`), clipped to the canvas.
    fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>);

    fn overlay_palette(&self) -> OverlayPalette {
        OVERLAY_PALETTE
    }
}

/// Built-in fixed-cell font. Every glyph occupies an 8x8 cell scaled by `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    unit: u32,
    thickness: u32,
}

impl BitmapFont {
    pub const CELL: u32 = 8;

    pub fn new(unit: u32, thickness: u32) -> Self {
        Self {
            unit: unit.max(1),
            thickness: thickness.max(1),
        }
    }

    /// Pick the integer cell scale closest to a requested pixel size.
    pub fn with_pixel_size(px_size: f32) -> Self {
        let unit = (px_size / Self::CELL as f32).round().max(1.0) as u32;
        Self::new(unit, 1)
    }

    pub fn with_thickness(self, thickness: u32) -> Self {
        Self::new(self.unit, thickness)
    }

    pub fn thickness(&self) -> u32 {
        self.thickness
    }

    fn advance(&self) -> u32 {
        Self::CELL * self.unit
    }

    fn glyph(c: char) -> [u8; 8] {
        let index = if c.is_ascii() { c as usize } else { '?' as usize };
        BASIC_LEGACY[index]
    }
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

impl TextRenderer for BitmapFont {
    fn measure(&self, text: &str) -> (u32, u32) {
        let glyphs = text.chars().count() as u32;
        let stroke = self.thickness - 1;
        let width = if glyphs == 0 {
            0
        } else {
            glyphs * self.advance() + stroke
        };
        (width, self.advance() + stroke)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        let dot = self.unit + self.thickness - 1;
        for (i, c) in text.chars().enumerate() {
            let origin_x = x + (i as u32 * self.advance()) as i32;
            for (row, bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..Self::CELL {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let px = origin_x + (col * self.unit) as i32;
                    let py = y + (row as u32 * self.unit) as i32;
                    draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(dot, dot), color);
                }
            }
        }
    }
}

/// A font file loaded from disk at a fixed pixel size.
#[derive(Clone)]
pub struct ScalableFont {
    font: Arc<FontVec>,
    scale: PxScale,
}

impl ScalableFont {
    pub fn from_path(path: &Path, px_size: f32) -> Result<Self> {
        let data = fs::read(path)?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| Error::Font(format!("Failed to parse font file: {}", path.display())))?;
        Ok(Self {
            font: Arc::new(font),
            scale: PxScale::from(px_size),
        })
    }

    pub fn px_size(&self) -> f32 {
        self.scale.y
    }
}

impl fmt::Debug for ScalableFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalableFont")
            .field("px_size", &self.scale.y)
            .finish_non_exhaustive()
    }
}

impl TextRenderer for ScalableFont {
    fn measure(&self, text: &str) -> (u32, u32) {
        text_size(self.scale, self.font.as_ref(), text)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, self.scale, self.font.as_ref(), text);
    }
}

/// The glyph source chosen at configuration time.
#[derive(Debug, Clone)]
pub enum FontHandle {
    Bitmap(BitmapFont),
    Scalable(ScalableFont),
}

impl FontHandle {
    /// Stroke thickness only applies to the bitmap font.
    pub fn with_thickness(self, thickness: u32) -> Self {
        match self {
            FontHandle::Bitmap(font) => FontHandle::Bitmap(font.with_thickness(thickness)),
            scalable => scalable,
        }
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, FontHandle::Scalable(_))
    }
}

impl Default for FontHandle {
    fn default() -> Self {
        FontHandle::Bitmap(BitmapFont::default())
    }
}

impl TextRenderer for FontHandle {
    fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            FontHandle::Bitmap(font) => font.measure(text),
            FontHandle::Scalable(font) => font.measure(text),
        }
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        match self {
            FontHandle::Bitmap(font) => font.draw(canvas, text, x, y, color),
            FontHandle::Scalable(font) => font.draw(canvas, text, x, y, color),
        }
    }

    fn overlay_palette(&self) -> OverlayPalette {
        match self {
            FontHandle::Bitmap(font) => font.overlay_palette(),
            FontHandle::Scalable(font) => font.overlay_palette(),
        }
    }
}

/// Resolve a font file at `px_size`, falling back to the built-in bitmap font.
///
/// Never fails: unreadable or unparsable fonts are logged and replaced.
pub fn resolve_font(path: Option<&Path>, px_size: f32) -> FontHandle {
    let fallback = FontHandle::Bitmap(BitmapFont::with_pixel_size(px_size));
    let Some(path) = path else {
        return fallback;
    };

    match ScalableFont::from_path(path, px_size) {
        Ok(font) => {
            tracing::debug!("Loaded font {} at {}px", path.display(), px_size);
            FontHandle::Scalable(font)
        }
        Err(e) => {
            tracing::warn!(
                "Could not load font {}: {}. Using built-in font",
                path.display(),
                e
            );
            fallback
        }
    }
}

/// A selectable font: display name plus file, or the built-in font when `path` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChoice {
    pub name: String,
    pub path: Option<PathBuf>,
}

pub const BUILTIN_FONT_NAME: &str = "Default (built-in)";

/// List `.ttf` fonts in `dir` sorted by display name, built-in font first.
pub fn available_fonts(dir: &Path) -> Vec<FontChoice> {
    let mut fonts: Vec<FontChoice> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == "ttf" || ext == "TTF")
            })
            .filter_map(|path| {
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some(FontChoice {
                    name: stem.replace(['-', '_'], " "),
                    path: Some(path),
                })
            })
            .collect(),
        Err(e) => {
            tracing::debug!("No font directory at {}: {}", dir.display(), e);
            Vec::new()
        }
    };

    fonts.sort_by(|a, b| a.name.cmp(&b.name));
    fonts.insert(
        0,
        FontChoice {
            name: BUILTIN_FONT_NAME.to_string(),
            path: None,
        },
    );
    fonts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bitmap_measure_scales_with_unit_and_thickness() {
        let font = BitmapFont::new(2, 1);
        assert_eq!(font.measure("abc"), (48, 16));
        assert_eq!(font.measure(""), (0, 16));

        let thick = font.with_thickness(3);
        assert_eq!(thick.measure("abc"), (50, 18));
    }

    #[test]
    fn test_bitmap_pixel_size_rounds_to_cell_unit() {
        assert_eq!(BitmapFont::with_pixel_size(20.0), BitmapFont::new(3, 1));
        assert_eq!(BitmapFont::with_pixel_size(24.0), BitmapFont::new(3, 1));
        assert_eq!(BitmapFont::with_pixel_size(2.0), BitmapFont::new(1, 1));
    }

    #[test]
    fn test_bitmap_draw_stays_inside_measured_box() {
        let font = BitmapFont::new(2, 2);
        let mut canvas = RgbImage::from_pixel(100, 40, Rgb([0, 0, 0]));
        let (w, h) = font.measure("Hi");
        font.draw(&mut canvas, "Hi", 10, 5, Rgb([255, 255, 255]));

        let mut lit = 0;
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if pixel.0 == [255, 255, 255] {
                lit += 1;
                assert!(x >= 10 && x < 10 + w, "x={} outside measured width", x);
                assert!(y >= 5 && y < 5 + h, "y={} outside measured height", y);
            }
        }
        assert!(lit > 0);
    }

    #[test]
    fn test_bitmap_draw_clips_at_canvas_edges() {
        let font = BitmapFont::new(4, 1);
        let mut canvas = RgbImage::new(10, 10);
        font.draw(&mut canvas, "WWW", -20, -5, Rgb([255, 0, 0]));
        font.draw(&mut canvas, "WWW", 5, 5, Rgb([255, 0, 0]));
        assert_eq!(canvas.dimensions(), (10, 10));
    }

    #[test]
    fn test_bitmap_non_ascii_renders_placeholder() {
        let font = BitmapFont::new(1, 1);
        let mut accented = RgbImage::new(8, 8);
        let mut question = RgbImage::new(8, 8);
        font.draw(&mut accented, "é", 0, 0, Rgb([255, 255, 255]));
        font.draw(&mut question, "?", 0, 0, Rgb([255, 255, 255]));
        assert_eq!(accented, question);
    }

    #[test]
    fn test_resolve_font_without_path_uses_bitmap() {
        let font = resolve_font(None, 24.0);
        assert!(!font.is_scalable());
        assert_eq!(font.measure("A"), (24, 24));
    }

    #[test]
    fn test_resolve_font_falls_back_on_missing_file() {
        let font = resolve_font(Some(Path::new("/definitely/not/a/font.ttf")), 16.0);
        assert!(matches!(font, FontHandle::Bitmap(_)));
    }

    #[test]
    fn test_resolve_font_falls_back_on_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"this is not a font").unwrap();

        let font = resolve_font(Some(&path), 16.0);
        assert!(matches!(font, FontHandle::Bitmap(_)));
    }

    #[test]
    fn test_with_thickness_only_changes_bitmap() {
        let font = FontHandle::Bitmap(BitmapFont::new(1, 1)).with_thickness(4);
        match font {
            FontHandle::Bitmap(bitmap) => assert_eq!(bitmap.thickness(), 4),
            FontHandle::Scalable(_) => panic!("expected bitmap font"),
        }
    }

    #[test]
    fn test_available_fonts_lists_ttf_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Poppins-Regular.ttf"), b"x").unwrap();
        fs::write(dir.path().join("Open_Sans.TTF"), b"x").unwrap();
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let fonts = available_fonts(dir.path());
        let names: Vec<&str> = fonts.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![BUILTIN_FONT_NAME, "Open Sans", "Poppins Regular"]);
        assert_eq!(fonts[0].path, None);
        assert_eq!(fonts[2].path, Some(dir.path().join("Poppins-Regular.ttf")));
    }

    #[test]
    fn test_available_fonts_missing_dir_has_only_builtin() {
        let fonts = available_fonts(Path::new("/no/such/fonts/dir"));
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].name, BUILTIN_FONT_NAME);
    }
}
