//! Letterboxed captions: the canvas grows and the caption gets its own band
//! above the original image.

use super::font::TextRenderer;
use super::layout::{wrap, WrappedText};
use image::{imageops, Rgb, RgbImage};

const LINE_GAP: u32 = 10;

/// Colors and spacing of the caption band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundStyle {
    pub background: Rgb<u8>,
    pub text: Rgb<u8>,
    pub margin: u32,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self {
            background: Rgb([33, 34, 69]),
            text: Rgb([183, 212, 225]),
            margin: 50,
        }
    }
}

/// Height of the wrapped text block: every line plus the gaps between lines.
pub fn background_text_height(wrapped: &WrappedText) -> u32 {
    let lines = wrapped.line_count() as u32;
    lines * wrapped.max_line_height() + lines.saturating_sub(1) * LINE_GAP
}

/// Place `caption` in a band above a copy of `image` on a taller canvas.
///
/// The result is `image.height + text_height + 2 * margin` pixels tall; the
/// text band occupies the top and the original image the bottom.
pub fn with_background<R>(
    image: &RgbImage,
    caption: &str,
    font: &R,
    style: &BackgroundStyle,
) -> RgbImage
where
    R: TextRenderer + ?Sized,
{
    let (width, height) = image.dimensions();
    let margin = style.margin;

    let wrapped = wrap(caption, font, i64::from(width) - 2 * i64::from(margin));
    let line_height = wrapped.max_line_height();
    let text_height = background_text_height(&wrapped);
    let band_height = text_height + 2 * margin;

    let mut canvas = RgbImage::from_pixel(width, height + band_height, style.background);
    imageops::replace(&mut canvas, image, 0, i64::from(band_height));

    tracing::debug!(
        "Background: {} line(s), text height {}, canvas {}x{}",
        wrapped.line_count(),
        text_height,
        width,
        canvas.height()
    );

    let mut y = i64::from(margin);
    for line in &wrapped.lines {
        let x = (i64::from(width) - i64::from(line.width)).div_euclid(2);
        font.draw(&mut canvas, &line.text, x as i32, y as i32, style.text);
        y += i64::from(line_height + LINE_GAP);
    }

    canvas
}
