//! Captions drawn directly over the image on dark backing plates.

use super::font::TextRenderer;
use super::layout::wrap;
use crate::models::OverlayPosition;
use image::RgbImage;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const SIDE_MARGIN: i64 = 20;
const LINE_SPACING: i64 = 10;
const BOTTOM_MARGIN: i64 = 20;
const TOP_OFFSET: i64 = 30;
const PLATE_PAD_X: i64 = 10;
const PLATE_PAD_Y: i64 = 5;

/// Vertical start of a caption block of `total_height` pixels.
pub fn overlay_start_y(position: OverlayPosition, image_height: u32, total_height: i64) -> i64 {
    let image_height = i64::from(image_height);
    match position {
        OverlayPosition::Bottom => image_height - total_height - BOTTOM_MARGIN,
        OverlayPosition::Top => TOP_OFFSET,
        OverlayPosition::Center => (image_height - total_height).div_euclid(2),
    }
}

/// Draw `caption` over a copy of `image`, centered per line, anchored at `position`.
///
/// Each line sits on an opaque plate in the font's overlay palette. The input
/// image is left untouched.
pub fn overlay<R>(image: &RgbImage, caption: &str, position: OverlayPosition, font: &R) -> RgbImage
where
    R: TextRenderer + ?Sized,
{
    let mut canvas = image.clone();
    let (width, height) = canvas.dimensions();
    let width = i64::from(width);

    let wrapped = wrap(caption, font, width - 2 * SIDE_MARGIN);

    let line_height = i64::from(font.measure("A").1) + LINE_SPACING;
    let total_height = wrapped.line_count() as i64 * line_height;
    let start_y = overlay_start_y(position, height, total_height);
    let palette = font.overlay_palette();

    tracing::debug!(
        "Overlay: {} line(s), line height {}, start y {}",
        wrapped.line_count(),
        line_height,
        start_y
    );

    for (i, line) in wrapped.lines.iter().enumerate() {
        let line_width = i64::from(line.width);
        let x = (width - line_width).div_euclid(2);
        let y = start_y + i as i64 * line_height;

        let plate_width = line_width + 2 * PLATE_PAD_X + 1;
        let plate_height = i64::from(line.height) + 2 * PLATE_PAD_Y + 1;
        let plate = Rect::at((x - PLATE_PAD_X) as i32, (y - PLATE_PAD_Y) as i32)
            .of_size(plate_width as u32, plate_height as u32);
        draw_filled_rect_mut(&mut canvas, plate, palette.plate);

        font.draw(&mut canvas, &line.text, x as i32, y as i32, palette.text);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::font::{BitmapFont, OVERLAY_PALETTE};
    use crate::render::test_support::{gradient_image, FixedMetrics};
    use image::Rgb;

    #[test]
    fn test_start_y_per_position() {
        assert_eq!(overlay_start_y(OverlayPosition::Bottom, 300, 44), 236);
        assert_eq!(overlay_start_y(OverlayPosition::Top, 300, 44), 30);
        assert_eq!(overlay_start_y(OverlayPosition::Center, 300, 44), 128);
        assert_eq!(overlay_start_y(OverlayPosition::Center, 301, 44), 128);
        assert_eq!(overlay_start_y(OverlayPosition::Center, 10, 45), -18);
    }

    #[test]
    fn test_overlay_does_not_modify_input() {
        let image = gradient_image(200, 120);
        let reference = image.clone();
        let font = BitmapFont::new(2, 2);

        for position in [
            OverlayPosition::Top,
            OverlayPosition::Bottom,
            OverlayPosition::Center,
        ] {
            let result = overlay(&image, "A red fox at dusk", position, &font);
            assert_eq!(result.dimensions(), image.dimensions());
            assert_ne!(result, image);
        }
        assert_eq!(image, reference);
    }

    #[test]
    fn test_bottom_plate_geometry() {
        let image = RgbImage::from_pixel(200, 100, Rgb([200, 200, 200]));
        let font = FixedMetrics::new(10, 12);

        let result = overlay(&image, "hello", OverlayPosition::Bottom, &font);

        // one line: line height 22, start y = 100 - 22 - 20 = 58, x = (200 - 50) / 2 = 75
        assert_eq!(result.get_pixel(65, 53), &OVERLAY_PALETTE.plate);
        assert_eq!(result.get_pixel(135, 75), &OVERLAY_PALETTE.plate);
        assert_eq!(result.get_pixel(64, 53), &Rgb([200, 200, 200]));
        assert_eq!(result.get_pixel(65, 52), &Rgb([200, 200, 200]));
        assert_eq!(result.get_pixel(136, 75), &Rgb([200, 200, 200]));
        assert_eq!(result.get_pixel(135, 76), &Rgb([200, 200, 200]));
        assert_eq!(result.get_pixel(80, 60), &OVERLAY_PALETTE.text);
    }

    #[test]
    fn test_top_lines_stack_by_line_height() {
        let image = RgbImage::from_pixel(100, 200, Rgb([255, 255, 255]));
        let font = FixedMetrics::new(10, 12);

        // max width 60 fits six characters per line
        let result = overlay(&image, "abc def ghi", OverlayPosition::Top, &font);

        // first line at y=30, second at y=52, third at y=74
        for y in [30, 52, 74] {
            assert_eq!(result.get_pixel(50, y), &OVERLAY_PALETTE.text);
        }
        assert_eq!(result.get_pixel(50, 100), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_overlay_clips_on_tiny_images() {
        let image = gradient_image(12, 8);
        let font = BitmapFont::new(3, 2);
        let result = overlay(&image, "a caption far too large for this", OverlayPosition::Center, &font);
        assert_eq!(result.dimensions(), (12, 8));
    }

    #[test]
    fn test_empty_caption_still_draws_a_plate() {
        let image = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let font = FixedMetrics::new(10, 12);
        let result = overlay(&image, "", OverlayPosition::Center, &font);
        // centered empty line: x = 50, start y = (100 - 22) / 2 = 39
        assert_eq!(result.get_pixel(50, 40), &OVERLAY_PALETTE.plate);
    }
}
