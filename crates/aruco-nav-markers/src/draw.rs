//! Overlay helpers for annotated frames.

use crate::DetectMarkersResult;
use aruco_nav_core::Quad;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Outline every detected marker and mark its first corner with a small box.
pub fn draw_detected_markers(img: &mut RgbImage, result: &DetectMarkersResult, color: Rgb<u8>) {
    for (id, quad) in result.iter() {
        draw_quad(img, quad, color);

        let c0 = quad[0];
        let corner = Rect::at(c0.x.round() as i32 - 3, c0.y.round() as i32 - 3).of_size(7, 7);
        draw_hollow_rect_mut(img, corner, Rgb([255, 0, 0]));

        let (x, y) = (c0.x.round() as i32, c0.y.round() as i32 - GLYPH_H as i32 * 2 - 4);
        draw_text(img, &format!("ID:{id}"), x, y, 2, color);
    }
}

/// Closed four-segment outline.
pub fn draw_quad(img: &mut RgbImage, quad: &Quad, color: Rgb<u8>) {
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), color);
    }
}

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

/// Draw `text` with its top-left at `(x, y)`, each font pixel `scale` px wide.
///
/// The built-in 5x7 font covers digits, `ID`, `:`, `-` and space; other
/// characters advance the cursor without drawing.
pub fn draw_text(img: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let mut cursor = x;
    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            for (gy, row) in rows.iter().enumerate() {
                for gx in 0..GLYPH_W {
                    if row & (1 << (GLYPH_W - 1 - gx)) == 0 {
                        continue;
                    }
                    let px = cursor + (gx * scale) as i32;
                    let py = y + (gy as u32 * scale) as i32;
                    draw_filled_rect_mut(img, Rect::at(px, py).of_size(scale, scale), color);
                }
            }
        }
        cursor += ((GLYPH_W + 1) * scale) as i32;
    }
}

fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ' ' => [0; 7],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn outline_touches_corners() {
        let mut img = RgbImage::new(60, 60);
        let quad = [
            Point2::new(10.0, 10.0),
            Point2::new(50.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(10.0, 50.0),
        ];
        draw_quad(&mut img, &quad, Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(30, 10), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(50, 30), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(30, 30), &Rgb([0, 0, 0]));
    }

    #[test]
    fn text_is_clipped_at_the_edge() {
        let mut img = RgbImage::new(20, 10);
        draw_text(&mut img, "ID:1234", 2, -3, 1, Rgb([255, 255, 255]));
        draw_text(&mut img, "?", 0, 0, 1, Rgb([255, 0, 0]));
        assert!(img.pixels().any(|p| p.0 == [255, 255, 255]));
        assert!(img.pixels().all(|p| p.0 != [255, 0, 0]));
    }

    #[test]
    fn every_label_character_has_a_glyph() {
        for ch in "ID:0123456789- ".chars() {
            assert!(glyph(ch).is_some(), "{ch:?}");
        }
    }
}
