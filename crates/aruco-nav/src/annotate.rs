//! Frame overlays for the two scan modes.

use crate::{Detection, ScanMode};
use aruco_nav_markers::{draw_detected_markers, draw_text, DetectMarkersResult};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Marker outlines, a centroid dot per detection and, in guidance mode, an id
/// label 15 px above the centroid.
pub fn annotate(
    frame: &mut RgbImage,
    result: &DetectMarkersResult,
    detections: &[Detection],
    mode: ScanMode,
) {
    if detections.is_empty() {
        return;
    }
    draw_detected_markers(frame, result, GREEN);

    for det in detections {
        let c = (det.centroid.x, det.centroid.y);
        match mode {
            ScanMode::Markers => draw_filled_circle_mut(frame, c, 5, GREEN),
            ScanMode::Guidance => {
                draw_filled_circle_mut(frame, c, 4, RED);
                draw_text(frame, &format!("ID: {}", det.id), c.0, c.1 - 15, 1, GREEN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn one_marker() -> (DetectMarkersResult, Vec<Detection>) {
        let quad = [
            Point2::new(40.0, 40.0),
            Point2::new(80.0, 40.0),
            Point2::new(80.0, 80.0),
            Point2::new(40.0, 80.0),
        ];
        let result = DetectMarkersResult {
            corners: vec![quad],
            ids: vec![8],
            rejected: Vec::new(),
        };
        (result, vec![Detection::new(8, quad)])
    }

    #[test]
    fn markers_mode_draws_green_dot() {
        let (result, dets) = one_marker();
        let mut img = RgbImage::new(120, 120);
        annotate(&mut img, &result, &dets, ScanMode::Markers);
        assert_eq!(img.get_pixel(60, 60), &GREEN);
        assert_eq!(img.get_pixel(64, 60), &GREEN);
    }

    #[test]
    fn guidance_mode_draws_red_dot() {
        let (result, dets) = one_marker();
        let mut img = RgbImage::new(120, 120);
        annotate(&mut img, &result, &dets, ScanMode::Guidance);
        assert_eq!(img.get_pixel(60, 60), &RED);
        assert_eq!(img.get_pixel(66, 60), &Rgb([0, 0, 0]));
    }

    #[test]
    fn empty_frame_is_untouched() {
        let mut img = RgbImage::new(20, 20);
        annotate(&mut img, &DetectMarkersResult::default(), &[], ScanMode::Guidance);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
