//! Per-frame marker detections and their pixel centroids.

use aruco_nav_core::Quad;
use aruco_nav_markers::DetectMarkersResult;
use nalgebra::Point2;
use serde::Serialize;
use std::fmt;

/// One marker found in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub id: u32,
    /// Detector order: clockwise, starting at the marker's own top-left.
    pub corners: Quad,
    pub centroid: Point2<i32>,
}

impl Detection {
    pub fn new(id: u32, corners: Quad) -> Self {
        Self {
            id,
            corners,
            centroid: centroid(&corners),
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{id: {}, x: {}, y: {}}}",
            self.id, self.centroid.x, self.centroid.y
        )
    }
}

/// Mean of the four corners per axis, truncated toward zero.
pub fn centroid(corners: &Quad) -> Point2<i32> {
    let (sx, sy) = corners
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    Point2::new((sx / 4.0) as i32, (sy / 4.0) as i32)
}

/// Convert a detector result into detections, keeping the detector's order.
pub fn detections_from(result: &DetectMarkersResult) -> Vec<Detection> {
    result
        .iter()
        .map(|(id, corners)| Detection::new(id, *corners))
        .collect()
}

/// `[{id: 3, x: 120, y: 88}, ...]`
pub fn format_detections(detections: &[Detection]) -> String {
    let items: Vec<String> = detections.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}
