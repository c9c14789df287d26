//! Left / right / centered steering hints from the first detected marker.

use crate::Detection;
use serde::Serialize;
use std::fmt;

/// Half-width of the band around the frame center that counts as centered.
pub const DEFAULT_DEAD_ZONE: u32 = 50;

/// Steering hint for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum Guidance {
    Left { x: i32 },
    Right { x: i32 },
    Centered { x: i32 },
    Searching,
}

impl Guidance {
    /// Classify a centroid x against `frame_width / 2` and the dead zone.
    ///
    /// The band edges are computed in `i64`, so any width and dead zone is safe.
    pub fn from_x(frame_width: u32, x: i32, dead_zone: u32) -> Self {
        let mid = i64::from(frame_width / 2);
        let dead_zone = i64::from(dead_zone);
        let xl = i64::from(x);
        if xl < mid - dead_zone {
            Guidance::Left { x }
        } else if xl > mid + dead_zone {
            Guidance::Right { x }
        } else {
            Guidance::Centered { x }
        }
    }

    /// Like [`classify`], with an empty frame mapped to `Searching`.
    pub fn for_frame(frame_width: u32, detections: &[Detection], dead_zone: u32) -> Self {
        classify(frame_width, detections, dead_zone).unwrap_or(Guidance::Searching)
    }

    /// Console instruction text.
    pub fn instruction(&self) -> String {
        match *self {
            Guidance::Left { x } => format!("Move LEFT (ArUco center at x={x})"),
            Guidance::Right { x } => format!("Move RIGHT (ArUco center at x={x})"),
            Guidance::Centered { x } => {
                format!("Robot is centered! Done (ArUco center at x={x})")
            }
            Guidance::Searching => "No markers detected. Searching...".to_string(),
        }
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instruction: {}", self.instruction())
    }
}

/// Guidance from the first detection only, or `None` for an empty frame.
pub fn classify(frame_width: u32, detections: &[Detection], dead_zone: u32) -> Option<Guidance> {
    let first = detections.first()?;
    Some(Guidance::from_x(frame_width, first.centroid.x, dead_zone))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn detection_at(id: u32, x: f32) -> Detection {
        Detection::new(
            id,
            [
                Point2::new(x - 10.0, 90.0),
                Point2::new(x + 10.0, 90.0),
                Point2::new(x + 10.0, 110.0),
                Point2::new(x - 10.0, 110.0),
            ],
        )
    }

    #[test]
    fn width_640_thresholds() {
        let cases = [
            (100, Guidance::Left { x: 100 }),
            (320, Guidance::Centered { x: 320 }),
            (600, Guidance::Right { x: 600 }),
            (270, Guidance::Centered { x: 270 }),
            (269, Guidance::Left { x: 269 }),
            (370, Guidance::Centered { x: 370 }),
            (371, Guidance::Right { x: 371 }),
        ];
        for (x, expected) in cases {
            assert_eq!(Guidance::from_x(640, x, DEFAULT_DEAD_ZONE), expected, "x={x}");
        }
    }

    #[test]
    fn odd_width_uses_integer_midpoint() {
        // mid = 320
        assert_eq!(Guidance::from_x(641, 371, 50), Guidance::Right { x: 371 });
        assert_eq!(Guidance::from_x(641, 370, 50), Guidance::Centered { x: 370 });
    }

    #[test]
    fn extreme_inputs_do_not_overflow() {
        assert_eq!(
            Guidance::from_x(640, 0, u32::MAX),
            Guidance::Centered { x: 0 }
        );
        assert_eq!(
            Guidance::from_x(u32::MAX, i32::MIN, 0),
            Guidance::Left { x: i32::MIN }
        );
        assert_eq!(
            Guidance::from_x(0, i32::MAX, 0),
            Guidance::Right { x: i32::MAX }
        );
        // A zero band still centers the exact midpoint.
        assert_eq!(Guidance::from_x(640, 320, 0), Guidance::Centered { x: 320 });
        assert_eq!(Guidance::from_x(640, 319, 0), Guidance::Left { x: 319 });
    }

    #[test]
    fn empty_frame_has_no_instruction() {
        assert_eq!(classify(640, &[], DEFAULT_DEAD_ZONE), None);
        assert_eq!(
            Guidance::for_frame(640, &[], DEFAULT_DEAD_ZONE),
            Guidance::Searching
        );
    }

    #[test]
    fn only_first_detection_counts() {
        let dets = [detection_at(1, 600.0), detection_at(2, 100.0)];
        assert_eq!(
            classify(640, &dets, DEFAULT_DEAD_ZONE),
            Some(Guidance::Right { x: 600 })
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let dets = [detection_at(7, 250.0)];
        let a = classify(640, &dets, DEFAULT_DEAD_ZONE);
        let b = classify(640, &dets, DEFAULT_DEAD_ZONE);
        assert_eq!(a, b);
    }

    #[test]
    fn narrow_frame_left_of_center() {
        let dets = [detection_at(4, 50.0)];
        let g = Guidance::for_frame(800, &dets, DEFAULT_DEAD_ZONE);
        assert_eq!(g, Guidance::Left { x: 50 });
        assert_eq!(
            g.to_string(),
            "Instruction: Move LEFT (ArUco center at x=50)"
        );
    }

    #[test]
    fn serializes_with_direction_tag() {
        let json = serde_json::to_string(&Guidance::Right { x: 400 }).expect("json");
        assert_eq!(json, r#"{"direction":"right","x":400}"#);
        let json = serde_json::to_string(&Guidance::Searching).expect("json");
        assert_eq!(json, r#"{"direction":"searching"}"#);
    }
}
