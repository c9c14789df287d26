//! ArUco dictionaries, full-frame marker detection and marker rendering.
//!
//! The pipeline mirrors the classic square-fiducial approach:
//! - adaptive thresholding at several window sizes,
//! - outer contour tracing and polygon approximation down to convex quads,
//! - perspective sampling of the cell grid and Otsu binarization,
//! - matching the inner bits against an embedded dictionary in all four
//!   rotations with bounded Hamming error.
//!
//! ```no_run
//! use aruco_nav_markers::{builtins, ArucoDetector, DetectorParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame.png")?.to_luma8();
//! let detector = ArucoDetector::new(builtins::DICT_6X6_250, DetectorParams::default())?;
//! for (id, corners) in detector.detect_markers_image(&img).iter() {
//!     println!("{id}: {corners:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod builtins;
mod candidates;
mod decode;
mod detector;
mod dictionary;
mod draw;
mod matcher;
mod render;
mod threshold;

pub use detector::{ArucoDetector, DetectMarkersResult, DetectorError, DetectorParams};
pub use dictionary::{Dictionary, DictionaryError};
pub use draw::{draw_detected_markers, draw_quad, draw_text};
pub use matcher::{rotate_code_u64, Match, Matcher};
pub use render::{generate_marker_image, RenderError};
