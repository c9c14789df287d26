//! ArUco marker tools for a camera-guided robot.
//!
//! This crate provides:
//! - per-frame [`Detection`]s with integer pixel centroids,
//! - [`Guidance`] (left / right / centered / searching) from the first marker,
//! - a [`ScanSession`] loop over any [`FrameSource`] and [`Display`],
//! - [`generate_marker`] for printable marker PNGs.
//!
//! Detection itself lives in [`markers`] (`aruco-nav-markers`).
//!
//! ## Quickstart
//!
//! ```no_run
//! use aruco_nav::markers::{builtins, ArucoDetector, DetectorParams};
//! use aruco_nav::{HeadlessDisplay, ImageSequenceSource, ScanMode, ScanSession, SessionConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = ImageSequenceSource::from_dir("frames")?;
//! let detector = ArucoDetector::new(builtins::DICT_6X6_250, DetectorParams::default())?;
//! let session = ScanSession::new(
//!     source,
//!     HeadlessDisplay::new(),
//!     std::io::stdout(),
//!     detector,
//!     SessionConfig::new(ScanMode::Guidance),
//! );
//! let summary = session.run()?;
//! println!("{} frames, {} with markers", summary.frames, summary.frames_with_markers);
//! # Ok(())
//! # }
//! ```

pub use aruco_nav_core as core;
pub use aruco_nav_markers as markers;

mod annotate;
mod detection;
mod display;
mod frame;
mod generate;
mod guidance;
mod session;

pub use annotate::annotate;
pub use detection::{centroid, detections_from, format_detections, Detection};
pub use display::{Display, DisplayError, HeadlessDisplay};
pub use frame::{Frame, FrameSource, FrameSourceError, ImageSequenceSource, IMAGE_EXTENSIONS};
pub use generate::{
    generate_marker, marker_file_name, write_gray_png, DictionarySource, GenerateError,
    GenerateRequest, GeneratedMarker,
};
pub use guidance::{classify, Guidance, DEFAULT_DEAD_ZONE};
pub use session::{
    write_report, FrameReport, ScanMode, ScanSession, SessionConfig, SessionError,
    SessionSummary, StopReason,
};
