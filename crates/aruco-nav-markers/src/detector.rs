//! Full-frame ArUco detection: candidate quads, bit decoding, dictionary lookup.

use crate::candidates::find_candidates;
use crate::decode::QuadDecoder;
use crate::{Dictionary, Matcher};
use aruco_nav_core::{GrayImageView, Quad};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors raised when building a detector or loading its parameters.
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid detector parameter `{field}`: {reason}")]
    InvalidParam {
        field: &'static str,
        reason: &'static str,
    },
    #[error("image buffer does not match its dimensions ({width}x{height})")]
    InvalidImage { width: usize, height: usize },
}

/// Tuning knobs of the detector. Field names follow OpenCV's `DetectorParameters`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Smallest adaptive-threshold window (pixels, odd values work best).
    pub adaptive_thresh_win_size_min: u32,
    pub adaptive_thresh_win_size_max: u32,
    pub adaptive_thresh_win_size_step: u32,
    /// Pixel is foreground when darker than `local_mean - constant`.
    pub adaptive_thresh_constant: f32,
    /// Contour length bounds relative to the larger image side.
    pub min_marker_perimeter_rate: f64,
    pub max_marker_perimeter_rate: f64,
    /// Douglas–Peucker epsilon relative to the contour length.
    pub polygonal_approx_accuracy_rate: f64,
    /// Shortest allowed quad side relative to its perimeter.
    pub min_corner_distance_rate: f32,
    /// Corners closer than this to the image edge reject the quad.
    pub min_distance_to_border: u32,
    /// Quads whose mean corner distance is below this fraction of the
    /// perimeter are treated as the same candidate.
    pub min_marker_distance_rate: f32,
    /// Width of the black border in cells.
    pub marker_border_bits: usize,
    /// Required fraction of border cells read as black.
    pub min_border_score: f32,
    /// Fraction of the dictionary's correction capacity used when matching.
    pub error_correction_rate: f32,
    /// Also try white-on-black markers.
    pub detect_inverted_marker: bool,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            adaptive_thresh_win_size_min: 3,
            adaptive_thresh_win_size_max: 23,
            adaptive_thresh_win_size_step: 10,
            adaptive_thresh_constant: 7.0,
            min_marker_perimeter_rate: 0.03,
            max_marker_perimeter_rate: 4.0,
            polygonal_approx_accuracy_rate: 0.03,
            min_corner_distance_rate: 0.05,
            min_distance_to_border: 3,
            min_marker_distance_rate: 0.05,
            marker_border_bits: 1,
            min_border_score: 0.75,
            error_correction_rate: 0.6,
            detect_inverted_marker: false,
        }
    }
}

impl DetectorParams {
    /// Load parameters from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let raw = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json_string(&self) -> Result<String, DetectorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject parameter combinations the detector cannot work with.
    pub fn validate(&self) -> Result<(), DetectorError> {
        let invalid = |field, reason| Err(DetectorError::InvalidParam { field, reason });

        if self.adaptive_thresh_win_size_min < 3 {
            return invalid("adaptive_thresh_win_size_min", "must be at least 3");
        }
        if self.adaptive_thresh_win_size_max < self.adaptive_thresh_win_size_min {
            return invalid(
                "adaptive_thresh_win_size_max",
                "must not be below adaptive_thresh_win_size_min",
            );
        }
        if self.adaptive_thresh_win_size_step == 0 {
            return invalid("adaptive_thresh_win_size_step", "must be positive");
        }
        if self.min_marker_perimeter_rate <= 0.0
            || self.min_marker_perimeter_rate >= self.max_marker_perimeter_rate
        {
            return invalid(
                "min_marker_perimeter_rate",
                "must be positive and below max_marker_perimeter_rate",
            );
        }
        if self.polygonal_approx_accuracy_rate <= 0.0 {
            return invalid("polygonal_approx_accuracy_rate", "must be positive");
        }
        if self.marker_border_bits == 0 {
            return invalid("marker_border_bits", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.min_border_score) {
            return invalid("min_border_score", "must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.error_correction_rate) {
            return invalid("error_correction_rate", "must be within [0, 1]");
        }
        Ok(())
    }

    /// Window sizes visited by the adaptive threshold, smallest first.
    pub fn threshold_windows(&self) -> impl Iterator<Item = u32> {
        let step = self.adaptive_thresh_win_size_step.max(1) as usize;
        (self.adaptive_thresh_win_size_min..=self.adaptive_thresh_win_size_max).step_by(step)
    }
}

/// Output of [`ArucoDetector::detect_markers`].
///
/// `corners[i]` and `ids[i]` describe the same marker. Corners start at the
/// marker's own top-left and run clockwise in image coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectMarkersResult {
    pub corners: Vec<Quad>,
    pub ids: Vec<u32>,
    /// Square candidates that did not decode to a dictionary id.
    pub rejected: Vec<Quad>,
}

impl DetectMarkersResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(id, corners)` pairs in detection order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Quad)> + '_ {
        self.ids.iter().copied().zip(self.corners.iter())
    }
}

/// Detector bound to one dictionary and one parameter set.
#[derive(Clone, Debug)]
pub struct ArucoDetector {
    matcher: Matcher,
    params: DetectorParams,
}

impl ArucoDetector {
    pub fn new(dictionary: Dictionary, params: DetectorParams) -> Result<Self, DetectorError> {
        params.validate()?;
        let max_hamming =
            (dictionary.max_correction_bits as f32 * params.error_correction_rate).floor() as u8;
        Ok(Self {
            matcher: Matcher::new(dictionary, max_hamming),
            params,
        })
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.matcher.dictionary()
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Detect markers in a borrowed grayscale buffer.
    pub fn detect_markers(
        &self,
        gray: &GrayImageView<'_>,
    ) -> Result<DetectMarkersResult, DetectorError> {
        let img = image::GrayImage::from_raw(
            gray.width as u32,
            gray.height as u32,
            gray.data.to_vec(),
        )
        .ok_or(DetectorError::InvalidImage {
            width: gray.width,
            height: gray.height,
        })?;
        Ok(self.detect_markers_image(&img))
    }

    /// Detect markers in an `image::GrayImage`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = gray.width(), height = gray.height()))
    )]
    pub fn detect_markers_image(&self, gray: &image::GrayImage) -> DetectMarkersResult {
        let candidates = find_candidates(gray, &self.params);
        let view = GrayImageView {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.as_raw(),
        };

        let dict = self.matcher.dictionary();
        let mut decoder = QuadDecoder::new(
            dict.marker_size,
            self.params.marker_border_bits,
            self.params.min_border_score,
            self.params.detect_inverted_marker,
        );

        let mut out = DetectMarkersResult::default();
        for quad in candidates {
            match decoder.decode(&view, &quad, &self.matcher) {
                Some(m) => {
                    log::trace!(
                        "marker id={} rot={} hamming={} border={:.2}",
                        m.id,
                        m.rotation,
                        m.hamming,
                        m.border_score
                    );
                    out.ids.push(m.id);
                    out.corners.push(m.corners);
                }
                None => out.rejected.push(quad),
            }
        }

        log::debug!(
            "detected {} markers, rejected {} candidates",
            out.ids.len(),
            out.rejected.len()
        );
        out
    }
}
