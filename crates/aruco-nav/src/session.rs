//! The per-frame scan loop shared by the scanner and the guidance tool.

use crate::annotate::annotate;
use crate::detection::{detections_from, format_detections};
use crate::display::{Display, DisplayError};
use crate::frame::{FrameSource, FrameSourceError};
use crate::guidance::{classify, Guidance, DEFAULT_DEAD_ZONE};
use crate::Detection;
use aruco_nav_markers::ArucoDetector;
use image::RgbImage;
use serde::Serialize;
use std::io::Write;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] FrameSourceError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("console output failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// What a session prints and draws for each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// List every marker in frames that have any.
    Markers,
    /// List markers and print a steering instruction for every frame.
    Guidance,
}

impl ScanMode {
    pub fn window_title(self) -> &'static str {
        match self {
            ScanMode::Markers => "ArUco multi-marker detector",
            ScanMode::Guidance => "ArUco detector - guidance",
        }
    }

    pub fn default_quit_key(self) -> char {
        match self {
            ScanMode::Markers => 'q',
            ScanMode::Guidance => 'a',
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub mode: ScanMode,
    pub quit_key: char,
    /// Only used in [`ScanMode::Guidance`].
    pub dead_zone: u32,
    /// Print one JSON object per frame instead of the text lines.
    pub json_lines: bool,
}

impl SessionConfig {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            quit_key: mode.default_quit_key(),
            dead_zone: DEFAULT_DEAD_ZONE,
            json_lines: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The source ran out of frames or failed to deliver one.
    EndOfStream,
    /// The quit key was pressed on the display.
    QuitKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub frames_with_markers: u64,
    pub stop_reason: StopReason,
}

/// Everything computed for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub width: u32,
    pub height: u32,
    pub markers: Vec<Detection>,
    /// Present in guidance mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<Guidance>,
}

/// Runs detection on frames from `S`, shows them on `D` and writes text to `W`.
pub struct ScanSession<S, D, W> {
    source: S,
    display: D,
    out: W,
    detector: ArucoDetector,
    config: SessionConfig,
}

impl<S: FrameSource, D: Display, W: Write> ScanSession<S, D, W> {
    pub fn new(source: S, display: D, out: W, detector: ArucoDetector, config: SessionConfig) -> Self {
        Self {
            source,
            display,
            out,
            detector,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Loop until the source ends or the quit key is pressed.
    ///
    /// The display is closed on every exit path, including errors. The source
    /// is dropped when this returns.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(mode = ?self.config.mode))
    )]
    pub fn run(mut self) -> Result<SessionSummary, SessionError> {
        let outcome = self.drive();
        let closed = self.display.close();
        let summary = outcome?;
        closed?;
        Ok(summary)
    }

    fn drive(&mut self) -> Result<SessionSummary, SessionError> {
        let mut frames = 0u64;
        let mut frames_with_markers = 0u64;

        let stop_reason = loop {
            let mut frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("end of frame stream after {frames} frames");
                    break StopReason::EndOfStream;
                }
                Err(err) => {
                    log::warn!("stopping: {err}");
                    break StopReason::EndOfStream;
                }
            };
            frame.index = frames;
            frames += 1;

            let report = self.process(frame.index, &mut frame.image);
            if !report.markers.is_empty() {
                frames_with_markers += 1;
            }
            self.emit(&report)?;

            let key = self.display.show(self.config.mode.window_title(), &frame.image)?;
            if key == Some(self.config.quit_key) {
                log::info!("quit key '{}' pressed", self.config.quit_key);
                break StopReason::QuitKey;
            }
        };

        if stop_reason == StopReason::EndOfStream
            && self.config.mode == ScanMode::Guidance
            && !self.config.json_lines
        {
            writeln!(self.out, "Could not receive a frame. Exiting...")?;
        }
        self.out.flush()?;

        Ok(SessionSummary {
            frames,
            frames_with_markers,
            stop_reason,
        })
    }

    /// Detect, annotate in place and classify one frame.
    pub fn process(&self, index: u64, image: &mut RgbImage) -> FrameReport {
        let gray = image::imageops::grayscale(image);
        let result = self.detector.detect_markers_image(&gray);
        let markers = detections_from(&result);
        annotate(image, &result, &markers, self.config.mode);

        let guidance = match self.config.mode {
            ScanMode::Markers => None,
            ScanMode::Guidance => Some(
                classify(image.width(), &markers, self.config.dead_zone)
                    .unwrap_or(Guidance::Searching),
            ),
        };

        FrameReport {
            frame: index,
            width: image.width(),
            height: image.height(),
            markers,
            guidance,
        }
    }

    fn emit(&mut self, report: &FrameReport) -> Result<(), SessionError> {
        if self.config.json_lines {
            serde_json::to_writer(&mut self.out, report)?;
            writeln!(self.out)?;
            return Ok(());
        }
        write_report(&mut self.out, report, self.config.mode)?;
        Ok(())
    }
}

/// Human-readable lines for one frame.
pub fn write_report(out: &mut impl Write, report: &FrameReport, mode: ScanMode) -> std::io::Result<()> {
    let list = format_detections(&report.markers);
    match mode {
        ScanMode::Markers => {
            if report.markers.is_empty() {
                return Ok(());
            }
            writeln!(out, "Markers found in this frame:")?;
            writeln!(out, "{list}")?;
            writeln!(out, "{}", "-".repeat(40))?;
        }
        ScanMode::Guidance => {
            let guidance = report.guidance.unwrap_or(Guidance::Searching);
            if report.markers.is_empty() {
                writeln!(out, "{guidance}")?;
                return Ok(());
            }
            writeln!(out)?;
            writeln!(out, "--- Detected marker information ---")?;
            writeln!(out, "Marker list: {list}")?;
            writeln!(out, "{guidance}")?;
            writeln!(out)?;
        }
    }
    Ok(())
}
