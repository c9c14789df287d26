use aruco_nav::markers::{builtins, generate_marker_image, ArucoDetector, DetectorParams};
use aruco_nav::{
    Display, DisplayError, Frame, FrameSource, FrameSourceError, Guidance, HeadlessDisplay,
    ImageSequenceSource, ScanMode, ScanSession, SessionConfig, SessionError, StopReason,
};
use image::{imageops, GrayImage, Luma, RgbImage};
use std::collections::VecDeque;

/// Frames handed out from memory; `fail_after` injects a read failure.
struct MemorySource {
    frames: VecDeque<RgbImage>,
    fail_after: Option<usize>,
    served: usize,
}

impl MemorySource {
    fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into(),
            fail_after: None,
            served: 0,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        if self.fail_after == Some(self.served) {
            return Err(FrameSourceError::Read("camera unplugged".to_string()));
        }
        let Some(image) = self.frames.pop_front() else {
            return Ok(None);
        };
        self.served += 1;
        Ok(Some(Frame::new(99, image)))
    }
}

/// Replays one key per shown frame.
struct ScriptedKeys {
    keys: VecDeque<Option<char>>,
    titles: Vec<String>,
}

impl Display for ScriptedKeys {
    fn show(&mut self, title: &str, _frame: &RgbImage) -> Result<Option<char>, DisplayError> {
        self.titles.push(title.to_string());
        Ok(self.keys.pop_front().flatten())
    }
}

/// Fails on every `show` and counts `close` calls.
#[derive(Default)]
struct BrokenWindow {
    closed: usize,
}

impl Display for BrokenWindow {
    fn show(&mut self, _title: &str, _frame: &RgbImage) -> Result<Option<char>, DisplayError> {
        Err(DisplayError::Backend("window lost".to_string()))
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        self.closed += 1;
        Ok(())
    }
}

fn frame_with_marker(width: u32, height: u32, id: u32, side: usize, x0: i64, y0: i64) -> RgbImage {
    let m = generate_marker_image(&builtins::DICT_6X6_250, id, side, 1).expect("render");
    let marker = GrayImage::from_raw(m.width as u32, m.height as u32, m.data).expect("buffer");
    let mut gray = GrayImage::from_pixel(width, height, Luma([255]));
    imageops::overlay(&mut gray, &marker, x0, y0);
    image::DynamicImage::ImageLuma8(gray).to_rgb8()
}

fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]))
}

fn detector() -> ArucoDetector {
    ArucoDetector::new(builtins::DICT_6X6_250, DetectorParams::default()).expect("detector")
}

#[test]
fn markers_mode_runs_to_end_of_stream() {
    let frames = vec![
        frame_with_marker(320, 240, 42, 120, 100, 60),
        blank(320, 240),
        frame_with_marker(320, 240, 7, 100, 20, 20),
    ];
    let mut out = Vec::new();
    let session = ScanSession::new(
        MemorySource::new(frames),
        HeadlessDisplay::new(),
        &mut out,
        detector(),
        SessionConfig::new(ScanMode::Markers),
    );
    let summary = session.run().expect("run");

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.frames_with_markers, 2);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);

    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text.matches("Markers found in this frame:").count(), 2);
    assert!(text.contains("{id: 42, x: 15"), "{text}");
    assert!(text.contains("{id: 7, "));
    assert!(text.contains(&"-".repeat(40)));
}

#[test]
fn quit_key_stops_before_the_stream_ends() {
    let frames = vec![blank(64, 48), blank(64, 48), blank(64, 48)];
    let mut display = ScriptedKeys {
        keys: vec![Some('x'), Some('q')].into(),
        titles: Vec::new(),
    };
    let mut out = Vec::new();
    let summary = ScanSession::new(
        MemorySource::new(frames),
        &mut display,
        &mut out,
        detector(),
        SessionConfig::new(ScanMode::Markers),
    )
    .run()
    .expect("run");

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.stop_reason, StopReason::QuitKey);
    assert_eq!(display.titles, vec!["ArUco multi-marker detector"; 2]);
}

#[test]
fn guidance_ignores_the_scanner_quit_key() {
    let frames = vec![blank(64, 48), blank(64, 48)];
    let mut display = ScriptedKeys {
        keys: vec![Some('q'), Some('q')].into(),
        titles: Vec::new(),
    };
    let mut out = Vec::new();
    let summary = ScanSession::new(
        MemorySource::new(frames),
        &mut display,
        &mut out,
        detector(),
        SessionConfig::new(ScanMode::Guidance),
    )
    .run()
    .expect("run");

    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(
        text.matches("Instruction: No markers detected. Searching...").count(),
        2
    );
    assert!(text.ends_with("Could not receive a frame. Exiting...\n"));
}

#[test]
fn display_failure_still_closes_the_display() {
    let mut display = BrokenWindow::default();
    let result = ScanSession::new(
        MemorySource::new(vec![blank(32, 32), blank(32, 32)]),
        &mut display,
        std::io::sink(),
        detector(),
        SessionConfig::new(ScanMode::Markers),
    )
    .run();

    assert!(matches!(
        result,
        Err(SessionError::Display(DisplayError::Backend(_)))
    ));
    assert_eq!(display.closed, 1);
}

#[test]
fn read_failure_is_a_normal_stop() {
    let mut source = MemorySource::new(vec![blank(32, 32), blank(32, 32), blank(32, 32)]);
    source.fail_after = Some(1);
    let mut out = Vec::new();
    let summary = ScanSession::new(
        source,
        HeadlessDisplay::new(),
        &mut out,
        detector(),
        SessionConfig::new(ScanMode::Markers),
    )
    .run()
    .expect("run");

    assert_eq!(summary.frames, 1);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
}

#[test]
fn guidance_steers_toward_a_marker_on_the_left() {
    let frame = frame_with_marker(800, 300, 3, 80, 10, 100);
    let mut config = SessionConfig::new(ScanMode::Guidance);
    config.json_lines = true;

    let mut out = Vec::new();
    ScanSession::new(
        MemorySource::new(vec![frame]),
        HeadlessDisplay::new(),
        &mut out,
        detector(),
        config,
    )
    .run()
    .expect("run");

    let line = String::from_utf8(out).expect("utf8");
    let report: serde_json::Value = serde_json::from_str(line.trim()).expect("json line");
    assert_eq!(report["frame"], 0);
    assert_eq!(report["width"], 800);
    assert_eq!(report["markers"][0]["id"], 3);
    assert_eq!(report["guidance"]["direction"], "left");
}

#[test]
fn process_annotates_in_place() {
    let session = ScanSession::new(
        MemorySource::new(Vec::new()),
        HeadlessDisplay::new(),
        std::io::sink(),
        detector(),
        SessionConfig::new(ScanMode::Guidance),
    );
    let mut image = frame_with_marker(640, 480, 11, 160, 240, 160);
    let before = image.clone();
    let report = session.process(5, &mut image);

    assert_eq!(report.frame, 5);
    assert_eq!(report.markers.len(), 1);
    let c = report.markers[0].centroid;
    assert!((318..=320).contains(&c.x) && (238..=240).contains(&c.y), "{c:?}");
    assert_eq!(report.guidance, Some(Guidance::Centered { x: c.x }));
    assert_ne!(image, before);
    assert_eq!(image.get_pixel(c.x as u32, c.y as u32), &image::Rgb([255, 0, 0]));
}

#[test]
fn image_directory_feeds_a_session_and_saves_annotations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let frames_dir = dir.path().join("frames");
    std::fs::create_dir(&frames_dir).expect("mkdir");
    frame_with_marker(320, 240, 1, 100, 40, 40)
        .save(frames_dir.join("000.png"))
        .expect("save");
    blank(320, 240).save(frames_dir.join("001.png")).expect("save");

    let source = ImageSequenceSource::from_dir(&frames_dir).expect("open");
    let annotated = dir.path().join("annotated");
    let display = HeadlessDisplay::saving_to(&annotated).expect("display");
    let summary = ScanSession::new(
        source,
        display,
        std::io::sink(),
        detector(),
        SessionConfig::new(ScanMode::Markers),
    )
    .run()
    .expect("run");

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.frames_with_markers, 1);
    assert!(annotated.join("frame_00000.png").is_file());
    assert!(annotated.join("frame_00001.png").is_file());
}
