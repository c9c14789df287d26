//! Live camera capture and HighGUI windows through OpenCV.

use aruco_nav::{Display, DisplayError, Frame, FrameSource, FrameSourceError};
use image::RgbImage;
use opencv::core::{AlgorithmHint, Mat, Scalar, CV_8UC3};
use opencv::prelude::*;
use opencv::{highgui, imgproc, videoio};

pub struct CameraSource {
    cap: videoio::VideoCapture,
    next: u64,
}

impl CameraSource {
    /// Open capture device `index`; failure here is the "camera unavailable" case.
    pub fn open(index: i32) -> Result<Self, FrameSourceError> {
        let unavailable = |e: opencv::Error| FrameSourceError::Unavailable(e.to_string());
        let cap = videoio::VideoCapture::new(index, videoio::CAP_ANY).map_err(unavailable)?;
        if !cap.is_opened().map_err(unavailable)? {
            return Err(FrameSourceError::Unavailable(format!(
                "cannot open camera {index}"
            )));
        }
        log::info!("camera {index} opened");
        Ok(Self { cap, next: 0 })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        let read_err = |e: opencv::Error| FrameSourceError::Read(e.to_string());
        let mut bgr = Mat::default();
        if !self.cap.read(&mut bgr).map_err(read_err)? || bgr.empty() {
            return Ok(None);
        }

        let image = mat_to_rgb(&bgr).map_err(read_err)?;
        let frame = Frame::new(self.next, image);
        self.next += 1;
        Ok(Some(frame))
    }
}

fn mat_to_rgb(bgr: &Mat) -> opencv::Result<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;
    let (w, h) = (rgb.cols() as u32, rgb.rows() as u32);
    let bytes = if rgb.is_continuous() {
        rgb.data_bytes()?.to_vec()
    } else {
        rgb.try_clone()?.data_bytes()?.to_vec()
    };
    RgbImage::from_raw(w, h, bytes)
        .ok_or_else(|| opencv::Error::new(opencv::core::StsBadSize, "frame size mismatch"))
}

fn rgb_to_mat(img: &RgbImage) -> opencv::Result<Mat> {
    let mut rgb = Mat::new_rows_cols_with_default(
        img.height() as i32,
        img.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    rgb.data_bytes_mut()?.copy_from_slice(img.as_raw());
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;
    Ok(bgr)
}

/// HighGUI window polled for one millisecond per frame.
#[derive(Default)]
pub struct HighGuiDisplay {
    opened: Vec<String>,
}

impl HighGuiDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `frame` and block until any key is pressed.
    pub fn show_until_key(&mut self, title: &str, frame: &RgbImage) -> Result<(), DisplayError> {
        self.imshow(title, frame)?;
        highgui::wait_key(0).map_err(backend)?;
        Ok(())
    }

    fn imshow(&mut self, title: &str, frame: &RgbImage) -> Result<(), DisplayError> {
        let mat = rgb_to_mat(frame).map_err(backend)?;
        highgui::imshow(title, &mat).map_err(backend)?;
        if !self.opened.iter().any(|t| t == title) {
            self.opened.push(title.to_string());
        }
        Ok(())
    }
}

impl Display for HighGuiDisplay {
    fn show(&mut self, title: &str, frame: &RgbImage) -> Result<Option<char>, DisplayError> {
        self.imshow(title, frame)?;
        let key = highgui::wait_key(1).map_err(backend)?;
        Ok((key >= 0).then(|| char::from((key & 0xFF) as u8)))
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        if !self.opened.is_empty() {
            highgui::destroy_all_windows().map_err(backend)?;
            self.opened.clear();
        }
        Ok(())
    }
}

fn backend(e: opencv::Error) -> DisplayError {
    DisplayError::Backend(e.to_string())
}
