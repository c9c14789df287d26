//! Where annotated frames go, and where the quit key comes from.

use image::RgbImage;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum DisplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("display backend error: {0}")]
    Backend(String),
}

/// A window (or stand-in) that shows frames and reports key presses.
pub trait Display {
    /// Show `frame` and poll the keyboard briefly.
    fn show(&mut self, title: &str, frame: &RgbImage) -> Result<Option<char>, DisplayError>;

    /// Release windows. Called once when the session stops.
    fn close(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

impl<D: Display + ?Sized> Display for &mut D {
    fn show(&mut self, title: &str, frame: &RgbImage) -> Result<Option<char>, DisplayError> {
        (**self).show(title, frame)
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        (**self).close()
    }
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn show(&mut self, title: &str, frame: &RgbImage) -> Result<Option<char>, DisplayError> {
        (**self).show(title, frame)
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        (**self).close()
    }
}

/// No window. Optionally saves every shown frame as `frame_<index>.png`.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    out_dir: Option<PathBuf>,
    shown: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saving_to(dir: impl Into<PathBuf>) -> Result<Self, DisplayError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            out_dir: Some(dir),
            shown: 0,
        })
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, _title: &str, frame: &RgbImage) -> Result<Option<char>, DisplayError> {
        if let Some(dir) = &self.out_dir {
            let path = dir.join(format!("frame_{:05}.png", self.shown));
            frame.save(&path)?;
            log::trace!("saved {}", path.display());
        }
        self.shown += 1;
        Ok(None)
    }
}
