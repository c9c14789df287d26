//! Frame sources: where the scanner gets its images from.

use image::RgbImage;
use std::path::{Path, PathBuf};

/// File extensions picked up when a directory is used as a frame sequence.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

#[derive(thiserror::Error, Debug)]
pub enum FrameSourceError {
    /// The source could not be opened at all.
    #[error("frame source unavailable: {0}")]
    Unavailable(String),
    /// A frame could not be read or decoded.
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame read failed: {0}")]
    Read(String),
}

/// One color frame. `index` counts frames from zero within a session.
#[derive(Clone, Debug)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Pulls frames from a camera, a file sequence or a test generator.
pub trait FrameSource {
    /// Blocks until the next frame is available. `Ok(None)` ends the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        (**self).next_frame()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        (**self).next_frame()
    }
}

/// Frames decoded one by one from image files.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    /// Use the given files in the given order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self, FrameSourceError> {
        if paths.is_empty() {
            return Err(FrameSourceError::Unavailable(
                "no frame files given".to_string(),
            ));
        }
        Ok(Self { paths, next: 0 })
    }

    /// Every image file in `dir`, sorted by file name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, FrameSourceError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            FrameSourceError::Unavailable(format!("cannot read {}: {e}", dir.display()))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(FrameSourceError::Unavailable(format!(
                "no images in {}",
                dir.display()
            )));
        }
        log::info!("{} frames in {}", paths.len(), dir.display());
        Ok(Self { paths, next: 0 })
    }

    /// A directory expands to its images; anything else is taken as one file.
    pub fn open(inputs: &[PathBuf]) -> Result<Self, FrameSourceError> {
        if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
            return Err(FrameSourceError::Unavailable(format!(
                "{} does not exist",
                missing.display()
            )));
        }
        match inputs {
            [single] if single.is_dir() => Self::from_dir(single),
            _ => Self::from_paths(inputs.to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let index = self.next as u64;
        self.next += 1;

        let image = image::open(path)
            .map_err(|source| FrameSourceError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        log::debug!("frame {index}: {}", path.display());
        Ok(Some(Frame::new(index, image)))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}
