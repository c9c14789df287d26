//! Printable marker images written to disk.

use aruco_nav_core::GrayImage;
use aruco_nav_markers::{builtins, generate_marker_image, Dictionary, DictionaryError, RenderError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("unknown dictionary {0}")]
    UnknownDictionary(String),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which dictionary to draw from.
#[derive(Clone, Debug, PartialEq)]
pub enum DictionarySource {
    Builtin(String),
    File(PathBuf),
}

impl Default for DictionarySource {
    fn default() -> Self {
        DictionarySource::Builtin(builtins::DEFAULT_DICTIONARY.to_string())
    }
}

impl DictionarySource {
    pub fn load(&self) -> Result<Dictionary, GenerateError> {
        match self {
            DictionarySource::Builtin(name) => builtins::builtin_dictionary(name)
                .ok_or_else(|| GenerateError::UnknownDictionary(name.clone())),
            DictionarySource::File(path) => Ok(Dictionary::from_json_file(path)?),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub dictionary: DictionarySource,
    pub id: u32,
    pub side_px: usize,
    pub border_bits: usize,
    pub out_dir: PathBuf,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            dictionary: DictionarySource::default(),
            id: 42,
            side_px: 500,
            border_bits: 1,
            out_dir: PathBuf::from("."),
        }
    }
}

/// Result of [`generate_marker`].
#[derive(Clone, Debug)]
pub struct GeneratedMarker {
    pub id: u32,
    /// Absolute path of the written PNG.
    pub path: PathBuf,
    pub image: GrayImage,
}

/// `aruco_marker_id_<id>.png`
pub fn marker_file_name(id: u32) -> String {
    format!("aruco_marker_id_{id}.png")
}

/// Render the requested marker and write it as an 8-bit grayscale PNG.
pub fn generate_marker(req: &GenerateRequest) -> Result<GeneratedMarker, GenerateError> {
    let dict = req.dictionary.load()?;
    let image = generate_marker_image(&dict, req.id, req.side_px, req.border_bits)?;

    let path = req.out_dir.join(marker_file_name(req.id));
    write_gray_png(&path, &image)?;
    let path = std::path::absolute(&path).map_err(|source| GenerateError::Io {
        path: path.clone(),
        source,
    })?;

    log::info!("wrote {} ({}x{})", path.display(), image.width, image.height);
    Ok(GeneratedMarker {
        id: req.id,
        path,
        image,
    })
}

pub fn write_gray_png(path: &Path, image: &GrayImage) -> Result<(), GenerateError> {
    let io_err = |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width as u32, image.height as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.data)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_classic_generator() {
        let req = GenerateRequest::default();
        assert_eq!(req.id, 42);
        assert_eq!(req.side_px, 500);
        assert_eq!(req.border_bits, 1);
        assert_eq!(
            req.dictionary,
            DictionarySource::Builtin("DICT_6X6_250".to_string())
        );
        assert_eq!(marker_file_name(req.id), "aruco_marker_id_42.png");
    }

    #[test]
    fn unknown_builtin_is_reported() {
        let src = DictionarySource::Builtin("DICT_9X9_1".to_string());
        assert!(matches!(src.load(), Err(GenerateError::UnknownDictionary(_))));
    }

    #[test]
    fn missing_output_directory_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let req = GenerateRequest {
            out_dir: dir.path().join("missing"),
            side_px: 80,
            ..GenerateRequest::default()
        };
        assert!(matches!(
            generate_marker(&req),
            Err(GenerateError::Io { .. })
        ));
    }
}
