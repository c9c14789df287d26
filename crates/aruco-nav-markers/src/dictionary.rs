//! Dictionary metadata and packed marker codes.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// Errors produced while loading a dictionary from JSON.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid dictionary JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("marker_size {marker_size} is out of range (1..=8 bits per side)")]
    InvalidMarkerSize { marker_size: usize },
    #[error("dictionary {name:?} has no codes")]
    Empty { name: String },
    #[error("code #{index} ({code:#x}) does not fit in {bits} bits")]
    CodeOutOfRange { index: usize, code: u64, bits: usize },
}

/// A fixed ArUco-style dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    /// Human-readable name (for logging and file names).
    pub name: Cow<'static, str>,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order with **black = 1**.
    pub codes: Cow<'static, [u64]>,
}

#[derive(Serialize, Deserialize)]
struct DictionaryFile {
    name: String,
    marker_size: usize,
    max_correction_bits: u8,
    codes: Vec<u64>,
}

impl Dictionary {
    /// Dictionary over compile-time tables (used by the embedded built-ins).
    pub const fn from_static(
        name: &'static str,
        marker_size: usize,
        max_correction_bits: u8,
        codes: &'static [u64],
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            marker_size,
            max_correction_bits,
            codes: Cow::Borrowed(codes),
        }
    }

    /// Parse the `*_CODES.json` format used by the embedded dictionaries.
    pub fn from_json_str(text: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = serde_json::from_str(text)?;
        if file.marker_size == 0 || file.marker_size > 8 {
            return Err(DictionaryError::InvalidMarkerSize {
                marker_size: file.marker_size,
            });
        }
        if file.codes.is_empty() {
            return Err(DictionaryError::Empty { name: file.name });
        }
        let bits = file.marker_size * file.marker_size;
        if bits < 64 {
            if let Some((index, &code)) = file
                .codes
                .iter()
                .enumerate()
                .find(|&(_, &c)| c >> bits != 0)
            {
                return Err(DictionaryError::CodeOutOfRange { index, code, bits });
            }
        }

        Ok(Self {
            name: Cow::Owned(file.name),
            marker_size: file.marker_size,
            max_correction_bits: file.max_correction_bits,
            codes: Cow::Owned(file.codes),
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize back into the `*_CODES.json` format.
    pub fn to_json_string(&self) -> Result<String, DictionaryError> {
        let file = DictionaryFile {
            name: self.name.to_string(),
            marker_size: self.marker_size,
            max_correction_bits: self.max_correction_bits,
            codes: self.codes.to_vec(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Number of marker ids in the dictionary.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Packed code for `id`, if the id exists.
    #[inline]
    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }
}
