//! Embedded built-in dictionaries.
//!
//! The source of truth lives in `aruco-nav-markers/data/*_CODES.json`; the
//! build script turns every file there into a `Dictionary` constant.
//!
//! `DICT_6X6_250` holds 250 codes of 6×6 bits whose pairwise Hamming distance,
//! over all four rotations, is at least 11 (so up to 5 flipped bits are
//! correctable). Its bit patterns are this crate's own; load OpenCV's table
//! with [`Dictionary::from_json_file`] to read markers printed elsewhere.

#![allow(clippy::unreadable_literal)]

use crate::Dictionary;

include!(concat!(env!("OUT_DIR"), "/builtins.rs"));

/// Dictionary used by the generator and scanners unless told otherwise.
pub const DEFAULT_DICTIONARY: &str = "DICT_6X6_250";
