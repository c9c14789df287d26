//! Core types shared by the `aruco-nav-*` crates.
//!
//! This crate is small and purely geometric: grayscale image views, a
//! four-point homography, quad helpers and the process logger. It does not
//! depend on any image codec or capture backend.

mod homography;
mod image;
mod logger;
mod quad;

pub use homography::{homography_from_4pt, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, ImageBufferError};
pub use quad::{
    is_convex, mean_corner_distance, min_side_length, order_clockwise, perimeter, Quad,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
