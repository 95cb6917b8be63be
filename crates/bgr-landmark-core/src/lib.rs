//! Core image types and utilities for BGR landmark detection.
//!
//! This crate is intentionally small. It owns the pixel buffers (single
//! channel gray and interleaved BGR), a handful of image filters used for
//! preprocessing, and the logger. It does *not* know anything about
//! landmarks, templates, or codes.

mod filters;
mod image;
mod logger;

pub use filters::{box_blur, box_blur_bgr, equalize_hist, gaussian_blur, median_blur_3x3};
pub use image::{
    bgr_to_gray, rotate90_ccw, rotate90_cw, BgrImage, BgrImageView, GrayImage, GrayImageView,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
