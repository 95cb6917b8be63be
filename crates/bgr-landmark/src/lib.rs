//! High-level facade crate for the `bgr-landmark-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, detector and calibration crates
//! - (feature-gated) helpers that take an `image::RgbImage` or a raw BGR
//!   buffer through preprocessing and detection in one call.
//!
//! ## Quickstart
//!
//! ```no_run
//! use bgr_landmark::detect::{detect_landmarks, PreprocessParams};
//! use bgr_landmark::{LandmarkDetector, LandmarkParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame.png")?.to_rgb8();
//! let detector = LandmarkDetector::new(LandmarkParams::default());
//!
//! let result = detect_landmarks(&img, &detector, &PreprocessParams::default());
//! for lm in &result.landmarks {
//!     println!("{:?} -> {}", lm.center, lm.code_value());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `bgr_landmark::core`: pixel buffers, filters, logger.
//! - `bgr_landmark::landmark`: templates, correlation, verification, color decoding.
//! - `bgr_landmark::calib`: 12-code calibration grid acceptance and session records.
//! - `bgr_landmark::detect` (feature `image`): end-to-end helpers from `image::RgbImage`.

pub use bgr_landmark_calib as calib;
pub use bgr_landmark_core as core;
pub use bgr_landmark_detect as landmark;

pub use bgr_landmark_calib::{CalibrationGridValidator, CalibrationRecord, GridLayout};
pub use bgr_landmark_detect::{
    LandmarkDetection, LandmarkDetector, LandmarkInfo, LandmarkParams, PatternCode,
};

#[cfg(feature = "image")]
pub mod detect;
