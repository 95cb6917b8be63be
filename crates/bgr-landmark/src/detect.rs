use crate::core::{bgr_to_gray, equalize_hist, gaussian_blur, BgrImage, BgrImageView, GrayImage};
use crate::landmark::{LandmarkDetection, LandmarkDetector, LandmarkInfo};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid BGR image buffer length (expected {expected} bytes, got {got})")]
    InvalidBgrBuffer { expected: usize, got: usize },

    #[error("invalid BGR image dimensions (width={width}, height={height})")]
    InvalidBgrDimensions { width: u32, height: u32 },
}

/// Which signal the detector's gray frame is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrayChannel {
    /// `0.114 B + 0.587 G + 0.299 R`.
    #[default]
    Luma,
    Blue,
    Green,
    Red,
}

/// Gray-frame preprocessing applied before correlation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Histogram-equalize the gray frame (after blurring).
    pub equalize: bool,
    /// Gaussian pre-blur kernel; values below 3 disable blurring.
    pub blur_kernel: usize,
    pub channel: GrayChannel,
}

/// Convert an `image::RgbImage` into the interleaved BGR buffer the detector reads.
pub fn bgr_from_rgb(img: &::image::RgbImage) -> BgrImage {
    let data = img
        .as_raw()
        .chunks_exact(3)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect();
    BgrImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data,
    }
}

/// Luminance of an `image::RgbImage`, with the same weights the detector uses.
pub fn gray_from_rgb(img: &::image::RgbImage) -> GrayImage {
    bgr_to_gray(&bgr_from_rgb(img).view())
}

/// Build the detector's gray frame from a BGR frame.
pub fn preprocess_gray(bgr: &BgrImageView<'_>, params: &PreprocessParams) -> GrayImage {
    let mut gray = match params.channel {
        GrayChannel::Luma => bgr_to_gray(bgr),
        GrayChannel::Blue => bgr.channel(0),
        GrayChannel::Green => bgr.channel(1),
        GrayChannel::Red => bgr.channel(2),
    };
    if params.blur_kernel >= 3 {
        gray = gaussian_blur(&gray.view(), params.blur_kernel);
    }
    if params.equalize {
        gray = equalize_hist(&gray.view());
    }
    gray
}

/// Run the landmark detector end-to-end on an RGB image.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, detector, pre),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn detect_landmarks(
    img: &::image::RgbImage,
    detector: &LandmarkDetector,
    pre: &PreprocessParams,
) -> LandmarkDetection {
    let bgr = bgr_from_rgb(img);
    detect_bgr(&bgr, detector, pre)
}

/// Run the detector on a raw interleaved BGR buffer (`3 * width * height` bytes).
pub fn detect_from_bgr_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    detector: &LandmarkDetector,
    pre: &PreprocessParams,
) -> Result<LandmarkDetection, DetectError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(DetectError::InvalidBgrDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h).and_then(|n| n.checked_mul(3)) else {
        return Err(DetectError::InvalidBgrDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(DetectError::InvalidBgrBuffer {
            expected,
            got: pixels.len(),
        });
    }
    let bgr = BgrImage::from_raw(w, h, pixels.to_vec())
        .ok_or(DetectError::InvalidBgrDimensions { width, height })?;
    Ok(detect_bgr(&bgr, detector, pre))
}

fn detect_bgr(bgr: &BgrImage, detector: &LandmarkDetector, pre: &PreprocessParams) -> LandmarkDetection {
    let gray = preprocess_gray(&bgr.view(), pre);
    detector.detect(&bgr.view(), &gray.view())
}

/// JSON report of one detected frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub image: String,
    pub width: usize,
    pub height: usize,
    /// Largest combined correlation response, `None` for frames smaller than the template.
    pub max_response: Option<f32>,
    pub landmarks: Vec<LandmarkInfo>,
}

impl DetectionReport {
    pub fn new(image: impl Into<String>, width: usize, height: usize, det: LandmarkDetection) -> Self {
        Self {
            image: image.into(),
            width,
            height,
            max_response: det.response.max(),
            landmarks: det.landmarks,
        }
    }
}
