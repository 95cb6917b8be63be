//! Detector configuration.

use std::{fs, path::Path};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::catalog::BW_POSITIVE_LABEL;
use crate::template::{clamp_template_dim, MAX_TEMPLATE_DIM, MIN_TEMPLATE_DIM};

pub const PARAMS_VERSION: u32 = 1;

const MIN_PEAK_WINDOW: usize = 3;
const MAX_PEAK_WINDOW: usize = 31;

#[derive(thiserror::Error, Debug)]
pub enum LandmarkConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Smoothing applied to the ROI before the shape residual is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    None,
    #[default]
    Median3,
    Box3,
}

/// Optional second geometric gate: normalized squared difference between
/// the candidate ROI and the template of the candidate's orientation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeCheckParams {
    /// Reject when the residual is above this value. Clamped to `[0, 1]`.
    pub max_residual: f32,
    pub smoothing: Smoothing,
    /// Histogram-equalize the ROI before comparing.
    pub equalize: bool,
}

impl Default for ShapeCheckParams {
    fn default() -> Self {
        Self {
            max_residual: 0.25,
            smoothing: Smoothing::Median3,
            equalize: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorParams {
    /// A colored corner needs `max - min` of its BGR sample above this.
    pub bgr_range_threshold: u8,
    /// Normalized component values at or below this count as "missing".
    /// Clamped to `[0.01, 0.5]`.
    pub hue_epsilon: f32,
    /// Corner samples average a `(2r + 1)²` neighbourhood. Clamped to `[0, 3]`
    /// and further to what fits inside the template (`1` at `template_dim` 7).
    pub sample_radius: usize,
    /// Require the two black corners to be dark relative to the ROI.
    pub check_dark_corners: bool,
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            bgr_range_threshold: 40,
            hue_epsilon: 0.25,
            sample_radius: 1,
            check_dark_corners: true,
        }
    }
}

/// Which gates a detector runs, derived from [`LandmarkParams`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    RangeOnly,
    RangeShape,
    RangeColor,
    RangeShapeColor,
}

impl DetectionStrategy {
    pub fn uses_shape(self) -> bool {
        matches!(self, Self::RangeShape | Self::RangeShapeColor)
    }

    pub fn uses_color(self) -> bool {
        matches!(self, Self::RangeColor | Self::RangeShapeColor)
    }
}

/// Configuration of a [`crate::LandmarkDetector`], fixed for its lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkParams {
    pub version: u32,
    /// Template side in pixels. Rounded up to odd and clamped to `[7, 15]`.
    ///
    /// Markers must appear at least this large in the frame; corner colors
    /// are sampled inside the template footprint around each centre.
    pub template_dim: usize,
    /// Catalog label of the detection pattern.
    pub pattern: String,
    /// Minimum `|positive - negative|` correlation for a peak. Clamped to `[0, 2]`.
    pub corr_threshold: f32,
    /// ROI intensity range must be strictly above this.
    pub pixel_range_threshold: u8,
    /// ROI minimum must be strictly below this.
    pub pixel_darkness_threshold: u8,
    /// Dilation window for peak extraction; `None` uses the template dimension.
    pub peak_window: Option<usize>,
    pub shape: Option<ShapeCheckParams>,
    pub color: ColorParams,
    /// Classify corner colors and drop landmarks that cannot be decoded.
    pub identify_colors: bool,
}

impl Default for LandmarkParams {
    fn default() -> Self {
        Self {
            version: PARAMS_VERSION,
            template_dim: 11,
            pattern: BW_POSITIVE_LABEL.to_string(),
            corr_threshold: 1.0,
            pixel_range_threshold: 64,
            pixel_darkness_threshold: 96,
            peak_window: None,
            shape: None,
            color: ColorParams::default(),
            identify_colors: true,
        }
    }
}

impl LandmarkParams {
    pub fn strategy(&self) -> DetectionStrategy {
        match (self.shape.is_some(), self.identify_colors) {
            (false, false) => DetectionStrategy::RangeOnly,
            (true, false) => DetectionStrategy::RangeShape,
            (false, true) => DetectionStrategy::RangeColor,
            (true, true) => DetectionStrategy::RangeShapeColor,
        }
    }

    /// Resolved dilation window (odd).
    pub fn peak_window(&self) -> usize {
        self.peak_window
            .map(|w| (w | 1).clamp(MIN_PEAK_WINDOW, MAX_PEAK_WINDOW))
            .unwrap_or_else(|| clamp_template_dim(self.template_dim))
    }

    /// Copy with every numeric field clamped into its supported range.
    ///
    /// Out-of-range values are never an error; each adjustment is logged.
    pub fn sanitized(&self) -> Self {
        let mut p = self.clone();

        let dim = clamp_template_dim(p.template_dim);
        if dim != p.template_dim {
            warn!(
                "template_dim {} adjusted to {} (odd, {}..={})",
                p.template_dim, dim, MIN_TEMPLATE_DIM, MAX_TEMPLATE_DIM
            );
            p.template_dim = dim;
        }

        p.corr_threshold = clamp_f32("corr_threshold", p.corr_threshold, 0.0, 2.0);

        if let Some(w) = p.peak_window {
            let clamped = (w | 1).clamp(MIN_PEAK_WINDOW, MAX_PEAK_WINDOW);
            if clamped != w {
                warn!("peak_window {w} adjusted to {clamped}");
                p.peak_window = Some(clamped);
            }
        }

        if let Some(shape) = p.shape.as_mut() {
            shape.max_residual = clamp_f32("shape.max_residual", shape.max_residual, 0.0, 1.0);
        }

        p.color.hue_epsilon = clamp_f32("color.hue_epsilon", p.color.hue_epsilon, 0.01, 0.5);
        if p.color.sample_radius > 3 {
            warn!("color.sample_radius {} adjusted to 3", p.color.sample_radius);
            p.color.sample_radius = 3;
        }

        if p.version != PARAMS_VERSION {
            warn!(
                "config version {} read as version {PARAMS_VERSION}",
                p.version
            );
            p.version = PARAMS_VERSION;
        }
        p
    }

    /// Load a JSON config from disk. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LandmarkConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LandmarkConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn clamp_f32(name: &str, v: f32, lo: f32, hi: f32) -> f32 {
    let c = if v.is_nan() { lo } else { v.clamp(lo, hi) };
    if c != v {
        warn!("{name} {v} adjusted to {c}");
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let p = LandmarkParams::default();
        assert_eq!(p.sanitized(), p);
        assert_eq!(p.strategy(), DetectionStrategy::RangeColor);
        assert_eq!(p.peak_window(), 11);
    }

    #[test]
    fn sanitize_clamps_everything() {
        let p = LandmarkParams {
            version: 0,
            template_dim: 20,
            corr_threshold: 3.5,
            peak_window: Some(100),
            shape: Some(ShapeCheckParams {
                max_residual: -1.0,
                ..Default::default()
            }),
            color: ColorParams {
                hue_epsilon: f32::NAN,
                sample_radius: 9,
                ..Default::default()
            },
            ..Default::default()
        }
        .sanitized();
        assert_eq!(p.version, PARAMS_VERSION);
        assert_eq!(p.template_dim, 15);
        assert_eq!(p.corr_threshold, 2.0);
        assert_eq!(p.peak_window, Some(31));
        assert_eq!(p.shape.as_ref().map(|s| s.max_residual), Some(0.0));
        assert_eq!(p.color.hue_epsilon, 0.01);
        assert_eq!(p.color.sample_radius, 3);
        assert_eq!(p.strategy(), DetectionStrategy::RangeShapeColor);

        let even = LandmarkParams {
            template_dim: 8,
            peak_window: Some(4),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(even.template_dim, 9);
        assert_eq!(even.peak_window(), 5);
    }

    #[test]
    fn strategy_follows_flags() {
        let mut p = LandmarkParams {
            identify_colors: false,
            ..Default::default()
        };
        assert_eq!(p.strategy(), DetectionStrategy::RangeOnly);
        assert!(!p.strategy().uses_color());
        p.shape = Some(ShapeCheckParams::default());
        assert_eq!(p.strategy(), DetectionStrategy::RangeShape);
        assert!(p.strategy().uses_shape());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: LandmarkParams =
            serde_json::from_str(r#"{"template_dim": 9, "shape": {"smoothing": "box3"}}"#)
                .expect("parse");
        assert_eq!(p.template_dim, 9);
        assert_eq!(p.pixel_range_threshold, 64);
        let shape = p.shape.expect("shape");
        assert_eq!(shape.smoothing, Smoothing::Box3);
        assert!(shape.equalize);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.json");
        let p = LandmarkParams {
            corr_threshold: 1.25,
            identify_colors: false,
            ..Default::default()
        };
        p.write_json(&path).expect("write");
        let back = LandmarkParams::load_json(&path).expect("load");
        assert_eq!(back, p);

        assert!(matches!(
            LandmarkParams::load_json(dir.path().join("missing.json")),
            Err(LandmarkConfigError::Io(_))
        ));
    }
}
