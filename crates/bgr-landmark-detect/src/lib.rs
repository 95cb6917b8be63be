//! Color-coded 2×2 landmark detection and decoding.
//!
//! A landmark is a small printed checker corner: two black cells on one
//! diagonal and two colored cells (yellow, magenta or cyan) on the other.
//! Detection runs in four stages on a BGR frame plus a gray frame of the
//! same size:
//!
//! 1. zero-mean normalized correlation against a black/white template and
//!    its quarter-turn ([`match_dual_template`]), peaks of
//!    `|positive - negative|` become candidates ([`local_maxima`]);
//! 2. an intensity range/darkness gate and an optional shape residual gate
//!    ([`verify_candidates`]);
//! 3. corner-color classification into a [`PatternCode`] in `0..=11`
//!    ([`classify_candidate`]);
//! 4. assembly into [`LandmarkInfo`]s by [`LandmarkDetector`].
//!
//! [`match_tog`] is a separate matcher on image gradients, with templates cut
//! from any gray patch ([`TogTemplate`]).
//!
//! ```no_run
//! use bgr_landmark_core::{bgr_to_gray, BgrImage};
//! use bgr_landmark_detect::{LandmarkDetector, LandmarkParams};
//!
//! let frame = BgrImage::new(640, 480);
//! let gray = bgr_to_gray(&frame.view());
//! let detector = LandmarkDetector::new(LandmarkParams::default());
//! for lm in detector.detect(&frame.view(), &gray.view()).landmarks {
//!     println!("{:?} code {}", lm.center, lm.code_value());
//! }
//! ```

mod catalog;
mod classify;
mod code;
mod correlate;
mod detector;
mod observer;
mod palette;
mod params;
mod template;
mod tog;
mod types;
mod verify;

pub use catalog::{
    PatternCatalog, BW_NEGATIVE, BW_NEGATIVE_LABEL, BW_POSITIVE, BW_POSITIVE_LABEL,
};
pub use classify::{
    black_corners, classify_candidate, colored_corners, corner_distance, hue_of, sample_bgr,
    sample_radius_for, Corner,
};
pub use code::{code_value, Orientation, PatternCode, CODE_COUNT, UNKNOWN_CODE};
pub use correlate::{
    local_maxima, match_dual_template, match_template_sqdiff_normed, match_template_zncc,
    DualTemplateResponse, ResponseMap,
};
pub use detector::LandmarkDetector;
pub use observer::{LandmarkObserver, NoopObserver, SampleCollector};
pub use palette::{BgrColor, GridColorPattern, Hue, BGR_COLORS, HUES};
pub use params::{
    ColorParams, DetectionStrategy, LandmarkConfigError, LandmarkParams, ShapeCheckParams,
    Smoothing, PARAMS_VERSION,
};
pub use template::{
    clamp_template_dim, render_grid_pattern, LandmarkTemplate, MAX_TEMPLATE_DIM,
    MIN_TEMPLATE_DIM,
};
pub use tog::{
    gradients, match_tog, GradientKernel, Gradients, TogParams, TogTemplate,
    TOG_DEFAULT_MAG_THRESHOLD,
};
pub use types::{LandmarkCandidate, LandmarkDetection, LandmarkInfo};
pub use verify::{passes_range_gate, roi_stats, shape_residual, verify_candidates, RoiStats};
