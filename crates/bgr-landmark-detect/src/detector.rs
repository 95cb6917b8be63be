//! Landmark detector tying the correlation, gating and color stages together.

use std::sync::Arc;

use bgr_landmark_core::{BgrImageView, GrayImageView};
use log::{debug, warn};

use crate::catalog::{PatternCatalog, BW_POSITIVE, BW_POSITIVE_LABEL};
use crate::classify::classify_candidate;
use crate::correlate::{local_maxima, match_dual_template};
use crate::observer::{LandmarkObserver, NoopObserver};
use crate::params::{DetectionStrategy, LandmarkParams};
use crate::template::LandmarkTemplate;
use crate::types::{LandmarkDetection, LandmarkInfo};
use crate::verify::verify_candidates;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Single-frame landmark detector.
///
/// Owns the sanitized parameters and the templates built from them; both
/// stay fixed for the lifetime of the detector, so one instance can serve
/// any number of frames.
#[derive(Clone, Debug)]
pub struct LandmarkDetector {
    params: LandmarkParams,
    strategy: DetectionStrategy,
    template: LandmarkTemplate,
    catalog: Arc<PatternCatalog>,
}

impl LandmarkDetector {
    pub fn new(params: LandmarkParams) -> Self {
        Self::with_catalog(params, PatternCatalog::shared())
    }

    pub fn with_catalog(params: LandmarkParams, catalog: Arc<PatternCatalog>) -> Self {
        let mut params = params.sanitized();
        let pattern = match catalog.get(&params.pattern) {
            Some(p) => p,
            None => {
                warn!(
                    "unknown pattern label {:?}, using {BW_POSITIVE_LABEL}",
                    params.pattern
                );
                params.pattern = BW_POSITIVE_LABEL.to_string();
                BW_POSITIVE
            }
        };
        let template = LandmarkTemplate::new(pattern, params.template_dim);
        let strategy = params.strategy();
        debug!(
            "landmark detector: pattern {} dim {} strategy {strategy:?}",
            params.pattern,
            template.dim()
        );
        Self {
            params,
            strategy,
            template,
            catalog,
        }
    }

    pub fn params(&self) -> &LandmarkParams {
        &self.params
    }

    pub fn template(&self) -> &LandmarkTemplate {
        &self.template
    }

    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    pub fn catalog(&self) -> &Arc<PatternCatalog> {
        &self.catalog
    }

    /// Detect landmarks in a BGR frame and its (possibly preprocessed) gray version.
    ///
    /// Frames of different size yield an empty detection.
    pub fn detect(&self, bgr: &BgrImageView<'_>, gray: &GrayImageView<'_>) -> LandmarkDetection {
        self.detect_with_observer(bgr, gray, &mut NoopObserver)
    }

    /// Like [`LandmarkDetector::detect`], reporting each accepted landmark and
    /// its gray ROI to `observer`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = gray.width, height = gray.height))
    )]
    pub fn detect_with_observer(
        &self,
        bgr: &BgrImageView<'_>,
        gray: &GrayImageView<'_>,
        observer: &mut dyn LandmarkObserver,
    ) -> LandmarkDetection {
        if !bgr.same_size(gray) {
            warn!(
                "frame size mismatch: bgr {}x{} vs gray {}x{}",
                bgr.width, bgr.height, gray.width, gray.height
            );
            return LandmarkDetection::default();
        }

        let response = match_dual_template(gray, &self.template);
        let peaks = local_maxima(
            &response.combined,
            self.params.peak_window(),
            self.params.corr_threshold,
        );
        let candidates = verify_candidates(gray, &response, &peaks, &self.template, &self.params);

        let dim = self.template.dim();
        let mut landmarks = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let code = if self.strategy.uses_color() {
                match classify_candidate(bgr, candidate, self.template.offset(), &self.params.color)
                {
                    Some(code) => Some(code),
                    None => continue,
                }
            } else {
                None
            };

            let info = LandmarkInfo::from_candidate(candidate, code);
            if let Some(roi) = gray.roi(candidate.location.x, candidate.location.y, dim, dim) {
                observer.on_landmark(&info, roi.view());
            }
            landmarks.push(info);
        }

        debug!(
            "{} peaks, {} verified, {} landmarks",
            peaks.len(),
            candidates.len(),
            landmarks.len()
        );

        LandmarkDetection {
            response: response.combined,
            landmarks,
        }
    }
}

impl Default for LandmarkDetector {
    fn default() -> Self {
        Self::new(LandmarkParams::default())
    }
}
