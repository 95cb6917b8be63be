//! Geometric gates applied to correlation peaks.

use bgr_landmark_core::{box_blur, equalize_hist, median_blur_3x3, GrayImageView};
use log::trace;
use nalgebra::{Point2, Vector2};

use crate::correlate::{match_template_sqdiff_normed, DualTemplateResponse};
use crate::params::{LandmarkParams, ShapeCheckParams, Smoothing};
use crate::template::LandmarkTemplate;
use crate::types::LandmarkCandidate;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Intensity statistics of a template-sized ROI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiStats {
    pub min: u8,
    pub max: u8,
    pub range: u8,
}

/// Min/max over the `dim × dim` window with top-left `top_left`.
///
/// `None` when the window is empty or leaves the frame.
pub fn roi_stats(gray: &GrayImageView<'_>, top_left: Point2<i32>, dim: usize) -> Option<RoiStats> {
    if dim == 0 || top_left.x < 0 || top_left.y < 0 {
        return None;
    }
    let (x, y) = (top_left.x as usize, top_left.y as usize);
    if x + dim > gray.width || y + dim > gray.height {
        return None;
    }
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for row in y..y + dim {
        for &v in &gray.data[row * gray.width + x..][..dim] {
            min = min.min(v);
            max = max.max(v);
        }
    }
    Some(RoiStats {
        min,
        max,
        range: max - min,
    })
}

/// A marker ROI holds two near-black and two bright cells.
#[inline]
pub fn passes_range_gate(stats: &RoiStats, params: &LandmarkParams) -> bool {
    stats.range > params.pixel_range_threshold && stats.min < params.pixel_darkness_threshold
}

/// Normalized squared difference between the (smoothed, equalized) ROI and `template`.
///
/// `None` when the ROI leaves the frame.
pub fn shape_residual(
    gray: &GrayImageView<'_>,
    top_left: Point2<i32>,
    template: &GrayImageView<'_>,
    shape: &ShapeCheckParams,
) -> Option<f32> {
    let roi = gray.roi(top_left.x, top_left.y, template.width, template.height)?;
    let roi = match shape.smoothing {
        Smoothing::None => roi,
        Smoothing::Median3 => median_blur_3x3(&roi.view()),
        Smoothing::Box3 => box_blur(&roi.view(), 3),
    };
    let roi = if shape.equalize {
        equalize_hist(&roi.view())
    } else {
        roi
    };
    Some(match_template_sqdiff_normed(&roi.view(), template))
}

/// Run the range gate, and the shape gate when configured, over every peak.
///
/// Peaks are response-map coordinates; peaks whose ROI is not fully inside
/// the frame are rejected.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(peaks = peaks.len()))
)]
pub fn verify_candidates(
    gray: &GrayImageView<'_>,
    response: &DualTemplateResponse,
    peaks: &[Point2<i32>],
    template: &LandmarkTemplate,
    params: &LandmarkParams,
) -> Vec<LandmarkCandidate> {
    let dim = template.dim();
    let offset = Vector2::new(template.offset() as i32, template.offset() as i32);
    let mut out = Vec::with_capacity(peaks.len());

    for &p in peaks {
        let Some(stats) = roi_stats(gray, p, dim) else {
            trace!("peak {p:?} dropped: ROI outside frame");
            continue;
        };
        if !passes_range_gate(&stats, params) {
            trace!(
                "peak {p:?} dropped: range {} min {}",
                stats.range,
                stats.min
            );
            continue;
        }
        let Some(score) = signed_score_at(response, p) else {
            continue;
        };

        let mut candidate = LandmarkCandidate {
            location: p,
            center: p + offset,
            score,
            pixel_range: stats.range,
            pixel_min: stats.min,
            residual: None,
        };

        if let Some(shape) = &params.shape {
            let tpl = template.for_orientation(candidate.orientation());
            let Some(residual) = shape_residual(gray, p, &tpl, shape) else {
                continue;
            };
            if residual > shape.max_residual {
                trace!("peak {p:?} dropped: shape residual {residual:.3}");
                continue;
            }
            candidate.residual = Some(residual);
        }
        out.push(candidate);
    }
    out
}

fn signed_score_at(response: &DualTemplateResponse, p: Point2<i32>) -> Option<f32> {
    let (w, h) = (response.positive.width, response.positive.height);
    if p.x < 0 || p.y < 0 || p.x as usize >= w || p.y as usize >= h {
        return None;
    }
    Some(response.signed_score(p.x as usize, p.y as usize))
}
