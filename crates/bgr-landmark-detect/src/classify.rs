//! Corner-color classification of verified candidates.

use bgr_landmark_core::BgrImageView;
use log::trace;
use nalgebra::{Point2, Vector2};

use crate::code::{Orientation, PatternCode};
use crate::palette::Hue;
use crate::params::ColorParams;
use crate::types::LandmarkCandidate;

/// Corner cells of the 2×2 grid around a marker centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    UpperLeft,
    UpperRight,
    LowerRight,
    LowerLeft,
}

impl Corner {
    fn direction(self) -> Vector2<i32> {
        match self {
            Corner::UpperLeft => Vector2::new(-1, -1),
            Corner::UpperRight => Vector2::new(1, -1),
            Corner::LowerRight => Vector2::new(1, 1),
            Corner::LowerLeft => Vector2::new(-1, 1),
        }
    }
}

/// `(hue_a, hue_b)` cells for an orientation, in clockwise order from the upper-left.
pub fn colored_corners(orientation: Orientation) -> [Corner; 2] {
    match orientation {
        Orientation::Positive => [Corner::UpperRight, Corner::LowerLeft],
        Orientation::Negative => [Corner::UpperLeft, Corner::LowerRight],
    }
}

pub fn black_corners(orientation: Orientation) -> [Corner; 2] {
    match orientation {
        Orientation::Positive => [Corner::UpperLeft, Corner::LowerRight],
        Orientation::Negative => [Corner::UpperRight, Corner::LowerLeft],
    }
}

/// Distance from the centre to the middle of a quadrant for a template offset.
#[inline]
pub fn corner_distance(offset: usize) -> i32 {
    ((offset + 1) / 2) as i32
}

/// Sampling radius clamped to `[0, 3]` and so the window stays within `offset` of the centre.
#[inline]
pub fn sample_radius_for(offset: usize, radius: usize) -> usize {
    let d = corner_distance(offset) as usize;
    radius.min(3).min(offset.saturating_sub(d))
}

/// Mean BGR over the `(2r + 1)²` window centred on `p`; `None` if it leaves the frame.
pub fn sample_bgr(bgr: &BgrImageView<'_>, p: Point2<i32>, radius: usize) -> Option<[f32; 3]> {
    let r = radius as i32;
    let mut acc = [0f32; 3];
    let mut n = 0f32;
    for y in p.y - r..=p.y + r {
        for x in p.x - r..=p.x + r {
            let px = bgr.get(x, y)?;
            for (a, v) in acc.iter_mut().zip(px) {
                *a += v as f32;
            }
            n += 1.0;
        }
    }
    Some(acc.map(|a| a / n))
}

/// Hue of a colored-corner sample.
///
/// The sample must spread more than `bgr_range_threshold` between its
/// brightest and darkest component. After normalizing by its own min/max
/// exactly one component may sit at or below `hue_epsilon`; that
/// component's index is the hue.
pub fn hue_of(sample: [f32; 3], params: &ColorParams) -> Option<Hue> {
    let lo = sample.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = sample.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = hi - lo;
    if range <= params.bgr_range_threshold as f32 {
        return None;
    }
    let mut dark = sample
        .iter()
        .enumerate()
        .filter(|&(_, &v)| (v - lo) / range <= params.hue_epsilon)
        .map(|(i, _)| i);
    match (dark.next(), dark.next()) {
        (Some(i), None) => Hue::from_min_component(i),
        _ => None,
    }
}

#[inline]
fn brightness(sample: [f32; 3]) -> f32 {
    (sample[0] + sample[1] + sample[2]) / 3.0
}

/// Decode a verified candidate from the color frame.
///
/// `None` when a corner cannot be sampled, a colored corner is not
/// separable or resolves to no single hue, both hues coincide, or (with
/// `check_dark_corners`) a black corner is not in the darkest third of the
/// four samples' brightness range.
pub fn classify_candidate(
    bgr: &BgrImageView<'_>,
    candidate: &LandmarkCandidate,
    offset: usize,
    params: &ColorParams,
) -> Option<PatternCode> {
    let orientation = candidate.orientation();
    let d = corner_distance(offset);
    let radius = sample_radius_for(offset, params.sample_radius);
    let sample_at = |c: Corner| sample_bgr(bgr, candidate.center + c.direction() * d, radius);

    let [ca, cb] = colored_corners(orientation);
    let (sa, sb) = (sample_at(ca)?, sample_at(cb)?);

    if params.check_dark_corners {
        let [ka, kb] = black_corners(orientation);
        let (ka, kb) = (sample_at(ka)?, sample_at(kb)?);
        let levels = [sa, sb, ka, kb].map(brightness);
        let lo = levels.iter().copied().fold(f32::INFINITY, f32::min);
        let hi = levels.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let ceiling = lo + (hi - lo) / 3.0;
        if levels[2] >= ceiling || levels[3] >= ceiling {
            trace!(
                "candidate at {:?}: black corners not dark ({:.0}, {:.0} vs {ceiling:.0})",
                candidate.center,
                levels[2],
                levels[3]
            );
            return None;
        }
    }

    let (Some(a), Some(b)) = (hue_of(sa, params), hue_of(sb, params)) else {
        trace!(
            "candidate at {:?}: hue undetermined {sa:?} {sb:?}",
            candidate.center
        );
        return None;
    };
    let code = PatternCode::from_hues(a, b, orientation);
    if code.is_none() {
        trace!("candidate at {:?}: both corners {a:?}", candidate.center);
    }
    code
}
