//! Normalized template correlation and peak extraction.

use bgr_landmark_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::template::LandmarkTemplate;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Dense `f32` response over the valid correlation region.
///
/// Entry `(x, y)` belongs to the template placed with its top-left corner at
/// frame pixel `(x, y)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ResponseMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<f32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.at(x as usize, y as usize))
    }

    /// Largest value, or `None` for an empty map.
    pub fn max(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Summed-area tables of a gray image and of its squares.
struct Integral {
    stride: usize,
    sum: Vec<u64>,
    sq: Vec<u64>,
}

impl Integral {
    fn new(img: &GrayImageView<'_>) -> Self {
        let stride = img.width + 1;
        let mut sum = vec![0u64; stride * (img.height + 1)];
        let mut sq = vec![0u64; stride * (img.height + 1)];
        for y in 0..img.height {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..img.width {
                let v = img.data[y * img.width + x] as u64;
                row_sum += v;
                row_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row_sum;
                sq[i] = sq[i - stride] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    /// `(Σv, Σv²)` over the `k × k` window with top-left `(x, y)`.
    #[inline]
    fn window(&self, x: usize, y: usize, k: usize) -> (u64, u64) {
        let s = self.stride;
        let (a, b) = (y * s + x, y * s + x + k);
        let (c, d) = ((y + k) * s + x, (y + k) * s + x + k);
        (
            self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c],
            self.sq[d] + self.sq[a] - self.sq[b] - self.sq[c],
        )
    }
}

/// Zero-mean normalized cross-correlation of `template` over every valid
/// placement in `frame`.
///
/// Output is `(W - k + 1) × (H - k + 1)` for a `k`-wide template; a frame
/// smaller than the template gives an empty map. Windows (or templates) with
/// no intensity variation score 0.
pub fn match_template_zncc(frame: &GrayImageView<'_>, template: &GrayImageView<'_>) -> ResponseMap {
    let (tw, th) = (template.width, template.height);
    if tw == 0 || th == 0 || frame.width < tw || frame.height < th {
        return ResponseMap::default();
    }
    let out_w = frame.width - tw + 1;
    let out_h = frame.height - th + 1;
    let mut out = ResponseMap::new(out_w, out_h);

    let n = (tw * th) as f64;
    let t_mean = template.data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let t_zero: Vec<f32> = template
        .data
        .iter()
        .map(|&v| (v as f64 - t_mean) as f32)
        .collect();
    let t_energy: f64 = t_zero.iter().map(|&v| (v as f64) * (v as f64)).sum();
    if t_energy <= f64::EPSILON {
        return out;
    }

    // square windows only; the templates built here are always square
    let integral = (tw == th).then(|| Integral::new(frame));
    let n_px = (tw * th) as u64;

    for y in 0..out_h {
        for x in 0..out_w {
            let (s1, s2) = match &integral {
                Some(ii) => ii.window(x, y, tw),
                None => window_sums(frame, x, y, tw, th),
            };
            // n * Σ(v - mean)² computed exactly in integers
            let var_n = n_px * s2 - s1 * s1;
            if var_n == 0 {
                continue;
            }

            let mut num = 0f32;
            for ty in 0..th {
                let row = &frame.data[(y + ty) * frame.width + x..][..tw];
                let trow = &t_zero[ty * tw..][..tw];
                num += row
                    .iter()
                    .zip(trow)
                    .map(|(&p, &t)| p as f32 * t)
                    .sum::<f32>();
            }

            let denom = (t_energy * var_n as f64 / n).sqrt();
            out.data[y * out_w + x] = ((num as f64) / denom).clamp(-1.0, 1.0) as f32;
        }
    }
    out
}

fn window_sums(frame: &GrayImageView<'_>, x: usize, y: usize, w: usize, h: usize) -> (u64, u64) {
    let mut s1 = 0u64;
    let mut s2 = 0u64;
    for yy in y..y + h {
        for &v in &frame.data[yy * frame.width + x..][..w] {
            s1 += v as u64;
            s2 += (v as u64) * (v as u64);
        }
    }
    (s1, s2)
}

/// Normalized sum of squared differences between two equally sized patches:
/// `Σ(t - r)² / sqrt(Σt² · Σr²)`.
///
/// Identical patches score 0. Two all-black patches score 0; a black patch
/// against a non-black one scores 1. Patches of different size score
/// `f32::INFINITY`.
pub fn match_template_sqdiff_normed(roi: &GrayImageView<'_>, template: &GrayImageView<'_>) -> f32 {
    if roi.width != template.width || roi.height != template.height {
        return f32::INFINITY;
    }
    let mut diff = 0f64;
    let mut rr = 0f64;
    let mut tt = 0f64;
    for (&r, &t) in roi.data.iter().zip(template.data) {
        let (r, t) = (r as f64, t as f64);
        diff += (t - r) * (t - r);
        rr += r * r;
        tt += t * t;
    }
    let denom = (rr * tt).sqrt();
    if denom <= f64::EPSILON {
        return if diff <= f64::EPSILON { 0.0 } else { 1.0 };
    }
    (diff / denom) as f32
}

/// Correlation against both orientation templates.
#[derive(Clone, Debug, Default)]
pub struct DualTemplateResponse {
    pub positive: ResponseMap,
    pub negative: ResponseMap,
    /// `|positive - negative|`.
    pub combined: ResponseMap,
}

impl DualTemplateResponse {
    /// `positive - negative` at a response-map location; the sign gives the orientation.
    pub fn signed_score(&self, x: usize, y: usize) -> f32 {
        self.positive.at(x, y) - self.negative.at(x, y)
    }
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, template), fields(width = frame.width, height = frame.height, dim = template.dim()))
)]
pub fn match_dual_template(
    frame: &GrayImageView<'_>,
    template: &LandmarkTemplate,
) -> DualTemplateResponse {
    let positive = match_template_zncc(frame, &template.positive());
    let negative = match_template_zncc(frame, &template.negative());
    let combined = ResponseMap {
        width: positive.width,
        height: positive.height,
        data: positive
            .data
            .iter()
            .zip(&negative.data)
            .map(|(p, n)| (p - n).abs())
            .collect(),
    };
    DualTemplateResponse {
        positive,
        negative,
        combined,
    }
}

/// Points equal to the maximum of their `window × window` neighbourhood and
/// strictly above `threshold`, in raster order.
///
/// Equivalent to comparing the map with its dilation. On a plateau of equal
/// values only the first point in raster order survives, so a flat-topped
/// peak yields one candidate.
pub fn local_maxima(map: &ResponseMap, window: usize, threshold: f32) -> Vec<Point2<i32>> {
    let half = (window.max(1) / 2) as i32;
    let mut peaks = Vec::new();
    for y in 0..map.height as i32 {
        for x in 0..map.width as i32 {
            let v = map.at(x as usize, y as usize);
            if v.is_nan() || v <= threshold {
                continue;
            }
            if is_window_peak(map, x, y, v, half) {
                peaks.push(Point2::new(x, y));
            }
        }
    }
    peaks
}

fn is_window_peak(map: &ResponseMap, x: i32, y: i32, v: f32, half: i32) -> bool {
    for ny in (y - half).max(0)..=(y + half).min(map.height as i32 - 1) {
        for nx in (x - half).max(0)..=(x + half).min(map.width as i32 - 1) {
            let n = map.at(nx as usize, ny as usize);
            if n > v {
                return false;
            }
            let earlier = ny < y || (ny == y && nx < x);
            if n == v && earlier {
                return false;
            }
        }
    }
    true
}
