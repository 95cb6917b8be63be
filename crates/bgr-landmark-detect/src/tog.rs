//! Template matching on image gradients ("template of gradients").
//!
//! A template is built from a gray patch: its x/y derivative images, cropped
//! to the bounding box of the pixels whose gradient magnitude exceeds a
//! fraction of the patch maximum. Matching correlates the frame's derivative
//! images with the template's (normalized cross-correlation, optionally
//! restricted to the mask) and multiplies the x and y responses.

use bgr_landmark_core::GrayImageView;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::correlate::ResponseMap;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default mask threshold, as a fraction of the template's largest gradient magnitude.
pub const TOG_DEFAULT_MAG_THRESHOLD: f32 = 0.1;

/// 3×3 derivative kernel: `[-1, 0, 1]` along the derivative axis times a
/// smoothing column across it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientKernel {
    /// Smoothing `[3, 10, 3]`.
    #[default]
    Scharr,
    /// Smoothing `[1, 2, 1]`.
    Sobel,
}

impl GradientKernel {
    fn smoothing(self) -> [f32; 3] {
        match self {
            GradientKernel::Scharr => [3.0, 10.0, 3.0],
            GradientKernel::Sobel => [1.0, 2.0, 1.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TogParams {
    pub kernel: GradientKernel,
    /// Fraction of the largest template gradient magnitude below which
    /// template pixels are masked out. Clamped to `[0, 1]`.
    pub mag_threshold: f32,
    /// Restrict the correlation to the template mask.
    pub use_mask: bool,
}

impl Default for TogParams {
    fn default() -> Self {
        Self {
            kernel: GradientKernel::Scharr,
            mag_threshold: TOG_DEFAULT_MAG_THRESHOLD,
            use_mask: true,
        }
    }
}

/// Per-pixel x and y derivatives of a gray image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    pub dx: Vec<f32>,
    pub dy: Vec<f32>,
}

impl Gradients {
    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn magnitude(&self, x: usize, y: usize) -> f32 {
        let i = self.idx(x, y);
        self.dx[i].hypot(self.dy[i])
    }
}

/// Derivatives with the nearest valid pixel replicated at the borders.
pub fn gradients(gray: &GrayImageView<'_>, kernel: GradientKernel) -> Gradients {
    let (w, h) = (gray.width, gray.height);
    let s = kernel.smoothing();
    let mut out = Gradients {
        width: w,
        height: h,
        dx: vec![0.0; w * h],
        dy: vec![0.0; w * h],
    };
    for y in 0..h {
        for x in 0..w {
            let (xi, yi) = (x as i32, y as i32);
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (k, sk) in (-1..=1).zip(s) {
                let right = gray.get_clamped(xi + 1, yi + k) as f32;
                let left = gray.get_clamped(xi - 1, yi + k) as f32;
                gx += sk * (right - left);
                let below = gray.get_clamped(xi + k, yi + 1) as f32;
                let above = gray.get_clamped(xi + k, yi - 1) as f32;
                gy += sk * (below - above);
            }
            let i = y * w + x;
            out.dx[i] = gx;
            out.dy[i] = gy;
        }
    }
    out
}

/// Gradient template cropped to its magnitude mask.
#[derive(Clone, Debug, PartialEq)]
pub struct TogTemplate {
    width: usize,
    height: usize,
    dx: Vec<f32>,
    dy: Vec<f32>,
    mask: Vec<f32>,
    origin: Point2<i32>,
    kernel: GradientKernel,
}

impl TogTemplate {
    /// Build a template from a gray patch.
    ///
    /// `None` for an empty or flat patch (no gradient at all). Template
    /// derivatives outside the mask are zeroed.
    pub fn from_image(gray: &GrayImageView<'_>, params: &TogParams) -> Option<Self> {
        if gray.is_empty() {
            return None;
        }
        let g = gradients(gray, params.kernel);
        let mags: Vec<f32> = g.dx.iter().zip(&g.dy).map(|(x, y)| x.hypot(*y)).collect();
        let peak = mags.iter().copied().fold(0.0f32, f32::max);
        if peak <= 0.0 {
            return None;
        }
        let thr = peak * params.mag_threshold.clamp(0.0, 1.0);

        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0, 0);
        for y in 0..g.height {
            for x in 0..g.width {
                if mags[y * g.width + x] > thr {
                    x0 = x0.min(x);
                    y0 = y0.min(y);
                    x1 = x1.max(x);
                    y1 = y1.max(y);
                }
            }
        }
        // the peak itself always passes a threshold below 1
        if x0 > x1 {
            return None;
        }

        let (width, height) = (x1 - x0 + 1, y1 - y0 + 1);
        let n = width * height;
        let mut dx = Vec::with_capacity(n);
        let mut dy = Vec::with_capacity(n);
        let mut mask = Vec::with_capacity(n);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let i = y * g.width + x;
                let m = if mags[i] > thr { 1.0 } else { 0.0 };
                mask.push(m);
                dx.push(g.dx[i] * m);
                dy.push(g.dy[i] * m);
            }
        }
        Some(Self {
            width,
            height,
            dx,
            dy,
            mask,
            origin: Point2::new(x0 as i32, y0 as i32),
            kernel: params.kernel,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Top-left of the cropped box in the source patch.
    pub fn origin(&self) -> Point2<i32> {
        self.origin
    }

    /// Centre of the template relative to a match location.
    pub fn offset(&self) -> Vector2<i32> {
        Vector2::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// `1.0` where the template gradient passed the threshold, else `0.0`.
    pub fn mask(&self) -> &[f32] {
        &self.mask
    }

    pub fn dx(&self) -> &[f32] {
        &self.dx
    }

    pub fn dy(&self) -> &[f32] {
        &self.dy
    }

    pub fn kernel(&self) -> GradientKernel {
        self.kernel
    }
}

/// Gradient template match over the frame.
///
/// Each entry is `ncc(dx) * ncc(dy)` for the template placed with its
/// top-left at that pixel, where `ncc` is `Σ T·I / sqrt(Σ T² · Σ I²)`. With
/// `use_mask` the frame energy `Σ I²` only counts masked pixels. A zero
/// denominator gives 0. The frame derivatives use the template's kernel.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(width = frame.width, height = frame.height))
)]
pub fn match_tog(frame: &GrayImageView<'_>, template: &TogTemplate, use_mask: bool) -> ResponseMap {
    let (tw, th) = (template.width, template.height);
    if frame.width < tw || frame.height < th {
        return ResponseMap::default();
    }
    let g = gradients(frame, template.kernel);
    let (ow, oh) = (frame.width - tw + 1, frame.height - th + 1);

    let energy = |t: &[f32]| t.iter().map(|v| v * v).sum::<f32>();
    let (ex, ey) = (energy(&template.dx), energy(&template.dy));

    let mut out = ResponseMap::new(ow, oh);
    for oy in 0..oh {
        for ox in 0..ow {
            let (mut cx, mut cy, mut ix, mut iy) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
            for ty in 0..th {
                for tx in 0..tw {
                    let t = ty * tw + tx;
                    let i = g.idx(ox + tx, oy + ty);
                    let (fx, fy) = (g.dx[i], g.dy[i]);
                    cx += template.dx[t] * fx;
                    cy += template.dy[t] * fy;
                    let m = if use_mask { template.mask[t] } else { 1.0 };
                    ix += m * fx * fx;
                    iy += m * fy * fy;
                }
            }
            out.data[oy * ow + ox] = ncc(cx, ex, ix) * ncc(cy, ey, iy);
        }
    }
    out
}

#[inline]
fn ncc(cross: f32, t_energy: f32, i_energy: f32) -> f32 {
    let den = (t_energy * i_energy).sqrt();
    if den <= f32::EPSILON {
        0.0
    } else {
        (cross / den).clamp(-1.0, 1.0)
    }
}
