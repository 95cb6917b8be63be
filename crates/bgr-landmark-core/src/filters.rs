//! Small image filters used for preprocessing and for the shape gate.
//!
//! All filters replicate the nearest valid pixel at the borders.

use crate::{BgrImage, BgrImageView, GrayImage, GrayImageView};

/// 3×3 median filter.
pub fn median_blur_3x3(src: &GrayImageView<'_>) -> GrayImage {
    if src.is_empty() {
        return src.to_owned_image();
    }
    GrayImage::from_fn(src.width, src.height, |x, y| {
        let (x, y) = (x as i32, y as i32);
        let mut win = [0u8; 9];
        let mut n = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                win[n] = src.get_clamped(x + dx, y + dy);
                n += 1;
            }
        }
        win.sort_unstable();
        win[4]
    })
}

/// Normalized box filter with an odd `k × k` kernel. `k < 3` returns a copy.
pub fn box_blur(src: &GrayImageView<'_>, k: usize) -> GrayImage {
    if k < 3 || src.is_empty() {
        return src.to_owned_image();
    }
    let kernel = vec![1.0f32 / (k | 1) as f32; k | 1];
    separable(src, &kernel)
}

/// Box filter applied to each BGR channel independently.
pub fn box_blur_bgr(src: &BgrImageView<'_>, k: usize) -> BgrImage {
    let mut out = BgrImage::new(src.width, src.height);
    for c in 0..3 {
        let chan = src.channel(c);
        let blurred = box_blur(&chan.view(), k);
        for (i, v) in blurred.data.iter().enumerate() {
            out.data[3 * i + c] = *v;
        }
    }
    out
}

/// Gaussian blur with an odd kernel size clamped to `[3, 35]`.
///
/// Sigma follows the kernel size the same way the common
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` rule does.
pub fn gaussian_blur(src: &GrayImageView<'_>, k: usize) -> GrayImage {
    if src.is_empty() {
        return src.to_owned_image();
    }
    let k = (k.clamp(3, 35)) | 1;
    let sigma = 0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (k / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    separable(src, &kernel)
}

/// Histogram equalization (CDF remap). A constant image is returned unchanged.
pub fn equalize_hist(src: &GrayImageView<'_>) -> GrayImage {
    let total = src.data.len();
    let mut hist = [0usize; 256];
    for &v in src.data {
        hist[v as usize] += 1;
    }

    let Some(first) = hist.iter().position(|&h| h > 0) else {
        return src.to_owned_image();
    };
    if hist[first] == total {
        return src.to_owned_image();
    }

    let scale = 255.0 / (total - hist[first]) as f32;
    let mut lut = [0u8; 256];
    let mut acc = 0usize;
    for (v, &h) in hist.iter().enumerate().skip(first + 1) {
        acc += h;
        lut[v] = (acc as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }

    GrayImage {
        width: src.width,
        height: src.height,
        data: src.data.iter().map(|&v| lut[v as usize]).collect(),
    }
}

fn separable(src: &GrayImageView<'_>, kernel: &[f32]) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let half = (kernel.len() / 2) as i32;

    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, wk) in kernel.iter().enumerate() {
                acc += wk * src.get_clamped(x as i32 + i as i32 - half, y as i32) as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0.0;
        for (i, wk) in kernel.iter().enumerate() {
            let yy = (y as i32 + i as i32 - half).clamp(0, h as i32 - 1) as usize;
            acc += wk * tmp[yy * w + x];
        }
        acc.round().clamp(0.0, 255.0) as u8
    })
}
