//! Rendering 2×2 patterns into small matching templates.

use std::cmp::Ordering;

use bgr_landmark_core::{bgr_to_gray, rotate90_ccw, BgrImage, GrayImage, GrayImageView};

use crate::code::Orientation;
use crate::palette::GridColorPattern;

pub const MIN_TEMPLATE_DIM: usize = 7;
pub const MAX_TEMPLATE_DIM: usize = 15;

/// Round an even dimension up to odd and clamp to the supported template range.
#[inline]
pub fn clamp_template_dim(dim: usize) -> usize {
    (dim | 1).clamp(MIN_TEMPLATE_DIM, MAX_TEMPLATE_DIM)
}

/// Render `pattern` into a `dim × dim` BGR image (`dim` rounded up to odd, at least 3).
///
/// With `h = dim / 2` each quadrant is an `h × h` block. Row and column `h`
/// are the seams: every seam pixel holds the mean of the two quadrants it
/// separates and the centre pixel the mean of all four, which mimics the
/// blur a camera puts on a printed corner.
pub fn render_grid_pattern(pattern: &GridColorPattern, dim: usize) -> BgrImage {
    let dim = (dim | 1).max(3);
    let h = dim / 2;
    let [ul, ur, lr, ll] = pattern.clockwise().map(|c| c.bgr());
    let center = mean4(ul, ur, lr, ll);

    let mut img = BgrImage::new(dim, dim);
    for y in 0..dim {
        for x in 0..dim {
            let px = match (x.cmp(&h), y.cmp(&h)) {
                (Ordering::Less, Ordering::Less) => ul,
                (Ordering::Greater, Ordering::Less) => ur,
                (Ordering::Greater, Ordering::Greater) => lr,
                (Ordering::Less, Ordering::Greater) => ll,
                (Ordering::Equal, Ordering::Less) => mean2(ul, ur),
                (Ordering::Greater, Ordering::Equal) => mean2(ur, lr),
                (Ordering::Equal, Ordering::Greater) => mean2(lr, ll),
                (Ordering::Less, Ordering::Equal) => mean2(ll, ul),
                (Ordering::Equal, Ordering::Equal) => center,
            };
            img.set(x, y, px);
        }
    }
    img
}

fn mean2(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    std::array::from_fn(|i| ((a[i] as u16 + b[i] as u16) / 2) as u8)
}

fn mean4(a: [u8; 3], b: [u8; 3], c: [u8; 3], d: [u8; 3]) -> [u8; 3] {
    std::array::from_fn(|i| ((a[i] as u16 + b[i] as u16 + c[i] as u16 + d[i] as u16) / 4) as u8)
}

/// Immutable template set built once per detector.
///
/// The negative gray template is the positive one turned a quarter turn
/// counter-clockwise. For a black/white checker corner that is exactly the
/// other diagonal layout, so correlating against both separates the two.
#[derive(Clone, Debug)]
pub struct LandmarkTemplate {
    pattern: GridColorPattern,
    dim: usize,
    bgr: BgrImage,
    gray_positive: GrayImage,
    gray_negative: GrayImage,
}

impl LandmarkTemplate {
    /// Build the templates; `dim` goes through [`clamp_template_dim`].
    pub fn new(pattern: GridColorPattern, dim: usize) -> Self {
        let dim = clamp_template_dim(dim);
        let bgr = render_grid_pattern(&pattern, dim);
        let gray_positive = bgr_to_gray(&bgr.view());
        let gray_negative = rotate90_ccw(&gray_positive.view());
        Self {
            pattern,
            dim,
            bgr,
            gray_positive,
            gray_negative,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Half-width; adds to a top-left match location to give the marker centre.
    #[inline]
    pub fn offset(&self) -> usize {
        self.dim / 2
    }

    #[inline]
    pub fn pattern(&self) -> &GridColorPattern {
        &self.pattern
    }

    #[inline]
    pub fn bgr(&self) -> &BgrImage {
        &self.bgr
    }

    #[inline]
    pub fn positive(&self) -> GrayImageView<'_> {
        self.gray_positive.view()
    }

    #[inline]
    pub fn negative(&self) -> GrayImageView<'_> {
        self.gray_negative.view()
    }

    pub fn for_orientation(&self, orientation: Orientation) -> GrayImageView<'_> {
        match orientation {
            Orientation::Positive => self.positive(),
            Orientation::Negative => self.negative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BW_NEGATIVE, BW_POSITIVE};
    use crate::code::PatternCode;
    use crate::palette::BgrColor;
    use bgr_landmark_core::rotate90_cw;

    #[test]
    fn dimension_is_clamped_and_odd() {
        assert_eq!(clamp_template_dim(0), 7);
        assert_eq!(clamp_template_dim(8), 9);
        assert_eq!(clamp_template_dim(11), 11);
        assert_eq!(clamp_template_dim(40), 15);
        let t = LandmarkTemplate::new(BW_POSITIVE, 4);
        assert_eq!(t.dim(), 7);
        assert_eq!(t.offset(), 3);
        assert_eq!(t.positive().width, 7);
    }

    #[test]
    fn seams_hold_pairwise_and_center_means() {
        let img = render_grid_pattern(&BW_POSITIVE, 7);
        assert_eq!(img.get(0, 0), Some([0, 0, 0]));
        assert_eq!(img.get(6, 0), Some([255, 255, 255]));
        assert_eq!(img.get(3, 0), Some([127, 127, 127]));
        assert_eq!(img.get(0, 3), Some([127, 127, 127]));
        assert_eq!(img.get(3, 3), Some([127, 127, 127]));
        assert_eq!(img.get(6, 6), Some([0, 0, 0]));

        let colored = render_grid_pattern(
            &GridColorPattern::new(
                BgrColor::Black,
                BgrColor::Yellow,
                BgrColor::Black,
                BgrColor::Cyan,
            ),
            9,
        );
        // seam between upper-right yellow and lower-right black
        assert_eq!(colored.get(6, 4), Some([0, 127, 127]));
        assert_eq!(colored.get(4, 4), Some([63, 127, 63]));
    }

    #[test]
    fn negative_is_quarter_turn_of_positive() {
        for dim in [7, 9, 11, 13, 15] {
            for code in PatternCode::all() {
                let t = LandmarkTemplate::new(code.to_pattern(), dim);
                let rotated = rotate90_ccw(&t.positive());
                assert_eq!(rotated.view().data, t.negative().data);
                let back = rotate90_cw(&t.negative());
                assert_eq!(back.view().data, t.positive().data);
            }
        }
    }

    #[test]
    fn bw_negative_template_matches_rendered_bw_negative() {
        let t = LandmarkTemplate::new(BW_POSITIVE, 11);
        let rendered = bgr_to_gray(&render_grid_pattern(&BW_NEGATIVE, 11).view());
        assert_eq!(t.negative().data, rendered.data.as_slice());
        assert_ne!(t.positive().data, t.negative().data);
    }
}
