//! Saturated BGR colors and 2×2 grid color patterns.

use serde::{Deserialize, Serialize};

/// The 8 colors whose B, G, R components are each either 0 or 255.
///
/// Discriminants encode the components as bits: blue = 4, green = 2, red = 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BgrColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

/// All colors in discriminant order.
pub const BGR_COLORS: [BgrColor; 8] = [
    BgrColor::Black,
    BgrColor::Red,
    BgrColor::Green,
    BgrColor::Yellow,
    BgrColor::Blue,
    BgrColor::Magenta,
    BgrColor::Cyan,
    BgrColor::White,
];

const BGR_TABLE: [[u8; 3]; 8] = [
    [0, 0, 0],
    [0, 0, 255],
    [0, 255, 0],
    [0, 255, 255],
    [255, 0, 0],
    [255, 0, 255],
    [255, 255, 0],
    [255, 255, 255],
];

const INVERSE: [BgrColor; 8] = [
    BgrColor::White,
    BgrColor::Cyan,
    BgrColor::Magenta,
    BgrColor::Blue,
    BgrColor::Yellow,
    BgrColor::Green,
    BgrColor::Red,
    BgrColor::Black,
];

impl BgrColor {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// `[b, g, r]` components.
    #[inline]
    pub const fn bgr(self) -> [u8; 3] {
        BGR_TABLE[self as usize]
    }

    /// Complementary color (every component flipped).
    #[inline]
    pub const fn inverted(self) -> BgrColor {
        INVERSE[self as usize]
    }

    /// Exact reverse lookup of a saturated BGR triple.
    pub fn from_bgr(bgr: [u8; 3]) -> Option<BgrColor> {
        BGR_TABLE
            .iter()
            .position(|&c| c == bgr)
            .map(|i| BGR_COLORS[i])
    }
}

/// The three "bright" corner hues a landmark can carry.
///
/// Each one is white with exactly one BGR component removed; the discriminant
/// is the index of that missing component.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Hue {
    Yellow = 0,
    Magenta = 1,
    Cyan = 2,
}

pub const HUES: [Hue; 3] = [Hue::Yellow, Hue::Magenta, Hue::Cyan];

impl Hue {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn color(self) -> BgrColor {
        match self {
            Hue::Yellow => BgrColor::Yellow,
            Hue::Magenta => BgrColor::Magenta,
            Hue::Cyan => BgrColor::Cyan,
        }
    }

    /// Hue whose single dark component is `component` (0 = B, 1 = G, 2 = R).
    #[inline]
    pub fn from_min_component(component: usize) -> Option<Hue> {
        HUES.get(component).copied()
    }

    pub fn from_color(color: BgrColor) -> Option<Hue> {
        HUES.iter().copied().find(|h| h.color() == color)
    }

    /// One-letter label used by the pattern catalog.
    pub const fn letter(self) -> char {
        match self {
            Hue::Yellow => 'Y',
            Hue::Magenta => 'M',
            Hue::Cyan => 'C',
        }
    }
}

/// Colors of a 2×2 grid, clockwise from the upper-left cell.
///
/// `c00` = upper-left, `c01` = upper-right, `c11` = lower-right, `c10` = lower-left.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct GridColorPattern {
    pub c00: BgrColor,
    pub c01: BgrColor,
    pub c11: BgrColor,
    pub c10: BgrColor,
}

impl GridColorPattern {
    pub const fn new(c00: BgrColor, c01: BgrColor, c11: BgrColor, c10: BgrColor) -> Self {
        Self { c00, c01, c11, c10 }
    }

    /// Cells in clockwise order starting at the upper-left.
    #[inline]
    pub const fn clockwise(&self) -> [BgrColor; 4] {
        [self.c00, self.c01, self.c11, self.c10]
    }

    pub const fn inverted(&self) -> Self {
        Self {
            c00: self.c00.inverted(),
            c01: self.c01.inverted(),
            c11: self.c11.inverted(),
            c10: self.c10.inverted(),
        }
    }

    /// Quarter turn counter-clockwise: the upper-right cell becomes the upper-left one.
    pub const fn rotated_ccw(&self) -> Self {
        Self {
            c00: self.c01,
            c01: self.c11,
            c11: self.c10,
            c10: self.c00,
        }
    }

    /// Non-black cells, clockwise from the upper-left.
    pub fn colored_corners(&self) -> Vec<BgrColor> {
        self.clockwise()
            .into_iter()
            .filter(|&c| c != BgrColor::Black)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_discriminant_bits() {
        for color in BGR_COLORS {
            let i = color.index();
            let expect = [
                if i & 4 != 0 { 255 } else { 0 },
                if i & 2 != 0 { 255 } else { 0 },
                if i & 1 != 0 { 255 } else { 0 },
            ];
            assert_eq!(color.bgr(), expect, "{color:?}");
            assert_eq!(BgrColor::from_bgr(expect), Some(color));
        }
    }

    #[test]
    fn inversion_flips_every_component() {
        for color in BGR_COLORS {
            let inv = color.inverted();
            let sum: Vec<u16> = color
                .bgr()
                .iter()
                .zip(inv.bgr())
                .map(|(&a, b)| a as u16 + b as u16)
                .collect();
            assert_eq!(sum, vec![255, 255, 255]);
            assert_eq!(inv.inverted(), color);
        }
    }

    #[test]
    fn hue_index_is_missing_component() {
        for hue in HUES {
            let bgr = hue.color().bgr();
            assert_eq!(bgr[hue.index()], 0);
            assert_eq!(bgr.iter().filter(|&&v| v == 0).count(), 1);
            assert_eq!(Hue::from_min_component(hue.index()), Some(hue));
            assert_eq!(Hue::from_color(hue.color()), Some(hue));
        }
        assert_eq!(Hue::from_min_component(3), None);
        assert_eq!(Hue::from_color(BgrColor::Red), None);
    }

    #[test]
    fn four_rotations_are_identity() {
        let p = GridColorPattern::new(
            BgrColor::Black,
            BgrColor::Yellow,
            BgrColor::Black,
            BgrColor::Cyan,
        );
        let r = p.rotated_ccw();
        assert_eq!(r.c00, BgrColor::Yellow);
        assert_eq!(r.c11, BgrColor::Cyan);
        assert_eq!(r.rotated_ccw().rotated_ccw().rotated_ccw(), p);
        assert_eq!(p.colored_corners(), vec![BgrColor::Yellow, BgrColor::Cyan]);
        assert_eq!(p.inverted().c00, BgrColor::White);
    }
}
