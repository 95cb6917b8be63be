//! Landmark codes: two corner hues plus an orientation, packed into 0..=11.

use serde::{Deserialize, Serialize};

use crate::palette::{BgrColor, GridColorPattern, Hue};

/// Sentinel for "geometrically a marker, photometrically unidentifiable".
pub const UNKNOWN_CODE: i32 = -1;

/// Number of distinct codes (6 ordered hue pairs × 2 orientations).
pub const CODE_COUNT: usize = 12;

const ORIENTATION_STRIDE: u8 = 6;

/// `BASE_CODES[hue_a][hue_b]`; `None` on the diagonal.
const BASE_CODES: [[Option<u8>; 3]; 3] = [
    [None, Some(0), Some(1)],
    [Some(2), None, Some(3)],
    [Some(4), Some(5), None],
];

/// Inverse of [`BASE_CODES`].
const BASE_HUES: [(Hue, Hue); 6] = [
    (Hue::Yellow, Hue::Magenta),
    (Hue::Yellow, Hue::Cyan),
    (Hue::Magenta, Hue::Yellow),
    (Hue::Magenta, Hue::Cyan),
    (Hue::Cyan, Hue::Yellow),
    (Hue::Cyan, Hue::Magenta),
];

/// Which diagonal of the 2×2 grid carries the colored cells.
///
/// `Positive`: colored upper-right and lower-left, black upper-left and lower-right.
/// `Negative`: the quarter-turn of that, colored upper-left and lower-right.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Positive,
    Negative,
}

impl Orientation {
    /// Orientation from the signed positive-minus-negative score. Zero counts as positive.
    #[inline]
    pub fn from_score(score: f32) -> Self {
        if score < 0.0 {
            Orientation::Negative
        } else {
            Orientation::Positive
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Orientation::Positive => 'P',
            Orientation::Negative => 'N',
        }
    }
}

/// Decoded landmark identifier in `0..=11`.
///
/// Codes `0..=5` are positive-orientation hue pairs; `6..=11` the same pairs
/// in the negative orientation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PatternCode(u8);

impl PatternCode {
    /// Encode an ordered hue pair. Identical hues have no code.
    ///
    /// `hue_a` is the first colored cell met going clockwise from the
    /// upper-left, `hue_b` the second.
    pub fn from_hues(hue_a: Hue, hue_b: Hue, orientation: Orientation) -> Option<Self> {
        let base = BASE_CODES[hue_a.index()][hue_b.index()]?;
        Some(Self(match orientation {
            Orientation::Positive => base,
            Orientation::Negative => base + ORIENTATION_STRIDE,
        }))
    }

    pub fn new(value: u8) -> Option<Self> {
        ((value as usize) < CODE_COUNT).then_some(Self(value))
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn base(self) -> u8 {
        self.0 % ORIENTATION_STRIDE
    }

    pub const fn orientation(self) -> Orientation {
        if self.0 < ORIENTATION_STRIDE {
            Orientation::Positive
        } else {
            Orientation::Negative
        }
    }

    /// `(hue_a, hue_b)` encoded by this code.
    pub const fn hues(self) -> (Hue, Hue) {
        BASE_HUES[self.base() as usize]
    }

    /// The printed 2×2 pattern that decodes to this code.
    pub fn to_pattern(self) -> GridColorPattern {
        let (a, b) = self.hues();
        let k = BgrColor::Black;
        match self.orientation() {
            Orientation::Positive => GridColorPattern::new(k, a.color(), k, b.color()),
            Orientation::Negative => GridColorPattern::new(a.color(), k, b.color(), k),
        }
    }

    /// All valid codes in ascending order.
    pub fn all() -> impl Iterator<Item = PatternCode> {
        (0..CODE_COUNT as u8).map(PatternCode)
    }
}

impl TryFrom<u8> for PatternCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PatternCode::new(value).ok_or_else(|| format!("pattern code {value} out of range 0..=11"))
    }
}

impl From<PatternCode> for u8 {
    fn from(code: PatternCode) -> u8 {
        code.0
    }
}

/// Integer form of an optional code, using [`UNKNOWN_CODE`] for `None`.
#[inline]
pub fn code_value(code: Option<PatternCode>) -> i32 {
    code.map_or(UNKNOWN_CODE, |c| c.value() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::HUES;

    #[test]
    fn table_matches_documented_encoding() {
        let expected = [
            (Hue::Yellow, Hue::Magenta, 0),
            (Hue::Yellow, Hue::Cyan, 1),
            (Hue::Magenta, Hue::Yellow, 2),
            (Hue::Magenta, Hue::Cyan, 3),
            (Hue::Cyan, Hue::Yellow, 4),
            (Hue::Cyan, Hue::Magenta, 5),
        ];
        for (a, b, base) in expected {
            let pos = PatternCode::from_hues(a, b, Orientation::Positive).expect("code");
            let neg = PatternCode::from_hues(a, b, Orientation::Negative).expect("code");
            assert_eq!(pos.value(), base);
            assert_eq!(neg.value(), base + 6);
            assert_eq!(pos.hues(), (a, b));
            assert_eq!(neg.hues(), (a, b));
            assert_eq!(neg.orientation(), Orientation::Negative);
        }
    }

    #[test]
    fn identical_hues_have_no_code() {
        for h in HUES {
            assert!(PatternCode::from_hues(h, h, Orientation::Positive).is_none());
            assert!(PatternCode::from_hues(h, h, Orientation::Negative).is_none());
        }
    }

    #[test]
    fn codes_are_exhaustive_and_unique() {
        let mut seen = Vec::new();
        for a in HUES {
            for b in HUES {
                for o in [Orientation::Positive, Orientation::Negative] {
                    if let Some(c) = PatternCode::from_hues(a, b, o) {
                        seen.push(c.value());
                    }
                }
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<u8>>());
    }

    #[test]
    fn negative_pattern_is_ccw_rotation_of_positive() {
        for code in PatternCode::all().take(6) {
            let neg = PatternCode::new(code.value() + 6).expect("code");
            assert_eq!(code.to_pattern().rotated_ccw(), neg.to_pattern());
        }
    }

    #[test]
    fn code_value_uses_sentinel() {
        assert_eq!(code_value(None), UNKNOWN_CODE);
        assert_eq!(code_value(PatternCode::new(11)), 11);
        assert!(PatternCode::new(12).is_none());
        assert_eq!(Orientation::from_score(0.0), Orientation::Positive);
        assert_eq!(Orientation::from_score(-0.5), Orientation::Negative);
    }

    #[test]
    fn serde_rejects_out_of_range() {
        let ok: PatternCode = serde_json::from_str("7").expect("parse");
        assert_eq!(ok.value(), 7);
        assert!(serde_json::from_str::<PatternCode>("12").is_err());
    }
}
