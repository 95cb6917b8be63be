//! Immutable label → pattern table.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::code::PatternCode;
use crate::palette::{BgrColor, GridColorPattern};

/// Black/white detection pattern, colored (white) cells on the upper-right/lower-left diagonal.
pub const BW_POSITIVE: GridColorPattern = GridColorPattern::new(
    BgrColor::Black,
    BgrColor::White,
    BgrColor::Black,
    BgrColor::White,
);

/// [`BW_POSITIVE`] rotated a quarter turn counter-clockwise.
pub const BW_NEGATIVE: GridColorPattern = BW_POSITIVE.rotated_ccw();

pub const BW_POSITIVE_LABEL: &str = "BWP";
pub const BW_NEGATIVE_LABEL: &str = "BWN";

/// Fixed table of named 2×2 patterns.
///
/// Built once and shared by reference; detectors hold an `Arc` to it.
/// Besides the two black/white detection patterns it contains one entry per
/// code, labelled `<hue_a><hue_b><orientation>` (e.g. `YMP` is code 0,
/// `YMN` is code 6).
#[derive(Clone, Debug)]
pub struct PatternCatalog {
    patterns: BTreeMap<String, GridColorPattern>,
    code_labels: Vec<String>,
}

impl PatternCatalog {
    /// Build the built-in catalog.
    pub fn builtin() -> Self {
        let mut patterns = BTreeMap::new();
        patterns.insert(BW_POSITIVE_LABEL.to_string(), BW_POSITIVE);
        patterns.insert(BW_NEGATIVE_LABEL.to_string(), BW_NEGATIVE);

        let mut code_labels = Vec::with_capacity(crate::code::CODE_COUNT);
        for code in PatternCode::all() {
            let label = code_label(code);
            patterns.insert(label.clone(), code.to_pattern());
            code_labels.push(label);
        }

        Self {
            patterns,
            code_labels,
        }
    }

    /// Process-wide shared instance of [`PatternCatalog::builtin`].
    pub fn shared() -> Arc<PatternCatalog> {
        static SHARED: OnceLock<Arc<PatternCatalog>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(PatternCatalog::builtin()))
            .clone()
    }

    pub fn get(&self, label: &str) -> Option<GridColorPattern> {
        self.patterns.get(label).copied()
    }

    pub fn label_for_code(&self, code: PatternCode) -> &str {
        &self.code_labels[code.value() as usize]
    }

    pub fn pattern_for_code(&self, code: PatternCode) -> GridColorPattern {
        code.to_pattern()
    }

    /// Reverse lookup; the first label (alphabetically) whose pattern matches.
    pub fn label_of(&self, pattern: &GridColorPattern) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, p)| *p == pattern)
            .map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GridColorPattern)> {
        self.patterns.iter().map(|(l, p)| (l.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn code_label(code: PatternCode) -> String {
    let (a, b) = code.hues();
    [a.letter(), b.letter(), code.orientation().letter()]
        .iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_detection_and_code_patterns() {
        let cat = PatternCatalog::builtin();
        assert_eq!(cat.len(), 14);
        assert_eq!(cat.get("BWP"), Some(BW_POSITIVE));
        assert_eq!(cat.get("BWN"), Some(BW_NEGATIVE));
        assert_eq!(BW_NEGATIVE.c00, BgrColor::White);
        assert!(cat.get("nope").is_none());
    }

    #[test]
    fn code_labels_round_trip() {
        let cat = PatternCatalog::builtin();
        let first = PatternCode::new(0).expect("code");
        assert_eq!(cat.label_for_code(first), "YMP");
        let last = PatternCode::new(11).expect("code");
        assert_eq!(cat.label_for_code(last), "CMN");
        for code in PatternCode::all() {
            let label = cat.label_for_code(code);
            assert_eq!(cat.get(label), Some(code.to_pattern()));
            assert_eq!(cat.label_of(&code.to_pattern()), Some(label));
        }
    }

    #[test]
    fn shared_is_built_once() {
        let a = PatternCatalog::shared();
        let b = PatternCatalog::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
