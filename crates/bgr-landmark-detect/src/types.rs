//! Candidate, landmark and per-frame detection types.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::code::{code_value, Orientation, PatternCode};
use crate::correlate::ResponseMap;

/// A correlation peak that passed the geometric gates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkCandidate {
    /// Top-left of the template placement (response-map coordinates).
    pub location: Point2<i32>,
    /// Marker centre in frame pixels (`location + offset`).
    pub center: Point2<i32>,
    /// `positive - negative` correlation; the sign gives the orientation.
    pub score: f32,
    pub pixel_range: u8,
    pub pixel_min: u8,
    /// Shape residual, when the shape gate ran.
    pub residual: Option<f32>,
}

impl LandmarkCandidate {
    #[inline]
    pub fn orientation(&self) -> Orientation {
        Orientation::from_score(self.score)
    }
}

/// An accepted landmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkInfo {
    pub center: Point2<i32>,
    pub score: f32,
    pub pixel_range: u8,
    pub pixel_min: u8,
    /// `None` when colors were not identified.
    pub code: Option<PatternCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual: Option<f32>,
}

impl LandmarkInfo {
    pub fn from_candidate(candidate: &LandmarkCandidate, code: Option<PatternCode>) -> Self {
        Self {
            center: candidate.center,
            score: candidate.score,
            pixel_range: candidate.pixel_range,
            pixel_min: candidate.pixel_min,
            code,
            residual: candidate.residual,
        }
    }

    /// Code as an integer, `-1` when unknown.
    #[inline]
    pub fn code_value(&self) -> i32 {
        code_value(self.code)
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        Orientation::from_score(self.score)
    }
}

/// Per-frame detector output.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LandmarkDetection {
    /// `|positive - negative|` correlation over the valid region.
    #[serde(skip)]
    pub response: ResponseMap,
    /// Unordered.
    pub landmarks: Vec<LandmarkInfo>,
}

impl LandmarkDetection {
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Landmarks sorted by code, unclassified ones last.
    pub fn sorted_by_code(&self) -> Vec<LandmarkInfo> {
        let mut out = self.landmarks.clone();
        out.sort_by_key(|l| l.code.map_or(u8::MAX as i32 + 1, |c| c.value() as i32));
        out
    }

    /// First landmark carrying `code`.
    pub fn find_code(&self, code: PatternCode) -> Option<&LandmarkInfo> {
        self.landmarks.iter().find(|l| l.code == Some(code))
    }
}
