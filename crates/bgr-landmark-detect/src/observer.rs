//! Per-landmark callbacks.

use bgr_landmark_core::{GrayImage, GrayImageView};

use crate::types::LandmarkInfo;

/// Receives every accepted landmark together with its gray ROI.
pub trait LandmarkObserver {
    fn on_landmark(&mut self, landmark: &LandmarkInfo, roi: GrayImageView<'_>);
}

impl<F> LandmarkObserver for F
where
    F: FnMut(&LandmarkInfo, GrayImageView<'_>),
{
    fn on_landmark(&mut self, landmark: &LandmarkInfo, roi: GrayImageView<'_>) {
        self(landmark, roi)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl LandmarkObserver for NoopObserver {
    fn on_landmark(&mut self, _landmark: &LandmarkInfo, _roi: GrayImageView<'_>) {}
}

/// Collects ROI samples of accepted landmarks, e.g. to build a training set.
///
/// Stops collecting once `limit` samples are held. Not synchronized.
#[derive(Clone, Debug, Default)]
pub struct SampleCollector {
    pub samples: Vec<(LandmarkInfo, GrayImage)>,
    pub limit: Option<usize>,
}

impl SampleCollector {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            samples: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|l| self.samples.len() >= l)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl LandmarkObserver for SampleCollector {
    fn on_landmark(&mut self, landmark: &LandmarkInfo, roi: GrayImageView<'_>) {
        if !self.is_full() {
            self.samples.push((landmark.clone(), roi.to_owned_image()));
        }
    }
}
