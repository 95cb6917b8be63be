//! JSON record of a calibration capture session.

use std::{fs, path::Path};

use bgr_landmark_detect::{LandmarkInfo, CODE_COUNT};
use log::{debug, info, warn};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::grid::{CalibrationGridValidator, GridLayout, GridViolation};

#[derive(thiserror::Error, Debug)]
pub enum CalibIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Accepted frames of one session plus the board's object points.
///
/// `image_points[i]` belongs to `image_files[i]` and is indexed by code, like
/// `object_points`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub image_size: [u32; 2],
    pub layout: GridLayout,
    pub grid_spacing: f32,
    pub object_points: Vec<Point3<f32>>,
    pub image_files: Vec<String>,
    pub image_points: Vec<Vec<Point2<f32>>>,
}

impl CalibrationRecord {
    /// Empty record; object points are `(col, row, 0) * spacing` per code.
    ///
    /// Only codes that exist get object points, so a layout with more cells
    /// than codes is truncated (and can never accept a frame).
    pub fn new(layout: GridLayout, grid_spacing: f32, image_size: [u32; 2]) -> Self {
        if !layout.is_supported() {
            warn!(
                "grid layout {}x{} does not fit {CODE_COUNT} codes; no frame will be accepted",
                layout.cols, layout.rows
            );
        }
        let cells = layout.len().min(CODE_COUNT);
        let object_points = (0..cells)
            .filter_map(|code| layout.cell_of(code as u8))
            .map(|(col, row)| {
                Point3::new(col as f32 * grid_spacing, row as f32 * grid_spacing, 0.0)
            })
            .collect();
        Self {
            image_size,
            layout,
            grid_spacing,
            object_points,
            image_files: Vec::new(),
            image_points: Vec::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.image_files.len()
    }

    /// Validate `landmarks` against the record's layout and append the frame
    /// when it is accepted. A rejected frame leaves the record unchanged.
    pub fn try_add_frame(
        &mut self,
        image_file: impl Into<String>,
        landmarks: &[LandmarkInfo],
    ) -> Result<(), GridViolation> {
        let image_file = image_file.into();
        let validator = CalibrationGridValidator::new(self.layout);
        match validator.validate(landmarks) {
            Ok(points) => {
                debug!("frame {image_file} accepted");
                self.image_files.push(image_file);
                self.image_points.push(points.points);
                Ok(())
            }
            Err(v) => {
                info!("frame {image_file} rejected: {v}");
                Err(v)
            }
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bgr_landmark_detect::PatternCode;

    fn grid_landmarks() -> Vec<LandmarkInfo> {
        PatternCode::all()
            .map(|c| {
                let v = c.value() as i32;
                LandmarkInfo {
                    center: Point2::new(25 + (v % 4) * 50, 25 + (v / 4) * 50),
                    score: 1.9,
                    pixel_range: 220,
                    pixel_min: 0,
                    code: Some(c),
                    residual: None,
                }
            })
            .collect()
    }

    #[test]
    fn object_points_follow_layout() {
        let rec = CalibrationRecord::new(GridLayout::default(), 0.02, [640, 480]);
        assert_eq!(rec.object_points.len(), 12);
        assert_relative_eq!(rec.object_points[0], Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(rec.object_points[7], Point3::new(0.06, 0.02, 0.0));
        assert_relative_eq!(rec.object_points[11], Point3::new(0.06, 0.04, 0.0));
        assert_eq!(rec.frame_count(), 0);
    }

    #[test]
    fn rejected_frames_leave_record_unchanged() {
        let mut rec = CalibrationRecord::new(GridLayout::default(), 1.0, [200, 150]);
        let good = grid_landmarks();
        rec.try_add_frame("a.png", &good).expect("accepted");

        let mut bad = good.clone();
        bad.pop();
        assert!(rec.try_add_frame("b.png", &bad).is_err());

        assert_eq!(rec.frame_count(), 1);
        assert_eq!(rec.image_files, vec!["a.png".to_string()]);
        assert_eq!(rec.image_points[0][5], Point2::new(75.0, 75.0));
    }

    #[test]
    fn oversized_layout_never_accepts_frames() {
        let layout: GridLayout =
            serde_json::from_str(r#"{"cols": 16, "rows": 16}"#).expect("layout");
        let mut rec = CalibrationRecord::new(layout, 1.0, [640, 480]);
        assert_eq!(rec.object_points.len(), 12);
        assert_relative_eq!(rec.object_points[11], Point3::new(11.0, 0.0, 0.0));
        assert!(matches!(
            rec.try_add_frame("a.png", &grid_landmarks()),
            Err(GridViolation::WrongCount { expected: 256, .. })
        ));

        let huge: GridLayout =
            serde_json::from_str(r#"{"cols": 65536, "rows": 65536}"#).expect("layout");
        let mut rec = CalibrationRecord::new(huge, 1.0, [640, 480]);
        assert!(rec.try_add_frame("b.png", &grid_landmarks()).is_err());
        assert_eq!(rec.frame_count(), 0);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("calib.json");
        let mut rec = CalibrationRecord::new(GridLayout::default(), 0.5, [200, 150]);
        rec.try_add_frame("frame_000.png", &grid_landmarks())
            .expect("accepted");
        rec.write_json(&path).expect("write");

        let back = CalibrationRecord::load_json(&path).expect("load");
        assert_eq!(back, rec);

        fs::write(&path, "{ not json").expect("overwrite");
        assert!(matches!(
            CalibrationRecord::load_json(&path),
            Err(CalibIoError::Json(_))
        ));
    }
}
