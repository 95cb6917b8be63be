//! Acceptance check for one frame of the 12-landmark calibration grid.

use std::fmt;

use bgr_landmark_detect::{LandmarkInfo, CODE_COUNT};
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// How codes are laid out on the printed grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrder {
    /// Code `row * cols + col`.
    #[default]
    RowMajor,
    /// Code `col * rows + row`.
    ColumnMajor,
}

/// Printed grid geometry; code `c` sits in exactly one `(col, row)` cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    #[serde(default)]
    pub order: CodeOrder,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cols: 4,
            rows: 3,
            order: CodeOrder::RowMajor,
        }
    }
}

impl GridLayout {
    /// Number of cells, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        usize::try_from(self.cols as u64 * self.rows as u64).unwrap_or(usize::MAX)
    }

    /// Whether every cell can carry a distinct landmark code.
    pub fn is_supported(&self) -> bool {
        !self.is_empty() && self.len() <= CODE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code of a cell; meaningful for [supported](Self::is_supported) layouts.
    pub fn code_at(&self, col: u32, row: u32) -> u8 {
        match self.order {
            CodeOrder::RowMajor => (row as u64 * self.cols as u64 + col as u64) as u8,
            CodeOrder::ColumnMajor => (col as u64 * self.rows as u64 + row as u64) as u8,
        }
    }

    /// `(col, row)` of `code`, `None` outside the grid.
    pub fn cell_of(&self, code: u8) -> Option<(u32, u32)> {
        let c = code as u32;
        if c as usize >= self.len() {
            return None;
        }
        Some(match self.order {
            CodeOrder::RowMajor => (c % self.cols, c / self.cols),
            CodeOrder::ColumnMajor => (c / self.rows, c % self.rows),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}

/// Why a frame was not accepted.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridViolation {
    #[error("expected {expected} landmarks, found {found}")]
    WrongCount { expected: usize, found: usize },
    #[error("landmark at {center:?} has no code")]
    Unclassified { center: [i32; 2] },
    #[error("code {code} detected more than once")]
    DuplicateCode { code: u8 },
    #[error("code {code} not detected")]
    MissingCode { code: u8 },
    #[error("{axis} does not increase from code {from} to code {to}")]
    NotMonotonic { axis: Axis, from: u8, to: u8 },
}

/// Image points of an accepted frame, indexed by code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridPoints {
    pub layout: GridLayout,
    pub points: Vec<Point2<f32>>,
}

impl GridPoints {
    pub fn point(&self, code: u8) -> Option<Point2<f32>> {
        self.points.get(code as usize).copied()
    }
}

/// Checks that a detected set of landmarks forms the expected code grid.
#[derive(Clone, Debug, Default)]
pub struct CalibrationGridValidator {
    layout: GridLayout,
}

impl CalibrationGridValidator {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Validate one frame's landmarks (given in any order).
    ///
    /// A layout with no cells or more cells than codes rejects every frame
    /// with [`GridViolation::WrongCount`].
    ///
    /// Checks, in order: count, every landmark classified, no duplicate code,
    /// every grid code present, x strictly increasing along each row, y
    /// strictly increasing down each column.
    pub fn validate(&self, landmarks: &[LandmarkInfo]) -> Result<GridPoints, GridViolation> {
        let expected = self.layout.len();
        if !self.layout.is_supported() || landmarks.len() != expected {
            return Err(GridViolation::WrongCount {
                expected,
                found: landmarks.len(),
            });
        }

        let mut by_code: Vec<Option<Point2<i32>>> = vec![None; CODE_COUNT];
        for lm in landmarks {
            let Some(code) = lm.code else {
                return Err(GridViolation::Unclassified {
                    center: [lm.center.x, lm.center.y],
                });
            };
            let slot = &mut by_code[code.value() as usize];
            if slot.is_some() {
                return Err(GridViolation::DuplicateCode { code: code.value() });
            }
            *slot = Some(lm.center);
        }

        let mut points = Vec::with_capacity(expected);
        for (code, p) in by_code.iter().take(expected).enumerate() {
            match p {
                Some(p) => points.push(*p),
                None => return Err(GridViolation::MissingCode { code: code as u8 }),
            }
        }

        self.check_monotonic(&points)?;

        Ok(GridPoints {
            layout: self.layout,
            points: points.iter().map(|p| p.cast::<f32>()).collect(),
        })
    }

    pub fn accepts(&self, landmarks: &[LandmarkInfo]) -> bool {
        match self.validate(landmarks) {
            Ok(_) => true,
            Err(v) => {
                debug!("grid rejected: {v}");
                false
            }
        }
    }

    fn check_monotonic(&self, points: &[Point2<i32>]) -> Result<(), GridViolation> {
        let l = &self.layout;
        let at = |col, row| {
            let code = l.code_at(col, row);
            (code, points[code as usize])
        };
        for row in 0..l.rows {
            for col in 1..l.cols {
                let (from, a) = at(col - 1, row);
                let (to, b) = at(col, row);
                if b.x <= a.x {
                    return Err(GridViolation::NotMonotonic {
                        axis: Axis::X,
                        from,
                        to,
                    });
                }
            }
        }
        for col in 0..l.cols {
            for row in 1..l.rows {
                let (from, a) = at(col, row - 1);
                let (to, b) = at(col, row);
                if b.y <= a.y {
                    return Err(GridViolation::NotMonotonic {
                        axis: Axis::Y,
                        from,
                        to,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgr_landmark_detect::PatternCode;

    fn lm(code: Option<u8>, x: i32, y: i32) -> LandmarkInfo {
        LandmarkInfo {
            center: Point2::new(x, y),
            score: 1.8,
            pixel_range: 200,
            pixel_min: 0,
            code: code.and_then(PatternCode::new),
            residual: None,
        }
    }

    /// Landmarks of a well-formed grid, listed in scrambled order.
    fn grid(layout: &GridLayout) -> Vec<LandmarkInfo> {
        let mut out = Vec::new();
        for row in 0..layout.rows {
            for col in 0..layout.cols {
                let code = layout.code_at(col, row);
                out.push(lm(Some(code), 40 + 60 * col as i32, 30 + 50 * row as i32));
            }
        }
        out.reverse();
        out.swap(1, 4);
        out
    }

    #[test]
    fn layout_cells_round_trip() {
        for order in [CodeOrder::RowMajor, CodeOrder::ColumnMajor] {
            let l = GridLayout {
                order,
                ..Default::default()
            };
            for code in 0..12u8 {
                let (c, r) = l.cell_of(code).expect("inside");
                assert_eq!(l.code_at(c, r), code);
            }
            assert!(l.cell_of(12).is_none());
        }
        let col_major = GridLayout {
            order: CodeOrder::ColumnMajor,
            ..Default::default()
        };
        assert_eq!(col_major.cell_of(4), Some((1, 1)));
    }

    #[test]
    fn accepts_well_formed_grid() {
        for order in [CodeOrder::RowMajor, CodeOrder::ColumnMajor] {
            let layout = GridLayout {
                order,
                ..Default::default()
            };
            let v = CalibrationGridValidator::new(layout);
            let pts = v.validate(&grid(&layout)).expect("valid grid");
            assert_eq!(pts.points.len(), 12);
            let (c, r) = layout.cell_of(5).expect("cell");
            assert_eq!(
                pts.point(5),
                Some(Point2::new(40.0 + 60.0 * c as f32, 30.0 + 50.0 * r as f32))
            );
        }
    }

    #[test]
    fn swapping_positions_breaks_monotonicity() {
        let layout = GridLayout::default();
        let v = CalibrationGridValidator::new(layout);
        let mut lms = grid(&layout);
        let i = lms.iter().position(|l| l.code_value() == 1).expect("code 1");
        let j = lms.iter().position(|l| l.code_value() == 6).expect("code 6");
        let (a, b) = (lms[i].center, lms[j].center);
        lms[i].center = b;
        lms[j].center = a;
        assert!(matches!(
            v.validate(&lms),
            Err(GridViolation::NotMonotonic { .. })
        ));
        assert!(!v.accepts(&lms));

        // swapping within a row breaks x ordering
        let mut lms = grid(&layout);
        let i = lms.iter().position(|l| l.code_value() == 8).expect("code 8");
        let j = lms.iter().position(|l| l.code_value() == 9).expect("code 9");
        let (a, b) = (lms[i].center, lms[j].center);
        lms[i].center = b;
        lms[j].center = a;
        assert_eq!(
            v.validate(&lms),
            Err(GridViolation::NotMonotonic {
                axis: Axis::X,
                from: 8,
                to: 9
            })
        );
    }

    #[test]
    fn count_and_code_violations() {
        let v = CalibrationGridValidator::default();
        let mut lms = grid(v.layout());

        assert_eq!(
            v.validate(&lms[..11]),
            Err(GridViolation::WrongCount {
                expected: 12,
                found: 11
            })
        );

        let keep = lms[0].clone();
        lms[0].code = None;
        assert!(matches!(
            v.validate(&lms),
            Err(GridViolation::Unclassified { .. })
        ));

        lms[0] = keep;
        let dup = lms[1].code;
        lms[0].code = dup;
        assert_eq!(
            v.validate(&lms),
            Err(GridViolation::DuplicateCode {
                code: dup.map_or(0, |c| c.value())
            })
        );
    }

    #[test]
    fn smaller_layout_reports_missing_code() {
        let layout = GridLayout {
            cols: 3,
            rows: 2,
            order: CodeOrder::RowMajor,
        };
        let v = CalibrationGridValidator::new(layout);
        let mut lms = grid(&layout);
        assert!(v.accepts(&lms));
        let i = lms.iter().position(|l| l.code_value() == 4).expect("code 4");
        lms[i].code = PatternCode::new(9);
        assert_eq!(v.validate(&lms), Err(GridViolation::MissingCode { code: 4 }));
    }

    #[test]
    fn layouts_beyond_code_range_are_rejected() {
        let lms = grid(&GridLayout::default());

        let wide = GridLayout {
            cols: 16,
            rows: 16,
            order: CodeOrder::RowMajor,
        };
        assert!(!wide.is_supported());
        assert_eq!(
            CalibrationGridValidator::new(wide).validate(&lms),
            Err(GridViolation::WrongCount {
                expected: 256,
                found: 12
            })
        );

        let huge = GridLayout {
            cols: 65536,
            rows: 65536,
            order: CodeOrder::ColumnMajor,
        };
        assert!(huge.len() > CODE_COUNT);
        assert!(!huge.is_supported());
        assert!(matches!(
            CalibrationGridValidator::new(huge).validate(&lms),
            Err(GridViolation::WrongCount { found: 12, .. })
        ));

        let empty = GridLayout {
            cols: 0,
            rows: 3,
            order: CodeOrder::RowMajor,
        };
        assert!(!CalibrationGridValidator::new(empty).accepts(&[]));
    }

    #[test]
    fn violations_render_messages() {
        let v = GridViolation::NotMonotonic {
            axis: Axis::Y,
            from: 2,
            to: 6,
        };
        assert_eq!(v.to_string(), "y does not increase from code 2 to code 6");
    }
}
