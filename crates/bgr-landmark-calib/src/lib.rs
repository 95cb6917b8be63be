//! Calibration-grid acceptance and session records for BGR landmarks.
//!
//! The printed calibration board carries all 12 landmark codes on a
//! `cols × rows` grid. [`CalibrationGridValidator`] accepts a frame only when
//! every code is seen exactly once and the detected centers keep the grid's
//! row/column ordering; [`CalibrationRecord`] accumulates accepted frames and
//! persists them as JSON.

mod grid;
mod record;

pub use grid::{Axis, CalibrationGridValidator, CodeOrder, GridLayout, GridPoints, GridViolation};
pub use record::{CalibIoError, CalibrationRecord};
