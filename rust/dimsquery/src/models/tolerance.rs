use serde::{
    Deserialize,
    Serialize,
};

use crate::utils::TupleRange;
use crate::utils::tolerance_ranges::{
    da_tol_range,
    ppm_tol_range,
};

/// Symmetric m/z tolerance.
///
/// Example:
/// ```
/// use dimsquery::MzTolerance;
///
/// let tol = MzTolerance::Ppm(20.0);
/// let range = tol.mz_range(500.0);
/// assert!((range.start() - 499.99).abs() < 1e-6);
/// assert!((range.end() - 500.01).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MzTolerance {
    #[serde(rename = "da")]
    Absolute(f64),
    #[serde(rename = "ppm")]
    Ppm(f64),
}

impl Default for MzTolerance {
    fn default() -> Self {
        MzTolerance::Absolute(0.01)
    }
}

impl MzTolerance {
    pub fn mz_range(&self, mz: f64) -> TupleRange<f64> {
        match *self {
            MzTolerance::Absolute(da) => da_tol_range(mz, da),
            MzTolerance::Ppm(ppm) => ppm_tol_range(mz, ppm),
        }
    }
}
