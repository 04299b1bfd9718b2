//! Conversions between ppm and absolute (Da) mass tolerances.

use super::TupleRange;

/// Smallest width used in place of a zero-width window.
pub const EPSILON_WIDTH: f64 = 1e-9;

pub fn ppm_tol_range(elem: f64, tol_ppm: f64) -> TupleRange<f64> {
    let utol = ppm_to_da(elem, tol_ppm);
    TupleRange::new_widening(elem - utol, elem + utol)
}

pub fn da_tol_range(elem: f64, tol_da: f64) -> TupleRange<f64> {
    TupleRange::new_widening(elem - tol_da.abs(), elem + tol_da.abs())
}

/// The ppm error a tolerance of `tol_da` represents at `reference_mz`.
///
/// ```
/// use dimsquery::utils::tolerance_ranges::da_to_ppm;
///
/// assert!((da_to_ppm(200.0, 0.01) - 50.0).abs() < 1e-9);
/// ```
pub fn da_to_ppm(reference_mz: f64, tol_da: f64) -> f64 {
    tol_da / reference_mz.abs().max(EPSILON_WIDTH) * 1e6
}

/// The absolute tolerance `tol_ppm` represents at `mz`.
pub fn ppm_to_da(mz: f64, tol_ppm: f64) -> f64 {
    mz.abs() * tol_ppm / 1e6
}
