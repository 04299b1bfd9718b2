use crate::errors::{
    DataProcessingError,
    Result,
};

/// Pearson correlation between two traces of the same length.
///
/// Returns NaN when either trace is constant.
///
/// # Example
///
/// ```
/// use dimsseek::utils::correlation::pearson_correlation;
///
/// let a = vec![1.0, 2.0, 3.0, 4.0];
/// let b = vec![2.0, 4.0, 6.0, 8.0];
/// let r = pearson_correlation(&a, &b).unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
/// ```
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(DataProcessingError::ExpectedSlicesSameLength {
            expected: a.len(),
            other: b.len(),
            context: "pearson_correlation".to_string(),
        }
        .into());
    }
    if a.is_empty() {
        return Err(DataProcessingError::ExpectedNonEmptyData {
            context: Some("pearson_correlation".to_string()),
        }
        .into());
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(cov / (var_a.sqrt() * var_b.sqrt()))
}
