use serde::{
    Deserialize,
    Serialize,
};

/// Smoothing of an evenly indexed intensity profile.
///
/// Implementations return a vector of the same length as the input. Near
/// the edges the window shrinks to what is available.
pub trait Smoother: Send + Sync {
    fn smooth(&self, values: &[f64]) -> Vec<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SmoothingMethod {
    #[serde(rename = "sma")]
    SimpleMovingAverage,
    #[default]
    #[serde(rename = "lwma")]
    LinearWeightedMovingAverage,
    #[serde(rename = "savitzky_golay")]
    SavitzkyGolay,
}

impl SmoothingMethod {
    /// Builds the smoother for a half-window of `level` points.
    pub fn build(&self, level: usize) -> Box<dyn Smoother> {
        match self {
            Self::SimpleMovingAverage => Box::new(SimpleMovingAverage { half_window: level }),
            Self::LinearWeightedMovingAverage => {
                Box::new(LinearWeightedMovingAverage { half_window: level })
            }
            Self::SavitzkyGolay => Box::new(SavitzkyGolay::new(level)),
        }
    }
}

fn weighted_window(values: &[f64], half_window: usize, weight: impl Fn(usize) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(half_window);
        let hi = (i + half_window).min(n.saturating_sub(1));
        let mut acc = 0.0;
        let mut wsum = 0.0;
        for (j, v) in values.iter().enumerate().take(hi + 1).skip(lo) {
            let w = weight(i.abs_diff(j));
            acc += w * v;
            wsum += w;
        }
        out.push(if wsum > 0.0 { acc / wsum } else { values[i] });
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleMovingAverage {
    pub half_window: usize,
}

impl Smoother for SimpleMovingAverage {
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        weighted_window(values, self.half_window, |_| 1.0)
    }
}

/// Triangular weights: `half_window + 1 - distance`.
#[derive(Debug, Clone, Copy)]
pub struct LinearWeightedMovingAverage {
    pub half_window: usize,
}

impl Smoother for LinearWeightedMovingAverage {
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let hw = self.half_window;
        weighted_window(values, hw, |d| (hw + 1 - d) as f64)
    }
}

/// Quadratic Savitzky-Golay filter.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    half_window: usize,
    // coefficients[m] holds the 2m+1 weights for half-window m
    coefficients: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    pub fn new(half_window: usize) -> Self {
        let coefficients = (0..=half_window).map(Self::quadratic_coefficients).collect();
        Self {
            half_window,
            coefficients,
        }
    }

    fn quadratic_coefficients(m: usize) -> Vec<f64> {
        if m == 0 {
            return vec![1.0];
        }
        let mf = m as f64;
        let norm = (2.0 * mf - 1.0) * (2.0 * mf + 1.0) * (2.0 * mf + 3.0);
        let base = 3.0 * (3.0 * mf * mf + 3.0 * mf - 1.0);
        (0..=2 * m)
            .map(|k| {
                let i = k as f64 - mf;
                (base - 15.0 * i * i) / norm
            })
            .collect()
    }
}

impl Smoother for SavitzkyGolay {
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        (0..n)
            .map(|i| {
                let m = self.half_window.min(i).min(n - 1 - i);
                let coefs = &self.coefficients[m];
                coefs
                    .iter()
                    .zip(values[i - m..=i + m].iter())
                    .map(|(c, v)| c * v)
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_level_zero_is_identity() {
        let data = [1.0, 5.0, 2.0, 8.0];
        for method in [
            SmoothingMethod::SimpleMovingAverage,
            SmoothingMethod::LinearWeightedMovingAverage,
            SmoothingMethod::SavitzkyGolay,
        ] {
            assert_close(&method.build(0).smooth(&data), &data);
        }
    }

    #[test]
    fn test_sma() {
        let out = SimpleMovingAverage { half_window: 1 }.smooth(&[3.0, 6.0, 9.0, 0.0]);
        assert_close(&out, &[4.5, 6.0, 5.0, 4.5]);
    }

    #[test]
    fn test_lwma() {
        // weights 1, 2, 1
        let out = LinearWeightedMovingAverage { half_window: 1 }.smooth(&[0.0, 4.0, 0.0]);
        assert_close(&out, &[4.0 / 3.0, 2.0, 4.0 / 3.0]);
    }

    #[test]
    fn test_savitzky_golay_five_point_coefficients() {
        let sg = SavitzkyGolay::new(2);
        let expected = [-3.0 / 35.0, 12.0 / 35.0, 17.0 / 35.0, 12.0 / 35.0, -3.0 / 35.0];
        assert_close(&sg.coefficients[2], &expected);
    }

    #[test]
    fn test_savitzky_golay_preserves_quadratics() {
        let data: Vec<f64> = (0..9).map(|x| (x as f64 - 4.0).powi(2)).collect();
        let out = SavitzkyGolay::new(2).smooth(&data);
        assert_close(&out, &data);
    }

    #[test]
    fn test_empty_input() {
        assert!(SavitzkyGolay::new(3).smooth(&[]).is_empty());
        assert!(SimpleMovingAverage { half_window: 2 }.smooth(&[]).is_empty());
    }
}
