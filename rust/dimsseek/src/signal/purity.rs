/// Scores how clean a detected peak is, in [0, 1].
pub trait PurityEstimator: Send + Sync {
    fn purity(&self, smoothed: &[f64], left: usize, apex: usize, right: usize) -> f32;
}

/// Ratio of the smaller to the larger half-area above the peak's baseline.
/// A symmetric peak scores 1, a shoulder or tailing peak scores lower.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSymmetryPurity;

impl PurityEstimator for ProfileSymmetryPurity {
    fn purity(&self, smoothed: &[f64], left: usize, apex: usize, right: usize) -> f32 {
        if left > apex || apex > right || right >= smoothed.len() {
            return 0.0;
        }
        let baseline = smoothed[left].min(smoothed[right]);
        let above = |i: usize| (smoothed[i] - baseline).max(0.0);
        let left_area: f64 = (left..=apex).map(above).sum();
        let right_area: f64 = (apex..=right).map(above).sum();
        let larger = left_area.max(right_area);
        if larger <= 0.0 {
            return 0.0;
        }
        (left_area.min(right_area) / larger) as f32
    }
}
