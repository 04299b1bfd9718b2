use dimsquery::SpectrumPeak;

#[derive(Debug, Clone, Copy)]
struct PeakAggregator {
    weighted_mz_sum: f64,
    total_intensity: f64,
}

impl PeakAggregator {
    fn new(peak: &SpectrumPeak) -> Self {
        Self {
            weighted_mz_sum: peak.mz * peak.intensity,
            total_intensity: peak.intensity,
        }
    }

    fn add_peak(&mut self, peak: &SpectrumPeak) {
        self.weighted_mz_sum += peak.mz * peak.intensity;
        self.total_intensity += peak.intensity;
    }

    fn finalize(&self, fallback_mz: f64) -> SpectrumPeak {
        let mz = if self.total_intensity > 0.0 {
            self.weighted_mz_sum / self.total_intensity
        } else {
            fallback_mz
        };
        SpectrumPeak::new(mz, self.total_intensity)
    }
}

/// Centroids a profile spectrum by greedy aggregation.
///
/// Points are visited from most to least intense. Each untaken point becomes
/// a centroid that absorbs the contiguous untaken neighbours within
/// `tolerance` Da of it. The centroid m/z is the intensity-weighted mean and
/// its intensity the summed intensity. Output is sorted by m/z.
pub fn centroid_profile(peaks: &[SpectrumPeak], tolerance: f64) -> Vec<SpectrumPeak> {
    let mut sorted: Vec<SpectrumPeak> = peaks
        .iter()
        .filter(|p| p.intensity > 0.0)
        .copied()
        .collect();
    sorted.sort_by(|a, b| a.mz.total_cmp(&b.mz));

    let mut order: Vec<usize> = (0..sorted.len()).collect();
    order.sort_by(|&a, &b| sorted[b].intensity.total_cmp(&sorted[a].intensity));

    let mut taken = vec![false; sorted.len()];
    let mut out = Vec::new();
    for &parent in order.iter() {
        if taken[parent] {
            continue;
        }
        taken[parent] = true;
        let apex_mz = sorted[parent].mz;
        let mut agg = PeakAggregator::new(&sorted[parent]);

        let mut i = parent;
        while i > 0 && !taken[i - 1] && apex_mz - sorted[i - 1].mz <= tolerance {
            i -= 1;
            taken[i] = true;
            agg.add_peak(&sorted[i]);
        }
        let mut j = parent;
        while j + 1 < sorted.len() && !taken[j + 1] && sorted[j + 1].mz - apex_mz <= tolerance {
            j += 1;
            taken[j] = true;
            agg.add_peak(&sorted[j]);
        }
        out.push(agg.finalize(apex_mz));
    }
    out.sort_by(|a, b| a.mz.total_cmp(&b.mz));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_collapses_to_weighted_centroid() {
        let profile = vec![
            SpectrumPeak::new(99.99, 50.0),
            SpectrumPeak::new(100.00, 100.0),
            SpectrumPeak::new(100.01, 50.0),
            SpectrumPeak::new(150.00, 10.0),
        ];
        let out = centroid_profile(&profile, 0.02);
        assert_eq!(out.len(), 2);
        assert!((out[0].mz - 100.0).abs() < 1e-9);
        assert_eq!(out[0].intensity, 200.0);
        assert_eq!(out[1].intensity, 10.0);
    }

    #[test]
    fn test_zero_intensity_points_dropped() {
        let profile = vec![SpectrumPeak::new(10.0, 0.0)];
        assert!(centroid_profile(&profile, 0.1).is_empty());
    }
}
