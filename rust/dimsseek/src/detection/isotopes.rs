use tracing::debug;

use crate::config::IsotopeConfig;
use crate::models::{
    Feature,
    FeatureId,
};

/// Mass difference between the 13C and 12C isotopes.
pub const C13_C12_DIFF: f64 = 1.003355;

/// Groups features into isotopic envelopes and assigns charge states.
///
/// Features are visited by ascending mass. Each unassigned feature is tried as
/// a monoisotopic peak at every charge from 1 to `max_charge`; the charge that
/// explains the longest run of satellites spaced by `1.003355 / z` wins, ties
/// going to the lower charge.
pub struct IsotopeEstimator {
    config: IsotopeConfig,
    tolerance: f64,
}

impl IsotopeEstimator {
    pub fn new(config: &IsotopeConfig, ms1_tolerance: f64) -> Self {
        Self {
            config: config.clone(),
            tolerance: ms1_tolerance,
        }
    }

    pub fn estimate(&self, features: &mut [Feature]) {
        let mut order: Vec<usize> = (0..features.len()).collect();
        order.sort_by(|&a, &b| features[a].mass.total_cmp(&features[b].mass));
        let sorted_mass: Vec<f64> = order.iter().map(|&i| features[i].mass).collect();
        let mut assigned = vec![false; features.len()];
        let mut num_envelopes = 0;

        for pos in 0..order.len() {
            let mono = order[pos];
            if assigned[mono] {
                continue;
            }
            let mut best: (u8, Vec<(usize, u8)>) = (1, Vec::new());
            for charge in 1..=self.config.max_charge {
                let run = self.satellite_run(features, &order, &sorted_mass, &assigned, pos, charge);
                if run.len() > best.1.len() {
                    best = (charge, run);
                }
            }
            let (charge, run) = best;
            if run.is_empty() {
                continue;
            }
            num_envelopes += 1;
            features[mono].charge = charge;
            for (member, weight) in run {
                assigned[member] = true;
                let f = &mut features[member];
                f.charge = charge;
                f.character.isotope_weight = weight;
                f.character.isotope_parent = Some(mono as FeatureId);
            }
        }
        debug!("Found {} isotopic envelopes", num_envelopes);
    }

    fn satellite_run(
        &self,
        features: &[Feature],
        order: &[usize],
        sorted_mass: &[f64],
        assigned: &[bool],
        pos: usize,
        charge: u8,
    ) -> Vec<(usize, u8)> {
        let mono = &features[order[pos]];
        let spacing = C13_C12_DIFF / charge as f64;
        let mut run = Vec::new();
        let mut prev_intensity = mono.intensity;

        for k in 1..=self.config.max_isotopes {
            let target = mono.mass + k as f64 * spacing;
            let lo = pos + 1 + sorted_mass[pos + 1..].partition_point(|m| *m < target - self.tolerance);
            let mut found: Option<usize> = None;
            let mut best_err = f64::INFINITY;
            for (&idx, &mass) in order[lo..].iter().zip(sorted_mass[lo..].iter()) {
                if mass > target + self.tolerance {
                    break;
                }
                let err = (mass - target).abs();
                if !assigned[idx] && err < best_err {
                    best_err = err;
                    found = Some(idx);
                }
            }
            let Some(idx) = found else {
                break;
            };
            let intensity = features[idx].intensity;
            if mono.mass < self.config.intensity_check_max_mass
                && intensity > prev_intensity * self.config.max_intensity_ratio
            {
                break;
            }
            run.push((idx, k));
            prev_intensity = intensity;
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimsquery::IonMode;

    fn features(peaks: &[(f64, f64)]) -> Vec<Feature> {
        peaks
            .iter()
            .enumerate()
            .map(|(i, &(mz, int))| Feature::new(i, mz, int, IonMode::Positive))
            .collect()
    }

    fn estimator() -> IsotopeEstimator {
        IsotopeEstimator::new(&IsotopeConfig::default(), 0.005)
    }

    #[test]
    fn test_singly_charged_envelope() {
        let mut fs = features(&[(300.0, 1000.0), (301.003355, 200.0), (302.00671, 30.0)]);
        estimator().estimate(&mut fs);
        assert_eq!(fs[0].character.isotope_weight, 0);
        assert_eq!(fs[1].character.isotope_weight, 1);
        assert_eq!(fs[2].character.isotope_weight, 2);
        assert_eq!(fs[2].character.isotope_parent, Some(0));
        assert!(fs.iter().all(|f| f.charge == 1));
    }

    #[test]
    fn test_doubly_charged_envelope() {
        let mut fs = features(&[
            (400.0, 1000.0),
            (400.5016775, 400.0),
            (401.003355, 100.0),
        ]);
        estimator().estimate(&mut fs);
        assert_eq!(fs[0].charge, 2);
        assert_eq!(fs[1].character.isotope_weight, 1);
        assert_eq!(fs[2].character.isotope_weight, 2);
        assert_eq!(fs[2].charge, 2);
    }

    #[test]
    fn test_intensity_check_below_800() {
        // The +1 peak is more intense than the monoisotope, so it starts its own envelope.
        let mut fs = features(&[(300.0, 100.0), (301.003355, 500.0)]);
        estimator().estimate(&mut fs);
        assert_eq!(fs[1].character.isotope_weight, 0);
        assert!(fs[1].character.isotope_parent.is_none());
    }

    #[test]
    fn test_intensity_check_skipped_above_800() {
        let mut fs = features(&[(900.0, 100.0), (901.003355, 500.0)]);
        estimator().estimate(&mut fs);
        assert_eq!(fs[1].character.isotope_weight, 1);
        assert_eq!(fs[1].character.isotope_parent, Some(0));
    }

    #[test]
    fn test_satellite_not_claimed_twice() {
        let mut fs = features(&[(300.0, 1000.0), (301.003355, 100.0), (302.00671, 10.0)]);
        estimator().estimate(&mut fs);
        // The M+1 peak is already a satellite and cannot be a monoisotope.
        assert_eq!(fs[2].character.isotope_parent, Some(0));
    }
}
