//! Reduction of a DIMS scan sequence to one representative MS1 profile.
//!
//! Three strategies are supported:
//!
//! - [`AccumulationStrategy::BasePeak`]: keep the MS1 scan with the most intense base peak.
//! - [`AccumulationStrategy::TotalIonCurrent`]: keep the MS1 scan with the highest TIC.
//! - [`AccumulationStrategy::Average`]: bin every MS1 peak and emit one averaged peak per bin.
//!
//! MSn scans always pass through untouched. The output list starts with the
//! representative MS1 scan (when there is one) and is renumbered `0..N`.
//!
//! # Binning
//!
//! Below `pivot_mz` bins have a fixed width. Above it the bin index grows with
//! `ln(mz / pivot) / ln(1 + rel)` where `rel = bin_width / pivot_mz`, so the
//! bin width is relative (ppm-like) and continuous at the pivot.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};

use crate::models::{
    RawSpectrum,
    SpectrumPeak,
};
use crate::utils::tolerance_ranges::EPSILON_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccumulationStrategy {
    #[serde(rename = "base_peak")]
    BasePeak,
    #[serde(rename = "tic")]
    TotalIonCurrent,
    #[default]
    #[serde(rename = "average")]
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulationConfig {
    pub strategy: AccumulationStrategy,
    /// Bin width (Da) below the pivot; also sets the relative width above it.
    pub bin_width: f64,
    pub pivot_mz: f64,
}

impl Default for AccumulationConfig {
    fn default() -> Self {
        Self {
            strategy: AccumulationStrategy::Average,
            bin_width: 0.01,
            pivot_mz: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    representative_mz: f64,
    max_intensity: f64,
    intensity_sum: f64,
}

#[derive(Debug, Clone)]
pub struct SpectrumAccumulator {
    config: AccumulationConfig,
}

impl SpectrumAccumulator {
    pub fn new(config: AccumulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AccumulationConfig {
        &self.config
    }

    /// Returns the reduced scan list, renumbered from 0.
    ///
    /// An empty input gives an empty output; callers treat that as "no data".
    pub fn accumulate(&self, scans: &[RawSpectrum]) -> Vec<RawSpectrum> {
        if scans.is_empty() {
            return Vec::new();
        }
        let ms1: Vec<&RawSpectrum> = scans.iter().filter(|s| s.is_ms1()).collect();
        let msn = scans.iter().filter(|s| !s.is_ms1()).cloned();

        let representative = match self.config.strategy {
            AccumulationStrategy::BasePeak => {
                select_max_by(&ms1, |s| s.base_peak_intensity).cloned()
            }
            AccumulationStrategy::TotalIonCurrent => {
                select_max_by(&ms1, |s| s.total_ion_current).cloned()
            }
            AccumulationStrategy::Average => self.average_ms1(&ms1),
        };
        if representative.is_none() {
            warn!("No MS1 scans among {} scans, passing MSn scans through", scans.len());
        }

        let mut out: Vec<RawSpectrum> = representative.into_iter().chain(msn).collect();
        reindex(&mut out);
        debug!(
            "Accumulated {} scans ({} MS1) into {} with {:?}",
            scans.len(),
            ms1.len(),
            out.len(),
            self.config.strategy
        );
        out
    }

    /// Bin index of `mz`; linear below the pivot, logarithmic above it.
    pub fn bucket_index(&self, mz: f64) -> i64 {
        let width = self.config.bin_width.max(EPSILON_WIDTH);
        let pivot = self.config.pivot_mz.max(EPSILON_WIDTH);
        if mz < pivot {
            (mz / width).floor() as i64
        } else {
            let pivot_bin = (pivot / width).floor() as i64;
            let rel = width / pivot;
            pivot_bin + ((mz / pivot).ln() / rel.ln_1p()).floor() as i64
        }
    }

    fn average_ms1(&self, ms1: &[&RawSpectrum]) -> Option<RawSpectrum> {
        let first = ms1.first()?;
        let num_scans = ms1.len() as f64;

        let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
        for peak in ms1.iter().flat_map(|s| s.peaks.iter()) {
            let bucket = buckets
                .entry(self.bucket_index(peak.mz))
                .or_insert(Bucket {
                    representative_mz: peak.mz,
                    max_intensity: peak.intensity,
                    intensity_sum: 0.0,
                });
            if peak.intensity > bucket.max_intensity {
                bucket.max_intensity = peak.intensity;
                bucket.representative_mz = peak.mz;
            }
            bucket.intensity_sum += peak.intensity;
        }

        // Mean over scans, not over the peaks that landed in the bucket.
        let mut peaks: Vec<SpectrumPeak> = buckets
            .values()
            .map(|b| SpectrumPeak::new(b.representative_mz, b.intensity_sum / num_scans))
            .collect();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));

        let mut averaged = RawSpectrum::new(0, 1, first.polarity, peaks);
        if let Some(time) = midpoint_time(ms1) {
            averaged = averaged.with_scan_start_time(time);
        }
        Some(averaged)
    }
}

/// Midpoint between the earliest and latest timed scan.
fn midpoint_time(scans: &[&RawSpectrum]) -> Option<f64> {
    let (lo, hi) = scans
        .iter()
        .filter(|s| s.has_scan_time())
        .map(|s| s.scan_start_time)
        .fold(None, |acc: Option<(f64, f64)>, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })?;
    Some(0.5 * (lo + hi))
}

fn select_max_by<'a>(
    scans: &[&'a RawSpectrum],
    key: impl Fn(&RawSpectrum) -> f64,
) -> Option<&'a RawSpectrum> {
    let mut best: Option<&'a RawSpectrum> = None;
    for &scan in scans {
        match best {
            Some(current) if key(scan) <= key(current) => {}
            _ => best = Some(scan),
        }
    }
    best
}

fn reindex(scans: &mut [RawSpectrum]) {
    for (i, scan) in scans.iter_mut().enumerate() {
        scan.index = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        IonMode,
        PrecursorWindow,
    };

    fn ms1(index: usize, peaks: &[(f64, f64)]) -> RawSpectrum {
        RawSpectrum::new(
            index,
            1,
            IonMode::Positive,
            peaks.iter().map(|&(mz, i)| SpectrumPeak::new(mz, i)).collect(),
        )
    }

    fn ms2(index: usize, target: f64) -> RawSpectrum {
        RawSpectrum::new(index, 2, IonMode::Positive, vec![SpectrumPeak::new(50.0, 1.0)])
            .with_precursor(PrecursorWindow {
                isolation_target_mz: target,
                isolation_lower_offset: 0.5,
                isolation_upper_offset: 0.5,
                collision_energy: 20.0,
            })
    }

    fn accumulator(strategy: AccumulationStrategy) -> SpectrumAccumulator {
        SpectrumAccumulator::new(AccumulationConfig {
            strategy,
            ..Default::default()
        })
    }

    fn scans() -> Vec<RawSpectrum> {
        vec![
            ms1(40, &[(100.0, 5.0), (200.0, 50.0)]),
            ms2(41, 200.0),
            ms1(42, &[(100.0, 80.0), (200.0, 10.0), (300.0, 10.0)]),
            ms2(43, 100.0),
            ms1(44, &[(100.0, 20.0), (200.0, 20.0), (300.0, 60.0)]),
        ]
    }

    #[test]
    fn test_empty_input() {
        for strategy in [
            AccumulationStrategy::BasePeak,
            AccumulationStrategy::TotalIonCurrent,
            AccumulationStrategy::Average,
        ] {
            assert!(accumulator(strategy).accumulate(&[]).is_empty());
        }
    }

    #[test]
    fn test_reindexing_is_contiguous() {
        for strategy in [
            AccumulationStrategy::BasePeak,
            AccumulationStrategy::TotalIonCurrent,
            AccumulationStrategy::Average,
        ] {
            let out = accumulator(strategy).accumulate(&scans());
            assert_eq!(out.len(), 3);
            for (i, s) in out.iter().enumerate() {
                assert_eq!(s.index, i);
            }
            assert!(out[0].is_ms1());
            assert_eq!(out[1].precursor.unwrap().isolation_target_mz, 200.0);
            assert_eq!(out[2].precursor.unwrap().isolation_target_mz, 100.0);
        }
    }

    #[test]
    fn test_base_peak_selection() {
        let out = accumulator(AccumulationStrategy::BasePeak).accumulate(&scans());
        assert_eq!(out[0].base_peak_intensity, 80.0);
    }

    #[test]
    fn test_tic_selection() {
        let out = accumulator(AccumulationStrategy::TotalIonCurrent).accumulate(&scans());
        assert_eq!(out[0].total_ion_current, 100.0);
        assert_eq!(out[0].peaks.len(), 3);
    }

    #[test]
    fn test_single_ms1_is_returned_unchanged() {
        let only = ms1(9, &[(150.0, 3.0)]);
        let out = accumulator(AccumulationStrategy::TotalIonCurrent).accumulate(&[only.clone()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].peaks, only.peaks);
        assert_eq!(out[0].index, 0);
    }

    #[test]
    fn test_average_conserves_intensity() {
        let input = scans();
        let out = accumulator(AccumulationStrategy::Average).accumulate(&input);
        let n_ms1 = input.iter().filter(|s| s.is_ms1()).count() as f64;
        let total_in: f64 = input
            .iter()
            .filter(|s| s.is_ms1())
            .flat_map(|s| s.peaks.iter())
            .map(|p| p.intensity)
            .sum();
        let total_out: f64 = out[0].peaks.iter().map(|p| p.intensity).sum();
        assert!((total_out * n_ms1 - total_in).abs() < 1e-9);
    }

    #[test]
    fn test_average_divides_by_scan_count() {
        // 300.0 only shows up in two of three scans.
        let out = accumulator(AccumulationStrategy::Average).accumulate(&scans());
        let p300 = out[0].peaks.iter().find(|p| p.mz == 300.0).unwrap();
        assert!((p300.intensity - 70.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_representative_mass_is_most_intense() {
        let input = vec![
            ms1(0, &[(100.001, 10.0)]),
            ms1(1, &[(100.004, 30.0)]),
        ];
        let out = accumulator(AccumulationStrategy::Average).accumulate(&input);
        assert_eq!(out[0].peaks.len(), 1);
        assert_eq!(out[0].peaks[0].mz, 100.004);
        assert!((out[0].peaks[0].intensity - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_time_is_midpoint_of_timed_scans() {
        let input = vec![
            ms1(0, &[(100.0, 1.0)]).with_scan_start_time(0.2),
            ms1(1, &[(100.0, 1.0)]),
            ms1(2, &[(100.0, 1.0)]).with_scan_start_time(1.0),
            ms1(3, &[(100.0, 1.0)]).with_scan_start_time(0.6),
        ];
        let out = accumulator(AccumulationStrategy::Average).accumulate(&input);
        assert!(out[0].has_scan_time());
        assert!((out[0].scan_start_time - 0.6).abs() < 1e-12);

        let untimed = vec![ms1(0, &[(100.0, 1.0)]), ms1(1, &[(100.0, 1.0)])];
        let out = accumulator(AccumulationStrategy::Average).accumulate(&untimed);
        assert!(!out[0].has_scan_time());
    }

    #[test]
    fn test_bucket_index_is_continuous_at_pivot() {
        let acc = accumulator(AccumulationStrategy::Average);
        let below = acc.bucket_index(499.995);
        let at = acc.bucket_index(500.0);
        assert_eq!(at, below + 1);
        // Relative bins get wider with mass.
        let a = acc.bucket_index(1000.0);
        let b = acc.bucket_index(1000.015);
        assert!(b - a <= 1);
    }

    #[test]
    fn test_no_ms1_passes_msn_through() {
        let out = accumulator(AccumulationStrategy::BasePeak).accumulate(&[ms2(5, 100.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].index, 0);
        assert_eq!(out[0].ms_level, 2);
    }
}
