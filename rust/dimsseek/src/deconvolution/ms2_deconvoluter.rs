use dimsquery::{
    RawSpectrum,
    SpectrumPeak,
};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use super::centroiding::centroid_profile;
use crate::config::{
    DeconvolutionConfig,
    SpectrumDataType,
};
use crate::models::{
    Feature,
    MsDecResult,
};

const COLLISION_ENERGY_TOLERANCE: f64 = 0.5;

/// Produces one cleaned fragment spectrum per feature.
pub struct Ms2Deconvoluter {
    config: DeconvolutionConfig,
    ms2_tolerance: f64,
}

impl Ms2Deconvoluter {
    pub fn new(config: &DeconvolutionConfig, ms2_tolerance: f64) -> Self {
        Self {
            config: config.clone(),
            ms2_tolerance,
        }
    }

    /// Picks the MS2 scan to deconvolute for `feature`.
    ///
    /// Without a collision energy filter this is the feature's representative
    /// scan. With one, the highest-TIC candidate at that energy.
    pub fn select_scan<'a>(
        &self,
        feature: &Feature,
        ms2_by_index: &HashMap<usize, &'a RawSpectrum>,
    ) -> Option<&'a RawSpectrum> {
        match self.config.collision_energy {
            None => feature
                .representative_ms2
                .and_then(|idx| ms2_by_index.get(&idx).copied()),
            Some(ce) => {
                let mut best: Option<&RawSpectrum> = None;
                for (idx, energy) in feature.ms2_candidates.iter() {
                    if (energy - ce).abs() > COLLISION_ENERGY_TOLERANCE {
                        continue;
                    }
                    let Some(scan) = ms2_by_index.get(idx).copied() else {
                        continue;
                    };
                    if best.is_none_or(|b| scan.total_ion_current > b.total_ion_current) {
                        best = Some(scan);
                    }
                }
                best
            }
        }
    }

    /// Cleans the fragments of `scan`, or returns an empty result.
    pub fn deconvolute(&self, feature: &Feature, scan: Option<&RawSpectrum>) -> MsDecResult {
        let Some(scan) = scan else {
            return MsDecResult::empty(feature.id, feature.mass);
        };
        let in_range: Vec<SpectrumPeak> = scan
            .peaks
            .iter()
            .filter(|p| {
                p.mz >= self.config.mass_range_begin && p.mz <= self.config.mass_range_end
            })
            .copied()
            .collect();
        let mut peaks = match self.config.ms2_data_type {
            SpectrumDataType::Centroid => in_range,
            SpectrumDataType::Profile => centroid_profile(&in_range, self.ms2_tolerance),
        };

        let top = peaks.iter().map(|p| p.intensity).fold(0.0, f64::max);
        let threshold = self
            .config
            .amplitude_cutoff
            .max(self.config.relative_amplitude_cutoff * top);
        let upper_mz = feature.mass + self.config.kept_isotope_range;
        peaks.retain(|p| {
            p.intensity > 0.0
                && p.intensity >= threshold
                && (!self.config.remove_after_precursor || p.mz <= upper_mz)
        });
        if peaks.is_empty() {
            return MsDecResult::empty(feature.id, feature.mass);
        }
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        MsDecResult {
            feature_id: feature.id,
            ms2_scan_index: Some(scan.index),
            precursor_mz: feature.mass,
            spectrum: peaks,
        }
    }

    /// Deconvolutes every feature; result `i` belongs to feature `i`, whose
    /// `msdec_result_id` is set accordingly.
    pub fn deconvolute_all(
        &self,
        features: &mut [Feature],
        spectra: &[RawSpectrum],
    ) -> Vec<MsDecResult> {
        let ms2_by_index: HashMap<usize, &RawSpectrum> = spectra
            .iter()
            .filter(|s| s.ms_level >= 2)
            .map(|s| (s.index, s))
            .collect();
        let results: Vec<MsDecResult> = features
            .par_iter()
            .map(|f| self.deconvolute(f, self.select_scan(f, &ms2_by_index)))
            .collect();
        for (i, f) in features.iter_mut().enumerate() {
            f.msdec_result_id = Some(i);
        }
        debug!(
            "Deconvoluted {} features, {} with fragments",
            results.len(),
            results.iter().filter(|r| !r.is_empty()).count()
        );
        results
    }
}
