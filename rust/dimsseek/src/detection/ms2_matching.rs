use dimsquery::RawSpectrum;
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    HashMap,
};
use tracing::debug;

use crate::errors::{
    DimsSeekError,
    Result,
};
use crate::models::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AcquisitionType {
    #[default]
    #[serde(rename = "dda")]
    Dda,
    #[serde(rename = "swath")]
    Swath,
    #[serde(rename = "aif")]
    Aif,
    #[serde(rename = "srm")]
    Srm,
}

impl AcquisitionType {
    pub fn is_data_independent(&self) -> bool {
        matches!(self, Self::Swath | Self::Aif)
    }
}

#[derive(Debug, Clone, Copy)]
struct Ms2Candidate {
    scan_index: usize,
    target_mz: f64,
    lower_mz: f64,
    upper_mz: f64,
    collision_energy: f64,
    total_ion_current: f64,
}

/// Associates features with the MS2 scans that fragmented them.
///
/// In DDA mode a scan matches when its isolation target is within the
/// tolerance of the feature mass (inclusive). In SWATH/AIF mode a scan
/// matches when the feature mass falls inside its isolation window padded by
/// the tolerance, so one scan can serve many features.
pub struct Ms2Matcher {
    acquisition: AcquisitionType,
    tolerance: f64,
    // sorted by target m/z
    candidates: Vec<Ms2Candidate>,
    tic_by_scan: HashMap<usize, f64>,
}

impl Ms2Matcher {
    pub fn new(
        spectra: &[RawSpectrum],
        acquisition: AcquisitionType,
        tolerance: f64,
    ) -> Result<Self> {
        if acquisition == AcquisitionType::Srm {
            return Err(DimsSeekError::UnsupportedAcquisition {
                acquisition,
                context: "MS2 matching",
            });
        }
        let mut candidates: Vec<Ms2Candidate> = spectra
            .iter()
            .filter(|s| s.ms_level >= 2)
            .filter_map(|s| {
                let precursor = s.precursor.as_ref()?;
                let window = precursor.padded_isolation_range(tolerance);
                Some(Ms2Candidate {
                    scan_index: s.index,
                    target_mz: precursor.isolation_target_mz,
                    lower_mz: window.start(),
                    upper_mz: window.end(),
                    collision_energy: precursor.collision_energy,
                    total_ion_current: s.total_ion_current,
                })
            })
            .collect();
        candidates.sort_by(|a, b| a.target_mz.total_cmp(&b.target_mz));
        let tic_by_scan = candidates
            .iter()
            .map(|c| (c.scan_index, c.total_ion_current))
            .collect();
        debug!("Indexed {} MS2 scans with precursors", candidates.len());
        Ok(Self {
            acquisition,
            tolerance,
            candidates,
            tic_by_scan,
        })
    }

    /// Matching scan indices mapped to their collision energy.
    pub fn match_mass(&self, mass: f64) -> BTreeMap<usize, f64> {
        let mut out = BTreeMap::new();
        if self.acquisition.is_data_independent() {
            for c in self.candidates.iter() {
                if c.lower_mz <= mass && mass <= c.upper_mz {
                    out.insert(c.scan_index, c.collision_energy);
                }
            }
            return out;
        }

        let start = self
            .candidates
            .partition_point(|c| c.target_mz < mass - self.tolerance);
        for c in self.candidates[start..].iter() {
            let diff = c.target_mz - mass;
            if diff > self.tolerance {
                break;
            }
            if diff.abs() <= self.tolerance {
                out.insert(c.scan_index, c.collision_energy);
            }
        }
        out
    }

    /// The candidate with the highest total ion current, lowest index on ties.
    pub fn representative(&self, candidates: &BTreeMap<usize, f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &scan in candidates.keys() {
            let tic = self.tic_by_scan.get(&scan).copied().unwrap_or(0.0);
            match best {
                Some((_, best_tic)) if tic <= best_tic => {}
                _ => best = Some((scan, tic)),
            }
        }
        best.map(|(scan, _)| scan)
    }

    pub fn assign(&self, features: &mut [Feature]) {
        features.par_iter_mut().for_each(|f| {
            f.ms2_candidates = self.match_mass(f.mass);
            f.representative_ms2 = self.representative(&f.ms2_candidates);
        });
    }
}
