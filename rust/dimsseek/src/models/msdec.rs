use dimsquery::SpectrumPeak;
use serde::{
    Deserialize,
    Serialize,
};

use super::feature::FeatureId;

/// Cleaned fragment spectrum of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsDecResult {
    pub feature_id: FeatureId,
    pub ms2_scan_index: Option<usize>,
    pub precursor_mz: f64,
    pub spectrum: Vec<SpectrumPeak>,
}

impl MsDecResult {
    pub fn empty(feature_id: FeatureId, precursor_mz: f64) -> Self {
        Self {
            feature_id,
            ms2_scan_index: None,
            precursor_mz,
            spectrum: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    pub fn max_intensity(&self) -> f64 {
        self.spectrum
            .iter()
            .map(|p| p.intensity)
            .fold(0.0, f64::max)
    }
}
