use dimsquery::IonMode;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

use super::adduct::AdductIon;

/// Position of a feature in the run's feature vector.
pub type FeatureId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkReason {
    IdentifiedCompound,
    Adduct,
    ChromatogramSimilar,
    FoundInUpperMsMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeakLink {
    pub linked_id: FeatureId,
    pub reason: LinkReason,
}

/// Apex and bounds of the infusion trace, in minutes.
///
/// Negative values mean the run had no usable scan times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromTime {
    pub apex: f64,
    pub left: f64,
    pub right: f64,
}

impl ChromTime {
    pub const UNKNOWN: ChromTime = ChromTime {
        apex: -1.0,
        left: -1.0,
        right: -1.0,
    };

    pub fn has_time(&self) -> bool {
        self.apex >= 0.0 && self.left >= 0.0 && self.right >= 0.0
    }
}

impl Default for ChromTime {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakCharacter {
    pub isotope_weight: u8,
    pub isotope_parent: Option<FeatureId>,
    pub adduct_parent: Option<FeatureId>,
    pub adduct: Option<AdductIon>,
    pub links: Vec<PeakLink>,
    pub is_linked: bool,
    pub group_id: Option<u32>,
}

impl PeakCharacter {
    pub fn is_monoisotopic(&self) -> bool {
        self.isotope_weight == 0
    }

    pub fn has_link(&self, other: FeatureId, reason: LinkReason) -> bool {
        self.links
            .iter()
            .any(|l| l.linked_id == other && l.reason == reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub mass: f64,
    pub intensity: f64,
    pub area: f64,
    pub amplitude: f64,
    pub mass_left: f64,
    pub mass_right: f64,
    pub ms1_scan_index: usize,
    /// Matched MS2 scan index to its collision energy.
    pub ms2_candidates: BTreeMap<usize, f64>,
    pub representative_ms2: Option<usize>,
    pub charge: u8,
    pub ion_mode: IonMode,
    pub time: ChromTime,
    pub peak_purity: f32,
    pub msdec_result_id: Option<usize>,
    pub character: PeakCharacter,
}

impl Feature {
    pub fn new(id: FeatureId, mass: f64, intensity: f64, ion_mode: IonMode) -> Self {
        Self {
            id,
            mass,
            intensity,
            area: 0.0,
            amplitude: intensity,
            mass_left: mass,
            mass_right: mass,
            ms1_scan_index: 0,
            ms2_candidates: BTreeMap::new(),
            representative_ms2: None,
            charge: 1,
            ion_mode,
            time: ChromTime::UNKNOWN,
            peak_purity: 1.0,
            msdec_result_id: None,
            character: PeakCharacter::default(),
        }
    }

    pub fn with_time(mut self, time: ChromTime) -> Self {
        self.time = time;
        self
    }

    pub fn with_purity(mut self, purity: f32) -> Self {
        self.peak_purity = purity;
        self
    }

    pub fn is_monoisotopic(&self) -> bool {
        self.character.is_monoisotopic()
    }

    pub fn adduct_name(&self) -> Option<&str> {
        self.character.adduct.as_ref().map(|a| a.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_feature_is_unlinked_monoisotopic() {
        let f = Feature::new(4, 181.07, 1e5, IonMode::Positive);
        assert!(f.is_monoisotopic());
        assert!(!f.character.is_linked);
        assert_eq!(f.charge, 1);
        assert!(!f.time.has_time());
        assert!(f.adduct_name().is_none());
    }

    #[test]
    fn test_serializes_candidates() {
        let mut f = Feature::new(0, 100.0, 10.0, IonMode::Positive);
        f.ms2_candidates.insert(12, 35.0);
        let json = serde_json::to_string(&f).unwrap();
        let back: Feature = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ms2_candidates.get(&12), Some(&35.0));
    }
}
