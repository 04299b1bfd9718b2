use dimsquery::{
    IonMode,
    SpectrumPeak,
};
use tracing::debug;

use super::links::register_link;
use super::{
    PeakCharacterLinker,
    msdec_for,
};
use crate::models::adduct::{
    ACETATE_LOSS,
    FORMATE_LOSS,
};
use crate::models::{
    AdductIon,
    Feature,
    FeatureId,
    LinkReason,
    MsDecResult,
};

const MIN_LOSS_RELATIVE_INTENSITY: f64 = 0.8;
const MAX_PRECURSOR_RELATIVE_INTENSITY: f64 = 0.4;

impl PeakCharacterLinker {
    pub(super) fn infer_adducts_from_neutral_loss(
        &self,
        features: &mut [Feature],
        msdec_results: &[MsDecResult],
    ) {
        if self.ion_mode != IonMode::Negative {
            return;
        }
        let formate = self
            .adducts
            .iter()
            .find(|a| a.is_formate(self.ms2_tolerance));
        let acetate = self
            .adducts
            .iter()
            .find(|a| a.is_acetate(self.ms2_tolerance));
        if formate.is_none() && acetate.is_none() {
            return;
        }

        let mut num_assigned = 0;
        for f in features.iter_mut() {
            if !f.is_monoisotopic() || f.character.adduct.is_some() {
                continue;
            }
            let Some(msdec) = msdec_for(f, msdec_results) else {
                continue;
            };
            if let Some(adduct) = self.neutral_loss_adduct(f.mass, &msdec.spectrum, formate, acetate) {
                f.character.adduct = Some(adduct.clone());
                num_assigned += 1;
            }
        }
        debug!("Assigned {} adducts from MS2 neutral losses", num_assigned);
    }

    /// Scans fragments from the precursor downward for a dominant formate or
    /// acetate loss while the precursor itself is weak.
    fn neutral_loss_adduct<'a>(
        &self,
        precursor_mz: f64,
        spectrum: &[SpectrumPeak],
        formate: Option<&'a AdductIon>,
        acetate: Option<&'a AdductIon>,
    ) -> Option<&'a AdductIon> {
        let tol = self.ms2_tolerance;
        let max_intensity = spectrum.iter().map(|p| p.intensity).fold(0.0, f64::max);
        if max_intensity <= 0.0 {
            return None;
        }
        let precursor_intensity = spectrum
            .iter()
            .filter(|p| (p.mz - precursor_mz).abs() <= tol)
            .map(|p| p.intensity)
            .fold(0.0, f64::max);
        if precursor_intensity / max_intensity >= MAX_PRECURSOR_RELATIVE_INTENSITY {
            return None;
        }

        let mut descending: Vec<&SpectrumPeak> = spectrum.iter().collect();
        descending.sort_by(|a, b| b.mz.total_cmp(&a.mz));
        for peak in descending {
            if peak.mz > precursor_mz + tol {
                continue;
            }
            let loss = precursor_mz - peak.mz;
            if loss > ACETATE_LOSS.max(FORMATE_LOSS) + tol {
                break;
            }
            if peak.intensity / max_intensity <= MIN_LOSS_RELATIVE_INTENSITY {
                continue;
            }
            if formate.is_some() && (loss - FORMATE_LOSS).abs() <= tol {
                return formate;
            }
            if acetate.is_some() && (loss - ACETATE_LOSS).abs() <= tol {
                return acetate;
            }
        }
        None
    }

    /// Links a feature to a heavier one whose fragments contain its mass.
    pub(super) fn link_in_source_fragments(
        &self,
        features: &mut [Feature],
        msdec_results: &[MsDecResult],
    ) {
        let tol = self.ms2_tolerance;
        let min_rel = self.config.in_source_min_relative_intensity;
        let mut pairs: Vec<(FeatureId, FeatureId)> = Vec::new();
        for parent in features.iter() {
            let Some(msdec) = msdec_for(parent, msdec_results) else {
                continue;
            };
            let max_intensity = msdec.max_intensity();
            if max_intensity <= 0.0 {
                continue;
            }
            for fragment in features.iter() {
                if !fragment.is_monoisotopic()
                    || fragment.ion_mode != parent.ion_mode
                    || parent.mass - fragment.mass <= tol
                {
                    continue;
                }
                let found = msdec.spectrum.iter().any(|p| {
                    (p.mz - fragment.mass).abs() <= tol && p.intensity / max_intensity >= min_rel
                });
                if found {
                    pairs.push((fragment.id, parent.id));
                }
            }
        }
        let mut num_linked = 0;
        for (fragment, parent) in pairs {
            if register_link(features, fragment, parent, LinkReason::FoundInUpperMsMs) {
                num_linked += 1;
            }
        }
        debug!("Linked {} in-source fragments", num_linked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFindingConfig;

    fn negative_linker() -> PeakCharacterLinker {
        let conf = FeatureFindingConfig {
            ion_mode: IonMode::Negative,
            ..Default::default()
        };
        PeakCharacterLinker::new(&conf).unwrap()
    }

    fn msdec(feature_id: usize, precursor: f64, peaks: &[(f64, f64)]) -> MsDecResult {
        MsDecResult {
            feature_id,
            ms2_scan_index: Some(0),
            precursor_mz: precursor,
            spectrum: peaks.iter().map(|&(mz, i)| SpectrumPeak::new(mz, i)).collect(),
        }
    }

    #[test]
    fn test_formate_loss_assigns_formate() {
        let mut fs = vec![Feature::new(0, 300.0, 1e5, IonMode::Negative)];
        let results = vec![msdec(
            0,
            300.0,
            &[(120.0, 100.0), (253.9945, 85.0), (300.0, 30.0)],
        )];
        negative_linker().infer_adducts_from_neutral_loss(&mut fs, &results);
        assert_eq!(fs[0].adduct_name(), Some("[M+HCOO]-"));
    }

    #[test]
    fn test_strong_precursor_blocks_inference() {
        let mut fs = vec![Feature::new(0, 300.0, 1e5, IonMode::Negative)];
        let results = vec![msdec(
            0,
            300.0,
            &[(120.0, 100.0), (253.9945, 85.0), (300.0, 60.0)],
        )];
        negative_linker().infer_adducts_from_neutral_loss(&mut fs, &results);
        assert!(fs[0].adduct_name().is_none());
    }

    #[test]
    fn test_acetate_loss() {
        let mut fs = vec![Feature::new(0, 300.0, 1e5, IonMode::Negative)];
        let results = vec![msdec(0, 300.0, &[(239.978873, 100.0)])];
        negative_linker().infer_adducts_from_neutral_loss(&mut fs, &results);
        assert_eq!(fs[0].adduct_name(), Some("[M+CH3COO]-"));
    }

    #[test]
    fn test_positive_mode_skips_inference() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![Feature::new(0, 300.0, 1e5, IonMode::Positive)];
        let results = vec![msdec(0, 300.0, &[(253.9945, 100.0)])];
        linker.infer_adducts_from_neutral_loss(&mut fs, &results);
        assert!(fs[0].adduct_name().is_none());
    }

    #[test]
    fn test_in_source_fragment_link() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![
            Feature::new(0, 150.05, 1e4, IonMode::Positive),
            Feature::new(1, 300.1, 1e5, IonMode::Positive),
        ];
        let results = vec![
            MsDecResult::empty(0, 150.05),
            msdec(1, 300.1, &[(150.05, 40.0), (300.1, 100.0)]),
        ];
        linker.link_in_source_fragments(&mut fs, &results);
        assert!(fs[0].character.has_link(1, LinkReason::FoundInUpperMsMs));
        assert!(fs[1].character.has_link(0, LinkReason::FoundInUpperMsMs));
        assert!(fs[0].adduct_name().is_none());
    }
}
