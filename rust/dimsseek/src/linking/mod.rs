//! Groups features that come from the same molecule.
//!
//! The passes run in a fixed order over one feature arena, and later passes
//! read the adducts and links left by earlier ones:
//!
//! 1. adduct set bootstrap (plus adducts carried by confident annotations)
//! 2. InChIKey-prefix linking of identified features
//! 3. adduct projection from identified features
//! 4. formate/acetate inference from MS2 neutral losses (negative mode)
//! 5. adduct projection from any feature with a resolved adduct
//! 6. charge-aware adduct pairing of the remaining features
//! 7. chromatogram correlation, then optional in-source fragment links
//! 8. adduct and parent finalization
//! 9. connected-component group ids

mod adducts;
mod chromatogram;
mod finalize;
mod identified;
pub mod links;
mod ms2_evidence;

use dimsquery::IonMode;
use dimsquery::chromatogram::Ms1ScanIndex;
use tracing::{
    debug,
    info,
};

use crate::config::{
    FeatureFindingConfig,
    LinkingConfig,
};
use crate::errors::{
    DataProcessingError,
    Result,
};
use crate::models::{
    AdductIon,
    AnnotationEvaluator,
    Feature,
    MsDecResult,
};

pub use links::{
    assign_group_ids,
    register_link,
};

/// Tolerances are converted to ppm at this m/z before being applied at the
/// target feature's own mass.
pub const PPM_REFERENCE_MZ: f64 = 200.0;

pub const NUM_PASSES: usize = 9;

pub struct PeakCharacterLinker {
    ion_mode: IonMode,
    ms1_tolerance: f64,
    ms2_tolerance: f64,
    adducts: Vec<AdductIon>,
    config: LinkingConfig,
}

/// Read-only inputs shared by the passes.
pub struct LinkingInputs<'a> {
    pub msdec_results: &'a [MsDecResult],
    pub annotations: &'a dyn AnnotationEvaluator,
    /// MS1 scans for chromatogram extraction; `None` skips correlation.
    pub ms1_scans: Option<&'a Ms1ScanIndex>,
}

impl PeakCharacterLinker {
    pub fn new(config: &FeatureFindingConfig) -> Result<Self> {
        config.validate()?;
        let mut adducts: Vec<AdductIon> = config
            .searched_adducts()
            .into_iter()
            .filter(|a| a.included)
            .collect();
        if adducts.is_empty() {
            adducts.push(AdductIon::default_for(config.ion_mode));
        }
        debug!(
            "Searching adducts: {:?}",
            adducts.iter().map(|a| a.name.as_str()).collect::<Vec<_>>()
        );
        Ok(Self {
            ion_mode: config.ion_mode,
            ms1_tolerance: config.ms1_tolerance,
            ms2_tolerance: config.ms2_tolerance,
            adducts,
            config: config.linking.clone(),
        })
    }

    pub fn searched_adducts(&self) -> &[AdductIon] {
        &self.adducts
    }

    /// Runs every pass over `features`, which must be indexed by id.
    pub fn link(
        &self,
        features: &mut [Feature],
        inputs: &LinkingInputs<'_>,
        progress: &dyn Fn(usize, usize),
    ) -> Result<()> {
        for (position, f) in features.iter().enumerate() {
            if f.id != position {
                return Err(DataProcessingError::FeatureIdMismatch {
                    position,
                    id: f.id,
                }
                .into());
            }
        }
        let mut done = 0;
        let mut step = |name: &str| {
            done += 1;
            debug!("Finished linking pass {}/{}: {}", done, NUM_PASSES, name);
            progress(done, NUM_PASSES);
        };

        self.seed_annotated_adducts(features, inputs.annotations);
        step("adduct bootstrap");
        self.link_by_inchikey(features, inputs.annotations);
        step("inchikey");
        self.project_identified_adducts(features, inputs.annotations);
        step("identified adduct projection");
        self.infer_adducts_from_neutral_loss(features, inputs.msdec_results);
        step("neutral loss adducts");
        self.project_determined_adducts(features);
        step("determined adduct projection");
        self.pair_adducts(features);
        step("adduct pairing");
        if let Some(scans) = inputs.ms1_scans {
            self.link_by_chromatogram(features, scans);
        }
        if self.config.link_in_source_fragments {
            self.link_in_source_fragments(features, inputs.msdec_results);
        }
        step("chromatogram correlation");
        self.finalize(features);
        step("finalization");
        let num_groups = assign_group_ids(features);
        step("group ids");

        info!(
            "Linked {} features into {} groups",
            features.len(),
            num_groups
        );
        Ok(())
    }
}

/// The curated spectrum of `feature`, if it has a non-empty one.
fn msdec_for<'a>(feature: &Feature, results: &'a [MsDecResult]) -> Option<&'a MsDecResult> {
    let idx = feature.msdec_result_id.unwrap_or(feature.id);
    results
        .get(idx)
        .filter(|r| r.feature_id == feature.id && !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnnotationTable;

    #[test]
    fn test_rejects_unindexed_features() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![Feature::new(3, 100.0, 1.0, IonMode::Positive)];
        let table = AnnotationTable::new();
        let inputs = LinkingInputs {
            msdec_results: &[],
            annotations: &table,
            ms1_scans: None,
        };
        assert!(linker.link(&mut fs, &inputs, &|_, _| {}).is_err());
    }

    #[test]
    fn test_excluded_adducts_fall_back_to_default() {
        let mut conf = FeatureFindingConfig::default();
        let mut na = AdductIon::new("[M+Na]+", 22.989218, 1);
        na.included = false;
        conf.linking.searched_adducts = vec![na];
        let linker = PeakCharacterLinker::new(&conf).unwrap();
        assert_eq!(linker.searched_adducts().len(), 1);
        assert_eq!(linker.searched_adducts()[0].name, "[M+H]+");
    }

    #[test]
    fn test_progress_reports_every_pass() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![Feature::new(0, 100.0, 1.0, IonMode::Positive)];
        let table = AnnotationTable::new();
        let inputs = LinkingInputs {
            msdec_results: &[],
            annotations: &table,
            ms1_scans: None,
        };
        let seen = std::sync::Mutex::new(Vec::new());
        linker
            .link(&mut fs, &inputs, &|done, total| {
                seen.lock().unwrap().push((done, total))
            })
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), NUM_PASSES);
        assert_eq!(seen.last(), Some(&(NUM_PASSES, NUM_PASSES)));
        assert_eq!(fs[0].character.group_id, Some(0));
    }
}
