use tracing::debug;

use super::PeakCharacterLinker;
use super::adducts::MassOrder;
use super::links::register_link;
use crate::models::{
    AnnotationEvaluator,
    Feature,
    LinkReason,
};

impl PeakCharacterLinker {
    /// Confident annotations that name an adduct fix it on their feature.
    pub(super) fn seed_annotated_adducts(
        &self,
        features: &mut [Feature],
        annotations: &dyn AnnotationEvaluator,
    ) {
        for f in features.iter_mut() {
            if !f.is_monoisotopic() || f.character.adduct.is_some() {
                continue;
            }
            if !annotations.is_confidently_annotated(f.id) {
                continue;
            }
            if let Some(adduct) = annotations.annotation(f.id).and_then(|a| a.adduct.clone()) {
                f.character.adduct = Some(adduct);
            }
        }
    }

    pub(super) fn link_by_inchikey(
        &self,
        features: &mut [Feature],
        annotations: &dyn AnnotationEvaluator,
    ) {
        let n = features.len();
        let mut num_linked = 0;
        for i in 0..n {
            let f = &features[i];
            if f.character.is_linked
                || !f.is_monoisotopic()
                || !annotations.is_confidently_annotated(i)
            {
                continue;
            }
            let Some(key) = annotations.short_inchikey(i) else {
                continue;
            };

            let partners: Vec<usize> = (0..n)
                .filter(|&j| {
                    j != i
                        && !features[j].character.is_linked
                        && annotations.is_confidently_annotated(j)
                        && annotations.short_inchikey(j) == Some(key)
                })
                .collect();
            if partners.is_empty() {
                continue;
            }
            for &j in partners.iter() {
                register_link(features, i, j, LinkReason::IdentifiedCompound);
                features[j].character.is_linked = true;
                features[j].character.adduct_parent = Some(i);
            }
            features[i].character.is_linked = true;
            features[i].character.adduct_parent = Some(i);
            num_linked += partners.len();
        }
        debug!("Linked {} features by InChIKey", num_linked);
    }

    pub(super) fn project_identified_adducts(
        &self,
        features: &mut [Feature],
        annotations: &dyn AnnotationEvaluator,
    ) {
        let order = MassOrder::new(features);
        let mut num_linked = 0;
        for seed in 0..features.len() {
            let f = &features[seed];
            if !f.is_monoisotopic() || f.character.adduct.is_none() {
                continue;
            }
            if !annotations.is_annotated(seed) {
                continue;
            }
            num_linked += self.project_from_seed(features, &order, seed, |target| {
                annotations.is_confidently_annotated(target.id) && target.character.adduct.is_some()
            });
        }
        debug!("Linked {} features from identified adducts", num_linked);
    }
}
