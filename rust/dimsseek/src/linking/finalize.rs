use tracing::warn;

use super::PeakCharacterLinker;
use crate::models::{
    AdductIon,
    Feature,
    FeatureId,
};

impl PeakCharacterLinker {
    /// Gives every feature an adduct and a root adduct parent.
    ///
    /// Monoisotopic features default to the charge-matched standard adduct
    /// and to being their own parent. Isotope satellites copy both from
    /// their isotope parent. Parent chains are then collapsed to their root.
    pub(super) fn finalize(&self, features: &mut [Feature]) {
        let n = features.len();
        for f in features.iter_mut().filter(|f| f.is_monoisotopic()) {
            f.character.adduct_parent.get_or_insert(f.id);
            if f.character.adduct.is_none() {
                f.character.adduct = Some(AdductIon::multiply_charged_default(f.ion_mode, f.charge));
            }
        }

        for i in 0..n {
            if features[i].is_monoisotopic() {
                continue;
            }
            let parent = features[i]
                .character
                .isotope_parent
                .filter(|&p| p < n && p != i && features[p].is_monoisotopic());
            let (adduct, adduct_parent) = match parent {
                Some(p) => (
                    features[p].character.adduct.clone(),
                    features[p].character.adduct_parent.unwrap_or(p),
                ),
                None => {
                    warn!(
                        "Isotope feature {} has no monoisotopic parent ({:?}), treating it as its own",
                        i, features[i].character.isotope_parent
                    );
                    let f = &features[i];
                    (Some(AdductIon::multiply_charged_default(f.ion_mode, f.charge)), i)
                }
            };
            let c = &mut features[i].character;
            c.adduct = adduct;
            c.adduct_parent = Some(adduct_parent);
        }

        let parents: Vec<FeatureId> = features
            .iter()
            .map(|f| f.character.adduct_parent.filter(|&p| p < n).unwrap_or(f.id))
            .collect();
        for (i, f) in features.iter_mut().enumerate() {
            let mut root = parents[i];
            let mut steps = 0;
            while parents[root] != root && steps < n {
                root = parents[root];
                steps += 1;
            }
            f.character.adduct_parent = Some(root);
        }
    }
}
