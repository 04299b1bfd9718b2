use dimsquery::utils::tolerance_ranges::{
    da_to_ppm,
    ppm_to_da,
};
use tracing::debug;

use super::links::register_link;
use super::{
    PPM_REFERENCE_MZ,
    PeakCharacterLinker,
};
use crate::models::{
    AdductIon,
    Feature,
    FeatureId,
    LinkReason,
};

/// Feature ids ordered by m/z, for windowed lookups of projected ions.
pub(super) struct MassOrder {
    order: Vec<(f64, FeatureId)>,
}

impl MassOrder {
    pub(super) fn new(features: &[Feature]) -> Self {
        let mut order: Vec<(f64, FeatureId)> =
            features.iter().enumerate().map(|(i, f)| (f.mass, i)).collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Self { order }
    }

    /// Ids with an m/z within `slack` of `target`, in ascending m/z.
    fn around(&self, target: f64, slack: f64) -> impl Iterator<Item = FeatureId> + '_ {
        let start = self.order.partition_point(|(mass, _)| *mass < target - slack);
        self.order[start..]
            .iter()
            .take_while(move |(mass, _)| *mass <= target + slack)
            .map(|(_, id)| *id)
    }
}

impl PeakCharacterLinker {
    /// Absolute tolerance at `mass`, from the MS1 tolerance expressed as ppm
    /// at the reference m/z.
    pub(super) fn tolerance_at(&self, mass: f64) -> f64 {
        ppm_to_da(mass, da_to_ppm(PPM_REFERENCE_MZ, self.ms1_tolerance))
    }

    /// Search window around a projected m/z. Wider than the tolerance at
    /// `target` since the tolerance is evaluated at the candidate's m/z.
    fn search_slack(&self, target: f64) -> f64 {
        2.0 * self.tolerance_at(target)
    }

    fn is_free_target(&self, features: &[Feature], source: FeatureId, j: FeatureId) -> bool {
        let f = &features[j];
        j != source
            && !f.character.is_linked
            && f.is_monoisotopic()
            && f.ion_mode == features[source].ion_mode
    }

    /// Projects the seed's neutral mass through every other searched adduct
    /// and links the unlinked features found there.
    ///
    /// Targets for which `require_same_adduct` holds only match when their
    /// current adduct has the projected name. Returns the number of links.
    pub(super) fn project_from_seed(
        &self,
        features: &mut [Feature],
        order: &MassOrder,
        seed: FeatureId,
        require_same_adduct: impl Fn(&Feature) -> bool,
    ) -> usize {
        let Some(seed_adduct) = features[seed].character.adduct.clone() else {
            return 0;
        };
        let exact_mass = seed_adduct.exact_mass_from_mz(features[seed].mass);
        let root = features[seed].character.adduct_parent.unwrap_or(seed);

        let mut matches: Vec<(FeatureId, &AdductIon)> = Vec::new();
        for adduct in self.adducts.iter() {
            if adduct.name == seed_adduct.name {
                continue;
            }
            let target_mz = adduct.mz_from_exact_mass(exact_mass);
            for j in order.around(target_mz, self.search_slack(target_mz)) {
                if !self.is_free_target(features, seed, j) {
                    continue;
                }
                let f = &features[j];
                if require_same_adduct(f) && f.adduct_name() != Some(adduct.name.as_str()) {
                    continue;
                }
                if matches.iter().any(|(m, _)| *m == j) {
                    continue;
                }
                if (f.mass - target_mz).abs() <= self.tolerance_at(f.mass) {
                    matches.push((j, adduct));
                }
            }
        }

        for &(j, adduct) in matches.iter() {
            let c = &mut features[j].character;
            c.adduct = Some(adduct.clone());
            c.is_linked = true;
            c.adduct_parent = Some(root);
            register_link(features, seed, j, LinkReason::Adduct);
        }
        if !matches.is_empty() {
            let c = &mut features[seed].character;
            c.is_linked = true;
            c.adduct_parent.get_or_insert(seed);
        }
        matches.len()
    }

    pub(super) fn project_determined_adducts(&self, features: &mut [Feature]) {
        let order = MassOrder::new(features);
        let mut num_linked = 0;
        for seed in 0..features.len() {
            let f = &features[seed];
            if !f.is_monoisotopic() || f.character.adduct.is_none() {
                continue;
            }
            num_linked += self.project_from_seed(features, &order, seed, |target| {
                target.character.adduct.is_some()
            });
        }
        debug!("Linked {} features from determined adducts", num_linked);
    }

    /// Tries each searched adduct as the central species of every remaining
    /// feature; the first hypothesis that explains at least one sibling wins.
    pub(super) fn pair_adducts(&self, features: &mut [Feature]) {
        let order = MassOrder::new(features);
        let mut num_pairs = 0;
        for i in 0..features.len() {
            let f = &features[i];
            if f.character.is_linked || !f.is_monoisotopic() || f.character.adduct.is_some() {
                continue;
            }
            for central_base in self.adducts.iter() {
                if central_base.ion_mode() != f.ion_mode {
                    continue;
                }
                let Some(central) = central_base.with_charge(f.charge) else {
                    continue;
                };
                let exact_mass = central.exact_mass_from_mz(f.mass);

                let mut siblings: Vec<(FeatureId, &AdductIon)> = Vec::new();
                for sibling in self.adducts.iter() {
                    if sibling.name == central_base.name || sibling.ion_mode() != f.ion_mode {
                        continue;
                    }
                    let target_mz = sibling.mz_from_exact_mass(exact_mass);
                    for j in order.around(target_mz, self.search_slack(target_mz)) {
                        if !self.is_free_target(features, i, j) {
                            continue;
                        }
                        let other = &features[j];
                        if other
                            .adduct_name()
                            .is_some_and(|name| name != sibling.name)
                        {
                            continue;
                        }
                        if siblings.iter().any(|(s, _)| *s == j) {
                            continue;
                        }
                        if (other.mass - target_mz).abs() <= self.tolerance_at(other.mass) {
                            siblings.push((j, sibling));
                        }
                    }
                }
                if siblings.is_empty() {
                    continue;
                }

                let c = &mut features[i].character;
                c.adduct = Some(central);
                c.is_linked = true;
                c.adduct_parent = Some(i);
                for &(j, sibling) in siblings.iter() {
                    let c = &mut features[j].character;
                    c.adduct = Some(sibling.clone());
                    c.is_linked = true;
                    c.adduct_parent = Some(i);
                    register_link(features, i, j, LinkReason::Adduct);
                }
                num_pairs += siblings.len();
                break;
            }
        }
        debug!("Paired {} features by adduct mass differences", num_pairs);
    }
}
