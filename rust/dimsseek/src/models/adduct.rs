use dimsquery::IonMode;
use serde::{
    Deserialize,
    Serialize,
};

pub const PROTON_MASS: f64 = 1.007276;
pub const FORMATE_ADDUCT_MASS: f64 = 44.998201;
pub const ACETATE_ADDUCT_MASS: f64 = 59.013851;
pub const FORMATE_LOSS: f64 = 46.005477;
pub const ACETATE_LOSS: f64 = 60.021127;

/// An adduct ion species such as `[M+Na]+`.
///
/// `adduct_mass` is the signed mass added to `mol_count` neutral molecules,
/// `charge` carries the polarity.
///
/// ```
/// use dimsseek::AdductIon;
/// use dimsquery::IonMode;
///
/// let h = AdductIon::default_for(IonMode::Positive);
/// let exact = h.exact_mass_from_mz(181.0707);
/// assert!((exact - 180.063424).abs() < 1e-6);
/// assert!((h.mz_from_exact_mass(exact) - 181.0707).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdductIon {
    pub name: String,
    pub adduct_mass: f64,
    pub charge: i8,
    #[serde(default = "default_mol_count")]
    pub mol_count: u8,
    #[serde(default = "default_included")]
    pub included: bool,
}

fn default_mol_count() -> u8 {
    1
}

fn default_included() -> bool {
    true
}

impl AdductIon {
    pub fn new(name: &str, adduct_mass: f64, charge: i8) -> Self {
        Self {
            name: name.to_string(),
            adduct_mass,
            charge,
            mol_count: 1,
            included: true,
        }
    }

    pub fn abs_charge(&self) -> u8 {
        self.charge.unsigned_abs().max(1)
    }

    pub fn ion_mode(&self) -> IonMode {
        if self.charge < 0 {
            IonMode::Negative
        } else {
            IonMode::Positive
        }
    }

    /// Neutral monoisotopic mass of the molecule observed at `mz`.
    pub fn exact_mass_from_mz(&self, mz: f64) -> f64 {
        (mz * self.abs_charge() as f64 - self.adduct_mass) / self.mol_count.max(1) as f64
    }

    pub fn mz_from_exact_mass(&self, exact_mass: f64) -> f64 {
        (self.mol_count.max(1) as f64 * exact_mass + self.adduct_mass) / self.abs_charge() as f64
    }

    /// `[M+H]+` or `[M-H]-`.
    pub fn default_for(mode: IonMode) -> Self {
        match mode {
            IonMode::Positive => Self::new("[M+H]+", PROTON_MASS, 1),
            IonMode::Negative => Self::new("[M-H]-", -PROTON_MASS, -1),
        }
    }

    /// The protonated (or deprotonated) species at charge `charge`.
    pub fn multiply_charged_default(mode: IonMode, charge: u8) -> Self {
        let base = Self::default_for(mode);
        if charge <= 1 {
            return base;
        }
        base.with_charge(charge).unwrap_or(base)
    }

    pub fn default_searched(mode: IonMode) -> Vec<Self> {
        match mode {
            IonMode::Positive => vec![
                Self::new("[M+H]+", PROTON_MASS, 1),
                Self::new("[M+NH4]+", 18.033823, 1),
                Self::new("[M+Na]+", 22.989218, 1),
                Self::new("[M+K]+", 38.963158, 1),
            ],
            IonMode::Negative => vec![
                Self::new("[M-H]-", -PROTON_MASS, -1),
                Self::formate(),
                Self::acetate(),
                Self::new("[M+Cl]-", 34.969402, -1),
            ],
        }
    }

    pub fn formate() -> Self {
        Self::new("[M+HCOO]-", FORMATE_ADDUCT_MASS, -1)
    }

    pub fn acetate() -> Self {
        Self::new("[M+CH3COO]-", ACETATE_ADDUCT_MASS, -1)
    }

    /// Recognizes a formate adduct by its mass, whatever it is called.
    pub fn is_formate(&self, tolerance: f64) -> bool {
        self.charge == -1 && (self.adduct_mass - FORMATE_ADDUCT_MASS).abs() <= tolerance
    }

    pub fn is_acetate(&self, tolerance: f64) -> bool {
        self.charge == -1 && (self.adduct_mass - ACETATE_ADDUCT_MASS).abs() <= tolerance
    }

    /// Re-derives a single-term adduct at charge `charge`, scaling the adduct
    /// mass: `[M+H]+` at 2 becomes `[M+2H]2+`.
    ///
    /// Returns `None` for names that are not of the form `[M±X]z±` with a
    /// single term.
    pub fn with_charge(&self, charge: u8) -> Option<Self> {
        let charge = charge.max(1);
        if charge == self.abs_charge() {
            return Some(self.clone());
        }
        if self.mol_count != 1 || self.abs_charge() != 1 {
            return None;
        }
        let inner = self.name.strip_prefix('[')?;
        let (body, _) = inner.split_once(']')?;
        let term = body.strip_prefix('M')?;
        let mut chars = term.chars();
        let sign = chars.next().filter(|c| *c == '+' || *c == '-')?;
        let species: &str = chars.as_str();
        if species.is_empty()
            || species.contains(['+', '-'])
            || species.starts_with(|c: char| c.is_ascii_digit())
        {
            return None;
        }
        let polarity = if self.charge < 0 { '-' } else { '+' };
        let magnitude = i8::try_from(charge).ok()?;
        let signed = if self.charge < 0 { -magnitude } else { magnitude };
        Some(Self {
            name: format!("[M{}{}{}]{}{}", sign, charge, species, charge, polarity),
            adduct_mass: self.adduct_mass * charge as f64,
            charge: signed,
            mol_count: 1,
            included: self.included,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sodium_projection() {
        let h = AdductIon::default_for(IonMode::Positive);
        let na = AdductIon::new("[M+Na]+", 22.989218, 1);
        let exact = h.exact_mass_from_mz(181.0707);
        let na_mz = na.mz_from_exact_mass(exact);
        assert!((na_mz - 203.052642).abs() < 1e-6);
    }

    #[test]
    fn test_with_charge_renames_and_scales() {
        let h = AdductIon::default_for(IonMode::Positive);
        let h2 = h.with_charge(2).unwrap();
        assert_eq!(h2.name, "[M+2H]2+");
        assert_eq!(h2.charge, 2);
        assert!((h2.adduct_mass - 2.0 * PROTON_MASS).abs() < 1e-12);
        // A doubly protonated molecule of mass 300 sits at 151.007276.
        assert!((h2.mz_from_exact_mass(300.0) - 151.007276).abs() < 1e-9);

        let neg = AdductIon::default_for(IonMode::Negative).with_charge(2).unwrap();
        assert_eq!(neg.name, "[M-2H]2-");
        assert_eq!(neg.charge, -2);
    }

    #[test]
    fn test_with_charge_same_charge_is_identity() {
        let na = AdductIon::new("[M+Na]+", 22.989218, 1);
        assert_eq!(na.with_charge(1).unwrap(), na);
    }

    #[test]
    fn test_with_charge_rejects_composite_names() {
        let composite = AdductIon::new("[M+H-H2O]+", PROTON_MASS - 18.010565, 1);
        assert!(composite.with_charge(2).is_none());
    }

    #[test]
    fn test_multiply_charged_default() {
        let a = AdductIon::multiply_charged_default(IonMode::Positive, 3);
        assert_eq!(a.name, "[M+3H]3+");
        let b = AdductIon::multiply_charged_default(IonMode::Negative, 1);
        assert_eq!(b.name, "[M-H]-");
    }

    #[test]
    fn test_out_of_range_charge_keeps_base_adduct() {
        let neg = AdductIon::default_for(IonMode::Negative);
        assert!(neg.with_charge(128).is_none());
        assert!(neg.with_charge(255).is_none());
        let b = AdductIon::multiply_charged_default(IonMode::Negative, 128);
        assert_eq!(b, neg);
        let p = AdductIon::multiply_charged_default(IonMode::Positive, 130);
        assert_eq!(p.name, "[M+H]+");
        assert_eq!(p.charge, 1);

        let top = AdductIon::default_for(IonMode::Negative).with_charge(127).unwrap();
        assert_eq!(top.charge, -127);
    }

    #[test]
    fn test_formate_acetate_names() {
        assert!(AdductIon::formate().is_formate(0.01));
        assert!(AdductIon::acetate().is_acetate(0.01));
        assert!(!AdductIon::default_for(IonMode::Negative).is_formate(0.01));
        let renamed = AdductIon::new("[M+FA-H]-", 44.9982, -1);
        assert!(renamed.is_formate(0.01));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let a: AdductIon =
            serde_json::from_str(r#"{"name": "[M+K]+", "adduct_mass": 38.963158, "charge": 1}"#)
                .unwrap();
        assert_eq!(a.mol_count, 1);
        assert!(a.included);
    }
}
