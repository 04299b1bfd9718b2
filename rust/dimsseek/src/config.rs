//! Parameters for a feature-finding run.
//!
//! Every section deserializes with defaults so a config file only has to
//! name what it changes. [`FeatureFindingConfig::validate`] is called by the
//! pipeline before any data is touched.

use dimsquery::{
    AccumulationConfig,
    IonMode,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::detection::AcquisitionType;
use crate::errors::{
    DimsSeekError,
    Result,
};
use crate::models::AdductIon;
use crate::signal::SmoothingMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFindingConfig {
    pub ion_mode: IonMode,
    /// MS1 centroid tolerance in Da.
    pub ms1_tolerance: f64,
    /// MS2 centroid tolerance in Da.
    pub ms2_tolerance: f64,
    pub accumulation: AccumulationConfig,
    pub peak_picking: PeakPickingConfig,
    pub isotopes: IsotopeConfig,
    pub ms2_matching: Ms2MatchingConfig,
    pub deconvolution: DeconvolutionConfig,
    pub linking: LinkingConfig,
}

impl Default for FeatureFindingConfig {
    fn default() -> Self {
        Self {
            ion_mode: IonMode::Positive,
            ms1_tolerance: 0.01,
            ms2_tolerance: 0.025,
            accumulation: AccumulationConfig::default(),
            peak_picking: PeakPickingConfig::default(),
            isotopes: IsotopeConfig::default(),
            ms2_matching: Ms2MatchingConfig::default(),
            deconvolution: DeconvolutionConfig::default(),
            linking: LinkingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakPickingConfig {
    pub smoothing_method: SmoothingMethod,
    /// Half-width of the smoothing window, in data points.
    pub smoothing_level: usize,
    pub min_amplitude: f64,
    pub min_datapoints: usize,
    pub mass_range_begin: f64,
    pub mass_range_end: f64,
}

impl Default for PeakPickingConfig {
    fn default() -> Self {
        Self {
            smoothing_method: SmoothingMethod::LinearWeightedMovingAverage,
            smoothing_level: 1,
            min_amplitude: 1000.0,
            min_datapoints: 3,
            mass_range_begin: 0.0,
            mass_range_end: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsotopeConfig {
    pub max_charge: u8,
    pub max_isotopes: u8,
    /// Below [`IsotopeConfig::intensity_check_max_mass`] a satellite may not
    /// be more intense than the previous member times this ratio.
    pub max_intensity_ratio: f64,
    pub intensity_check_max_mass: f64,
}

impl Default for IsotopeConfig {
    fn default() -> Self {
        Self {
            max_charge: 2,
            max_isotopes: 3,
            max_intensity_ratio: 1.0,
            intensity_check_max_mass: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Ms2MatchingConfig {
    pub acquisition_type: AcquisitionType,
    /// Precursor matching tolerance in Da, the MS1 tolerance when unset.
    pub precursor_tolerance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpectrumDataType {
    #[default]
    #[serde(rename = "centroid")]
    Centroid,
    #[serde(rename = "profile")]
    Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconvolutionConfig {
    pub ms2_data_type: SpectrumDataType,
    pub amplitude_cutoff: f64,
    /// Fraction of the most intense fragment, in [0, 1].
    pub relative_amplitude_cutoff: f64,
    pub remove_after_precursor: bool,
    /// Fragments up to this many Da above the precursor survive
    /// `remove_after_precursor`.
    pub kept_isotope_range: f64,
    pub mass_range_begin: f64,
    pub mass_range_end: f64,
    /// When set, only MS2 scans at this collision energy (within 0.5 eV) are
    /// considered when choosing the scan to deconvolute.
    pub collision_energy: Option<f64>,
}

impl Default for DeconvolutionConfig {
    fn default() -> Self {
        Self {
            ms2_data_type: SpectrumDataType::Centroid,
            amplitude_cutoff: 0.0,
            relative_amplitude_cutoff: 0.0,
            remove_after_precursor: true,
            kept_isotope_range: 5.0,
            mass_range_begin: 0.0,
            mass_range_end: 2000.0,
            collision_energy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    /// Adducts searched during pairing. Empty means the defaults for the
    /// configured ion mode.
    pub searched_adducts: Vec<AdductIon>,
    pub min_peak_purity: f32,
    pub min_chromatogram_correlation: f64,
    pub chromatogram_smoothing_method: SmoothingMethod,
    pub chromatogram_smoothing_level: usize,
    pub link_in_source_fragments: bool,
    pub in_source_min_relative_intensity: f64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            searched_adducts: Vec::new(),
            min_peak_purity: 0.9,
            min_chromatogram_correlation: 0.95,
            chromatogram_smoothing_method: SmoothingMethod::LinearWeightedMovingAverage,
            chromatogram_smoothing_level: 1,
            link_in_source_fragments: false,
            in_source_min_relative_intensity: 0.05,
        }
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DimsSeekError::config(
            field,
            format!("expected a finite non-negative number, got {}", value),
        ));
    }
    Ok(())
}

fn check_fraction(field: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DimsSeekError::config(
            field,
            format!("expected a fraction in [0, 1], got {}", value),
        ));
    }
    Ok(())
}

fn check_mass_range(field: &'static str, begin: f64, end: f64) -> Result<()> {
    check_non_negative(field, begin)?;
    check_non_negative(field, end)?;
    if begin > end {
        return Err(DimsSeekError::config(
            field,
            format!("range begin {} is above range end {}", begin, end),
        ));
    }
    Ok(())
}

impl FeatureFindingConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("ms1_tolerance", self.ms1_tolerance)?;
        check_non_negative("ms2_tolerance", self.ms2_tolerance)?;

        let acc = &self.accumulation;
        if !acc.bin_width.is_finite() || acc.bin_width <= 0.0 {
            return Err(DimsSeekError::config(
                "accumulation.bin_width",
                format!("expected a positive width, got {}", acc.bin_width),
            ));
        }
        if !acc.pivot_mz.is_finite() || acc.pivot_mz <= 0.0 {
            return Err(DimsSeekError::config(
                "accumulation.pivot_mz",
                format!("expected a positive m/z, got {}", acc.pivot_mz),
            ));
        }

        let pp = &self.peak_picking;
        check_non_negative("peak_picking.min_amplitude", pp.min_amplitude)?;
        if pp.min_datapoints == 0 {
            return Err(DimsSeekError::config(
                "peak_picking.min_datapoints",
                "at least one data point is required",
            ));
        }
        check_mass_range(
            "peak_picking.mass_range",
            pp.mass_range_begin,
            pp.mass_range_end,
        )?;

        if let Some(tol) = self.ms2_matching.precursor_tolerance {
            check_non_negative("ms2_matching.precursor_tolerance", tol)?;
        }

        if self.isotopes.max_charge == 0 {
            return Err(DimsSeekError::config(
                "isotopes.max_charge",
                "charge states start at 1",
            ));
        }
        if self.isotopes.max_charge > i8::MAX as u8 {
            return Err(DimsSeekError::config(
                "isotopes.max_charge",
                format!("charge states above {} are not representable", i8::MAX),
            ));
        }
        check_non_negative(
            "isotopes.max_intensity_ratio",
            self.isotopes.max_intensity_ratio,
        )?;

        let dc = &self.deconvolution;
        check_non_negative("deconvolution.amplitude_cutoff", dc.amplitude_cutoff)?;
        check_fraction(
            "deconvolution.relative_amplitude_cutoff",
            dc.relative_amplitude_cutoff,
        )?;
        check_non_negative("deconvolution.kept_isotope_range", dc.kept_isotope_range)?;
        check_mass_range(
            "deconvolution.mass_range",
            dc.mass_range_begin,
            dc.mass_range_end,
        )?;

        let lk = &self.linking;
        check_fraction("linking.min_peak_purity", lk.min_peak_purity as f64)?;
        if !(-1.0..=1.0).contains(&lk.min_chromatogram_correlation) {
            return Err(DimsSeekError::config(
                "linking.min_chromatogram_correlation",
                format!(
                    "expected a correlation in [-1, 1], got {}",
                    lk.min_chromatogram_correlation
                ),
            ));
        }
        check_fraction(
            "linking.in_source_min_relative_intensity",
            lk.in_source_min_relative_intensity,
        )?;
        for adduct in lk.searched_adducts.iter() {
            if adduct.charge == 0 || adduct.mol_count == 0 {
                return Err(DimsSeekError::config(
                    "linking.searched_adducts",
                    format!(
                        "adduct {} needs a non-zero charge and molecule count",
                        adduct.name
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn precursor_tolerance(&self) -> f64 {
        self.ms2_matching
            .precursor_tolerance
            .unwrap_or(self.ms1_tolerance)
    }

    /// Searched adducts for this run, falling back to the ion-mode defaults.
    pub fn searched_adducts(&self) -> Vec<AdductIon> {
        if self.linking.searched_adducts.is_empty() {
            AdductIon::default_searched(self.ion_mode)
        } else {
            self.linking.searched_adducts.clone()
        }
    }
}
