use serde::{
    Deserialize,
    Serialize,
};

use crate::utils::TupleRange;

/// Scan polarity, which is also the ion mode of every feature found in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IonMode {
    #[default]
    #[serde(rename = "positive")]
    Positive,
    #[serde(rename = "negative")]
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPeak {
    pub mz: f64,
    pub intensity: f64,
}

impl SpectrumPeak {
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self { mz, intensity }
    }
}

/// Isolation window of an MSn scan.
///
/// Offsets are positive distances from the target, so the isolated range is
/// `[target - lower_offset, target + upper_offset]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecursorWindow {
    pub isolation_target_mz: f64,
    #[serde(default)]
    pub isolation_lower_offset: f64,
    #[serde(default)]
    pub isolation_upper_offset: f64,
    #[serde(default)]
    pub collision_energy: f64,
}

impl PrecursorWindow {
    /// Isolated m/z range padded by `tolerance` on both sides.
    pub fn padded_isolation_range(&self, tolerance: f64) -> TupleRange<f64> {
        TupleRange::new_widening(
            self.isolation_target_mz - self.isolation_lower_offset - tolerance,
            self.isolation_target_mz + self.isolation_upper_offset + tolerance,
        )
    }
}

fn missing_scan_time() -> f64 {
    -1.0
}

/// One instrument scan.
///
/// Spectra handed out by a [`crate::SpectrumProvider`] are never mutated;
/// processing that needs a different spectrum builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpectrum {
    pub index: usize,
    pub ms_level: u8,
    pub polarity: IonMode,
    /// Scan start time in minutes, negative when the data has no time axis.
    #[serde(default = "missing_scan_time")]
    pub scan_start_time: f64,
    pub total_ion_current: f64,
    pub base_peak_intensity: f64,
    pub peaks: Vec<SpectrumPeak>,
    #[serde(default)]
    pub precursor: Option<PrecursorWindow>,
}

impl RawSpectrum {
    /// Builds a spectrum, deriving TIC and base peak intensity from the peaks.
    pub fn new(index: usize, ms_level: u8, polarity: IonMode, peaks: Vec<SpectrumPeak>) -> Self {
        let total_ion_current = peaks.iter().map(|p| p.intensity).sum();
        let base_peak_intensity = peaks.iter().map(|p| p.intensity).fold(0.0, f64::max);
        Self {
            index,
            ms_level,
            polarity,
            scan_start_time: missing_scan_time(),
            total_ion_current,
            base_peak_intensity,
            peaks,
            precursor: None,
        }
    }

    pub fn with_precursor(mut self, precursor: PrecursorWindow) -> Self {
        self.precursor = Some(precursor);
        self
    }

    pub fn with_scan_start_time(mut self, minutes: f64) -> Self {
        self.scan_start_time = minutes;
        self
    }

    pub fn is_ms1(&self) -> bool {
        self.ms_level == 1
    }

    pub fn has_scan_time(&self) -> bool {
        self.scan_start_time >= 0.0
    }

    /// Peaks sorted by m/z, duplicates kept.
    pub fn mz_sorted_peaks(&self) -> Vec<SpectrumPeak> {
        let mut peaks = self.peaks.clone();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_tic_and_base_peak() {
        let spec = RawSpectrum::new(
            3,
            1,
            IonMode::Positive,
            vec![SpectrumPeak::new(100.0, 10.0), SpectrumPeak::new(101.0, 30.0)],
        );
        assert_eq!(spec.total_ion_current, 40.0);
        assert_eq!(spec.base_peak_intensity, 30.0);
        assert!(!spec.has_scan_time());
    }

    #[test]
    fn test_padded_isolation_range() {
        let window = PrecursorWindow {
            isolation_target_mz: 500.0,
            isolation_lower_offset: 12.5,
            isolation_upper_offset: 12.5,
            collision_energy: 35.0,
        };
        let range = window.padded_isolation_range(0.01);
        assert!(range.contains(487.495));
        assert!(range.contains(512.51));
        assert!(!range.contains(512.52));
    }

    #[test]
    fn test_deserialize_defaults() {
        let raw = r#"{
            "index": 0, "ms_level": 1, "polarity": "negative",
            "total_ion_current": 1.0, "base_peak_intensity": 1.0,
            "peaks": [{"mz": 100.0, "intensity": 1.0}]
        }"#;
        let spec: RawSpectrum = serde_json::from_str(raw).unwrap();
        assert_eq!(spec.polarity, IonMode::Negative);
        assert!(spec.precursor.is_none());
        assert!(spec.scan_start_time < 0.0);
    }
}
