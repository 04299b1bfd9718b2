use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;

use tracing::{
    info,
    warn,
};

use crate::errors::{
    DataProcessingError,
    DataReadingError,
    Result,
};
use crate::models::RawSpectrum;
use crate::traits::SpectrumProvider;

/// Spectra held in memory, in acquisition order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySpectra {
    spectra: Vec<RawSpectrum>,
    position_by_index: HashMap<usize, usize>,
}

impl InMemorySpectra {
    pub fn new(spectra: Vec<RawSpectrum>) -> Self {
        let mut position_by_index = HashMap::with_capacity(spectra.len());
        for (pos, spectrum) in spectra.iter().enumerate() {
            if position_by_index.insert(spectrum.index, pos).is_some() {
                warn!(
                    "Duplicate spectrum index {}, lookups will return the last one",
                    spectrum.index
                );
            }
        }
        Self {
            spectra,
            position_by_index,
        }
    }

    /// Like [`InMemorySpectra::new`], but rejects peaks with a non-finite or
    /// negative m/z or intensity.
    pub fn try_new(spectra: Vec<RawSpectrum>) -> Result<Self> {
        for spectrum in spectra.iter() {
            let bad_peak = spectrum.peaks.iter().find(|p| {
                !(p.mz.is_finite() && p.intensity.is_finite() && p.mz >= 0.0 && p.intensity >= 0.0)
            });
            if let Some(p) = bad_peak {
                return Err(DataProcessingError::ExpectedFiniteData {
                    spectrum_index: spectrum.index,
                    mz: p.mz,
                    intensity: p.intensity,
                }
                .into());
            }
        }
        Ok(Self::new(spectra))
    }

    /// Reads a JSON array of [`RawSpectrum`] records.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| DataReadingError::Io {
            source: e,
            path: Some(path.to_path_buf()),
        })?;
        let spectra: Vec<RawSpectrum> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| DataReadingError::Parse {
                source: e,
                context: "spectra file",
            })?;
        info!("Loaded {} spectra from {}", spectra.len(), path.display());
        Self::try_new(spectra)
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

impl SpectrumProvider for InMemorySpectra {
    fn load_all_spectra(&self) -> Result<Vec<RawSpectrum>> {
        Ok(self.spectra.clone())
    }

    fn load_msn_spectra(&self, ms_level: u8) -> Result<Vec<RawSpectrum>> {
        Ok(self
            .spectra
            .iter()
            .filter(|s| s.ms_level == ms_level)
            .cloned()
            .collect())
    }

    fn load_spectrum(&self, index: usize) -> Result<RawSpectrum> {
        self.position_by_index
            .get(&index)
            .map(|&pos| self.spectra[pos].clone())
            .ok_or_else(|| DataReadingError::SpectrumNotFound { index }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DimsqueryError;
    use crate::models::{
        IonMode,
        SpectrumPeak,
    };

    fn spectrum(index: usize, peaks: &[(f64, f64)]) -> RawSpectrum {
        RawSpectrum::new(
            index,
            1,
            IonMode::Positive,
            peaks.iter().map(|&(mz, i)| SpectrumPeak::new(mz, i)).collect(),
        )
    }

    #[test]
    fn test_try_new_accepts_clean_peaks() {
        let provider =
            InMemorySpectra::try_new(vec![spectrum(0, &[(100.0, 1.0), (101.0, 0.0)])]).unwrap();
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_try_new_rejects_non_finite_peaks() {
        let bad = vec![
            spectrum(0, &[(100.0, 1.0)]),
            spectrum(5, &[(100.0, f64::NAN)]),
        ];
        match InMemorySpectra::try_new(bad) {
            Err(DimsqueryError::DataProcessingError(
                DataProcessingError::ExpectedFiniteData { spectrum_index, .. },
            )) => assert_eq!(spectrum_index, 5),
            other => panic!("Expected a data processing error, got {:?}", other),
        }
        assert!(InMemorySpectra::try_new(vec![spectrum(1, &[(f64::INFINITY, 1.0)])]).is_err());
    }

    #[test]
    fn test_try_new_rejects_negative_values() {
        assert!(InMemorySpectra::try_new(vec![spectrum(0, &[(-5.0, 1.0)])]).is_err());
        assert!(InMemorySpectra::try_new(vec![spectrum(0, &[(100.0, -1.0)])]).is_err());
    }
}
