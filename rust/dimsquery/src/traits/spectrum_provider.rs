use std::future::Future;

use crate::errors::Result;
use crate::models::RawSpectrum;
use crate::utils::TupleRange;

/// Read-only source of scans for one analysis run.
///
/// Implementations wrap whatever produces [`RawSpectrum`] records (a vendor
/// reader, an mzML parser, a JSON dump). Processing code only ever sees the
/// sequence of spectra and never assumes a file format.
///
/// # Example
///
/// ```
/// use dimsquery::{InMemorySpectra, IonMode, RawSpectrum, SpectrumPeak, SpectrumProvider};
///
/// let provider = InMemorySpectra::new(vec![
///     RawSpectrum::new(7, 1, IonMode::Positive, vec![SpectrumPeak::new(100.0, 1.0)]),
/// ]);
/// assert_eq!(provider.load_ms1_spectra().unwrap().len(), 1);
/// assert!(provider.load_spectrum(7).is_ok());
/// assert!(provider.load_spectrum(8).is_err());
/// ```
pub trait SpectrumProvider: Send + Sync {
    /// Every scan in acquisition order.
    fn load_all_spectra(&self) -> Result<Vec<RawSpectrum>>;

    fn load_ms1_spectra(&self) -> Result<Vec<RawSpectrum>> {
        self.load_msn_spectra(1)
    }

    /// Scans at exactly `ms_level`.
    fn load_msn_spectra(&self, ms_level: u8) -> Result<Vec<RawSpectrum>> {
        Ok(self
            .load_all_spectra()?
            .into_iter()
            .filter(|s| s.ms_level == ms_level)
            .collect())
    }

    /// A single scan by its stable index.
    fn load_spectrum(&self, index: usize) -> Result<RawSpectrum>;

    /// Scans whose start time falls inside `range` (inclusive).
    ///
    /// Scans without a time axis are never part of a time range.
    fn load_spectra_in_time_range(&self, range: TupleRange<f64>) -> Result<Vec<RawSpectrum>> {
        Ok(self
            .load_all_spectra()?
            .into_iter()
            .filter(|s| s.has_scan_time() && range.contains(s.scan_start_time))
            .collect())
    }
}

/// Asynchronous counterpart of [`SpectrumProvider`].
///
/// Every synchronous provider gets this for free; readers backed by real
/// asynchronous I/O can implement it directly instead.
pub trait AsyncSpectrumProvider: Send + Sync {
    fn load_all_spectra_async(&self) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send;
    fn load_ms1_spectra_async(&self) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send;
    fn load_msn_spectra_async(
        &self,
        ms_level: u8,
    ) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send;
    fn load_spectrum_async(&self, index: usize)
    -> impl Future<Output = Result<RawSpectrum>> + Send;
    fn load_spectra_in_time_range_async(
        &self,
        range: TupleRange<f64>,
    ) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send;
}

impl<P: SpectrumProvider> AsyncSpectrumProvider for P {
    fn load_all_spectra_async(&self) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send {
        async move { self.load_all_spectra() }
    }

    fn load_ms1_spectra_async(&self) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send {
        async move { self.load_ms1_spectra() }
    }

    fn load_msn_spectra_async(
        &self,
        ms_level: u8,
    ) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send {
        async move { self.load_msn_spectra(ms_level) }
    }

    fn load_spectrum_async(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<RawSpectrum>> + Send {
        async move { self.load_spectrum(index) }
    }

    fn load_spectra_in_time_range_async(
        &self,
        range: TupleRange<f64>,
    ) -> impl Future<Output = Result<Vec<RawSpectrum>>> + Send {
        async move { self.load_spectra_in_time_range(range) }
    }
}
