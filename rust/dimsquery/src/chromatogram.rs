//! Extracted ion chromatograms over the MS1 scans of a run.

use crate::models::{
    MzTolerance,
    RawSpectrum,
    SpectrumPeak,
};
use crate::utils::{
    TupleRange,
    partition_range_by_key,
};
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedChromatogram {
    pub target_mz: f64,
    pub times: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl ExtractedChromatogram {
    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }
}

/// MS1 scans sorted by time, each with m/z-sorted peaks, ready for repeated
/// chromatogram extraction.
#[derive(Debug, Clone, Default)]
pub struct Ms1ScanIndex {
    times: Vec<f64>,
    peaks: Vec<Vec<SpectrumPeak>>,
}

impl Ms1ScanIndex {
    /// Indexes every MS1 scan that carries a scan time.
    pub fn new(spectra: &[RawSpectrum]) -> Self {
        let mut scans: Vec<&RawSpectrum> = spectra
            .iter()
            .filter(|s| s.is_ms1() && s.has_scan_time())
            .collect();
        scans.sort_by(|a, b| a.scan_start_time.total_cmp(&b.scan_start_time));
        Self {
            times: scans.iter().map(|s| s.scan_start_time).collect(),
            peaks: scans.par_iter().map(|s| s.mz_sorted_peaks()).collect(),
        }
    }

    pub fn num_scans(&self) -> usize {
        self.times.len()
    }

    pub fn extract(
        &self,
        target_mz: f64,
        tolerance: MzTolerance,
        time_window: TupleRange<f64>,
    ) -> ExtractedChromatogram {
        let scan_range = partition_range_by_key(&self.times, time_window, |t| *t);
        let mz_range = tolerance.mz_range(target_mz);
        let mut times = Vec::with_capacity(scan_range.len());
        let mut intensities = Vec::with_capacity(scan_range.len());
        for i in scan_range {
            let peaks = &self.peaks[i];
            let hits = partition_range_by_key(peaks, mz_range, |p| p.mz);
            times.push(self.times[i]);
            intensities.push(peaks[hits].iter().map(|p| p.intensity).sum());
        }
        ExtractedChromatogram {
            target_mz,
            times,
            intensities,
        }
    }
}

/// One-shot extraction; build an [`Ms1ScanIndex`] when extracting many traces.
pub fn extract_chromatogram(
    spectra: &[RawSpectrum],
    target_mz: f64,
    tolerance: MzTolerance,
    time_window: TupleRange<f64>,
) -> ExtractedChromatogram {
    Ms1ScanIndex::new(spectra).extract(target_mz, tolerance, time_window)
}
