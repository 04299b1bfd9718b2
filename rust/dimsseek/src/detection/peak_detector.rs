use dimsquery::{
    RawSpectrum,
    SpectrumPeak,
};
use tracing::debug;

use crate::config::PeakPickingConfig;
use crate::models::{
    ChromTime,
    Feature,
};
use crate::signal::{
    ProfileSymmetryPurity,
    PurityEstimator,
    Smoother,
};

/// A local maximum of the smoothed profile and its boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPeak {
    pub left: usize,
    pub apex: usize,
    pub right: usize,
    pub amplitude: f64,
    pub purity: f32,
}

impl DetectedPeak {
    pub fn num_datapoints(&self) -> usize {
        self.right - self.left + 1
    }
}

/// Finds features on the m/z axis of the representative MS1 spectrum.
pub struct PeakDetector {
    config: PeakPickingConfig,
    smoother: Box<dyn Smoother>,
    purity: Box<dyn PurityEstimator>,
}

impl PeakDetector {
    pub fn new(config: &PeakPickingConfig) -> Self {
        Self {
            smoother: config.smoothing_method.build(config.smoothing_level),
            purity: Box::new(ProfileSymmetryPurity),
            config: config.clone(),
        }
    }

    pub fn with_smoother(mut self, smoother: Box<dyn Smoother>) -> Self {
        self.smoother = smoother;
        self
    }

    pub fn with_purity_estimator(mut self, purity: Box<dyn PurityEstimator>) -> Self {
        self.purity = purity;
        self
    }

    /// Picks peaks on an intensity profile.
    ///
    /// A point is a local maximum when the smoothed value rises into it and
    /// does not rise after it (a flat top is reported at its center).
    /// Boundaries extend outward while the smoothed values keep decreasing.
    pub fn pick_peaks(&self, intensities: &[f64]) -> Vec<DetectedPeak> {
        let n = intensities.len();
        if n == 0 {
            return Vec::new();
        }
        let s = self.smoother.smooth(intensities);
        let mut out = Vec::new();

        let mut i = 0;
        while i < n {
            let rising = i == 0 || s[i] > s[i - 1];
            if !rising || s[i] <= 0.0 {
                i += 1;
                continue;
            }
            let mut plateau_end = i;
            while plateau_end + 1 < n && s[plateau_end + 1] == s[i] {
                plateau_end += 1;
            }
            if plateau_end + 1 < n && s[plateau_end + 1] > s[i] {
                i = plateau_end + 1;
                continue;
            }

            let apex = (i + plateau_end) / 2;
            let mut left = i;
            while left > 0 && s[left - 1] < s[left] {
                left -= 1;
            }
            let mut right = plateau_end;
            while right + 1 < n && s[right + 1] < s[right] {
                right += 1;
            }

            let amplitude = (s[apex] - s[left].min(s[right])).max(0.0);
            let candidate = DetectedPeak {
                left,
                apex,
                right,
                amplitude,
                purity: self.purity.purity(&s, left, apex, right),
            };
            if candidate.num_datapoints() >= self.config.min_datapoints
                && amplitude >= self.config.min_amplitude
            {
                out.push(candidate);
            }
            i = plateau_end + 1;
        }
        out
    }

    /// Detects features in `spectrum`, numbering them by ascending m/z.
    pub fn detect(&self, spectrum: &RawSpectrum, time: ChromTime) -> Vec<Feature> {
        let profile: Vec<SpectrumPeak> = spectrum.mz_sorted_peaks();
        let intensities: Vec<f64> = profile.iter().map(|p| p.intensity).collect();
        let peaks = self.pick_peaks(&intensities);
        debug!(
            "Picked {} peaks from {} profile points",
            peaks.len(),
            profile.len()
        );

        let mut features = Vec::with_capacity(peaks.len());
        for peak in peaks {
            let apex = profile[peak.apex];
            if apex.mz < self.config.mass_range_begin || apex.mz > self.config.mass_range_end {
                continue;
            }
            let area = profile[peak.left..=peak.right]
                .windows(2)
                .map(|w| (w[1].mz - w[0].mz) * (w[0].intensity + w[1].intensity) / 2.0)
                .sum();
            let mut feature =
                Feature::new(features.len(), apex.mz, apex.intensity, spectrum.polarity)
                    .with_time(time)
                    .with_purity(peak.purity);
            feature.area = area;
            feature.amplitude = peak.amplitude;
            feature.mass_left = profile[peak.left].mz;
            feature.mass_right = profile[peak.right].mz;
            feature.ms1_scan_index = spectrum.index;
            features.push(feature);
        }
        features
    }
}
