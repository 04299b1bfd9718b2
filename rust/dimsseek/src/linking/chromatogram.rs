use dimsquery::chromatogram::Ms1ScanIndex;
use dimsquery::{
    MzTolerance,
    TupleRange,
};
use rayon::prelude::*;
use tracing::debug;

use super::PeakCharacterLinker;
use super::links::register_link;
use crate::models::{
    Feature,
    FeatureId,
    LinkReason,
};
use crate::signal::Smoother;
use crate::utils::correlation::pearson_correlation;

const MIN_TRACE_POINTS: usize = 3;

fn time_window(f: &Feature) -> TupleRange<f64> {
    TupleRange::new_widening(f.time.left, f.time.right)
}

fn smoothed_trace(
    scans: &Ms1ScanIndex,
    smoother: &dyn Smoother,
    mass: f64,
    tolerance: MzTolerance,
    window: TupleRange<f64>,
) -> Option<Vec<f64>> {
    let chrom = scans.extract(mass, tolerance, window);
    if chrom.len() < MIN_TRACE_POINTS {
        return None;
    }
    Some(smoother.smooth(&chrom.intensities))
}

impl PeakCharacterLinker {
    /// Links pure features whose extracted chromatograms correlate.
    ///
    /// Pairs are scored in parallel over a read-only view of the features,
    /// links are written afterwards.
    pub(super) fn link_by_chromatogram(&self, features: &mut [Feature], scans: &Ms1ScanIndex) {
        if features.first().is_none_or(|f| !f.time.has_time()) {
            debug!("No time axis, skipping chromatogram correlation");
            return;
        }
        let view: &[Feature] = features;
        let smoother = self
            .config
            .chromatogram_smoothing_method
            .build(self.config.chromatogram_smoothing_level);
        let tolerance = MzTolerance::Absolute(self.ms1_tolerance);
        let min_corr = self.config.min_chromatogram_correlation;

        let candidates: Vec<FeatureId> = view
            .iter()
            .filter(|f| f.peak_purity >= self.config.min_peak_purity && f.time.has_time())
            .map(|f| f.id)
            .collect();
        let traces: Vec<Option<Vec<f64>>> = candidates
            .par_iter()
            .map(|&id| {
                let f = &view[id];
                smoothed_trace(scans, smoother.as_ref(), f.mass, tolerance, time_window(f))
            })
            .collect();

        let pairs: Vec<(FeatureId, FeatureId)> = (0..candidates.len())
            .into_par_iter()
            .flat_map(|ai| {
                let mut out = Vec::new();
                let Some(trace_a) = traces[ai].as_ref() else {
                    return out;
                };
                let fa = &view[candidates[ai]];
                for bi in (ai + 1)..candidates.len() {
                    let fb = &view[candidates[bi]];
                    if fa.character.links.iter().any(|l| l.linked_id == fb.id) {
                        continue;
                    }
                    let extracted;
                    let trace_b = if fa.time.left == fb.time.left && fa.time.right == fb.time.right {
                        match traces[bi].as_ref() {
                            Some(t) => t,
                            None => continue,
                        }
                    } else {
                        match smoothed_trace(scans, smoother.as_ref(), fb.mass, tolerance, time_window(fa)) {
                            Some(t) => {
                                extracted = t;
                                &extracted
                            }
                            None => continue,
                        }
                    };
                    if trace_b.len() != trace_a.len() {
                        continue;
                    }
                    if let Ok(r) = pearson_correlation(trace_a, trace_b) {
                        if r > min_corr {
                            out.push((fa.id, fb.id));
                        }
                    }
                }
                out
            })
            .collect();

        let mut num_linked = 0;
        for (a, b) in pairs {
            if register_link(features, a, b, LinkReason::ChromatogramSimilar) {
                num_linked += 1;
            }
        }
        debug!(
            "Linked {} feature pairs by chromatogram correlation over {} candidates",
            num_linked,
            candidates.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFindingConfig;
    use crate::models::ChromTime;
    use dimsquery::{
        IonMode,
        RawSpectrum,
        SpectrumPeak,
    };

    fn scans() -> Ms1ScanIndex {
        let shape = [1.0, 3.0, 7.0, 10.0, 6.0, 2.0, 1.0];
        let noise = [5.0, 1.0, 6.0, 2.0, 7.0, 1.0, 4.0];
        let spectra: Vec<RawSpectrum> = (0..shape.len())
            .map(|i| {
                RawSpectrum::new(
                    i,
                    1,
                    IonMode::Positive,
                    vec![
                        SpectrumPeak::new(100.0, 100.0 * shape[i]),
                        SpectrumPeak::new(200.0, 30.0 * shape[i] + 5.0),
                        SpectrumPeak::new(300.0, 50.0 * noise[i]),
                    ],
                )
                .with_scan_start_time(i as f64 * 0.1)
            })
            .collect();
        Ms1ScanIndex::new(&spectra)
    }

    fn feature(id: usize, mass: f64) -> Feature {
        Feature::new(id, mass, 1e4, IonMode::Positive).with_time(ChromTime {
            apex: 0.3,
            left: 0.0,
            right: 0.6,
        })
    }

    #[test]
    fn test_co_eluting_features_are_linked() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![feature(0, 100.0), feature(1, 200.0), feature(2, 300.0)];
        linker.link_by_chromatogram(&mut fs, &scans());
        assert!(fs[0].character.has_link(1, LinkReason::ChromatogramSimilar));
        assert!(fs[1].character.has_link(0, LinkReason::ChromatogramSimilar));
        assert!(fs[2].character.links.is_empty());
    }

    #[test]
    fn test_impure_features_are_skipped() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![feature(0, 100.0), feature(1, 200.0).with_purity(0.5)];
        linker.link_by_chromatogram(&mut fs, &scans());
        assert!(fs[0].character.links.is_empty());
    }

    #[test]
    fn test_missing_time_axis_skips_pass() {
        let linker = PeakCharacterLinker::new(&FeatureFindingConfig::default()).unwrap();
        let mut fs = vec![
            Feature::new(0, 100.0, 1e4, IonMode::Positive),
            feature(1, 200.0),
            feature(2, 100.0),
        ];
        linker.link_by_chromatogram(&mut fs, &scans());
        assert!(fs.iter().all(|f| f.character.links.is_empty()));
    }
}
