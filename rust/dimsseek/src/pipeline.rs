//! Staged feature-finding run over one spectrum provider.
//!
//! Stages run in a fixed order and each consumes the complete output of the
//! previous one:
//!
//! 1. **Accumulate**: load every scan and reduce the MS1 scans to one
//!    representative spectrum
//! 2. **Detect**: pick peaks on the representative MS1 profile
//! 3. **Isotopes**: group features into isotopic envelopes
//! 4. **Match MS2**: attach candidate MS2 scans to every feature
//! 5. **Deconvolute**: curate one MS2 spectrum per feature
//! 6. **Link**: group features into putative compounds
//!
//! Stage boundaries are the only cancellation checkpoints. A failed or
//! cancelled run hands back everything computed by the stages that finished.

use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::time::Instant;

use dimsquery::chromatogram::Ms1ScanIndex;
use dimsquery::{
    RawSpectrum,
    SpectrumAccumulator,
    SpectrumProvider,
};
use serde::Serialize;
use tracing::{
    debug,
    info,
    warn,
};

use crate::config::FeatureFindingConfig;
use crate::deconvolution::Ms2Deconvoluter;
use crate::detection::{
    IsotopeEstimator,
    Ms2Matcher,
    PeakDetector,
};
use crate::errors::{
    DimsSeekError,
    Result,
};
use crate::linking::{
    LinkingInputs,
    PeakCharacterLinker,
};
use crate::models::{
    AnnotationEvaluator,
    ChromTime,
    Feature,
    MsDecResult,
};
use crate::utils::timings::StageTimings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Accumulate,
    DetectPeaks,
    EstimateIsotopes,
    MatchMs2,
    Deconvolute,
    LinkFeatures,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Accumulate,
        Stage::DetectPeaks,
        Stage::EstimateIsotopes,
        Stage::MatchMs2,
        Stage::Deconvolute,
        Stage::LinkFeatures,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Accumulate => "spectrum accumulation",
            Stage::DetectPeaks => "peak detection",
            Stage::EstimateIsotopes => "isotope estimation",
            Stage::MatchMs2 => "MS2 matching",
            Stage::Deconvolute => "MS2 deconvolution",
            Stage::LinkFeatures => "feature linking",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared flag checked by a running pipeline before each stage.
///
/// Clones observe the same flag, so one can be handed to a signal handler or
/// another thread while the run holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outputs of a run, filled in stage by stage.
#[derive(Debug, Default)]
pub struct AnalysisRun {
    /// Accumulated spectra: the representative MS1 scan followed by every
    /// MSn scan, indexed from 0.
    pub spectra: Vec<RawSpectrum>,
    /// Indexed by feature id.
    pub features: Vec<Feature>,
    /// Indexed by feature id.
    pub msdec_results: Vec<MsDecResult>,
    pub completed_stages: Vec<Stage>,
    pub timings: StageTimings,
}

impl AnalysisRun {
    pub fn is_complete(&self) -> bool {
        self.completed_stages.len() == Stage::ALL.len()
    }
}

#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub error: DimsSeekError,
    pub partial: Box<AnalysisRun>,
}

impl std::fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature finding failed during {} ({} of {} stages completed): {}",
            self.stage,
            self.partial.completed_stages.len(),
            Stage::ALL.len(),
            self.error
        )
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// State carried between stages that is not part of the run's outputs.
#[derive(Default)]
struct RunContext {
    ms1_scans: Ms1ScanIndex,
    infusion_time: ChromTime,
}

pub struct FeatureFindingPipeline {
    config: FeatureFindingConfig,
    accumulator: SpectrumAccumulator,
    detector: PeakDetector,
    isotopes: IsotopeEstimator,
    deconvoluter: Ms2Deconvoluter,
    linker: PeakCharacterLinker,
}

impl FeatureFindingPipeline {
    pub fn new(config: FeatureFindingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            accumulator: SpectrumAccumulator::new(config.accumulation),
            detector: PeakDetector::new(&config.peak_picking),
            isotopes: IsotopeEstimator::new(&config.isotopes, config.ms1_tolerance),
            deconvoluter: Ms2Deconvoluter::new(&config.deconvolution, config.ms2_tolerance),
            linker: PeakCharacterLinker::new(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &FeatureFindingConfig {
        &self.config
    }

    /// Runs every stage in order.
    ///
    /// `progress` is called with `(completed, total)` stages after each stage
    /// finishes.
    pub fn run<P: SpectrumProvider + ?Sized>(
        &self,
        provider: &P,
        annotations: &dyn AnnotationEvaluator,
        progress: &dyn Fn(usize, usize),
        cancel: &CancellationToken,
    ) -> std::result::Result<AnalysisRun, PipelineFailure> {
        let mut run = AnalysisRun::default();
        let mut ctx = RunContext::default();

        for stage in Stage::ALL {
            if cancel.is_cancelled() {
                warn!("Run cancelled before {}", stage);
                return Err(PipelineFailure {
                    stage,
                    error: DimsSeekError::Cancelled { stage },
                    partial: Box::new(run),
                });
            }
            let start = Instant::now();
            let outcome = self.run_stage(stage, provider, annotations, &mut run, &mut ctx);
            let elapsed = start.elapsed();
            run.timings.record(stage, elapsed);
            if let Err(error) = outcome {
                return Err(PipelineFailure {
                    stage,
                    error,
                    partial: Box::new(run),
                });
            }
            info!("Finished {} in {:?}", stage, elapsed);
            run.completed_stages.push(stage);
            progress(run.completed_stages.len(), Stage::ALL.len());
        }

        info!(
            "Found {} features in {} groups",
            run.features.len(),
            run.features
                .iter()
                .filter_map(|f| f.character.group_id)
                .max()
                .map_or(0, |g| g + 1)
        );
        Ok(run)
    }

    fn run_stage<P: SpectrumProvider + ?Sized>(
        &self,
        stage: Stage,
        provider: &P,
        annotations: &dyn AnnotationEvaluator,
        run: &mut AnalysisRun,
        ctx: &mut RunContext,
    ) -> Result<()> {
        match stage {
            Stage::Accumulate => {
                let raw = provider.load_all_spectra()?;
                ctx.ms1_scans = Ms1ScanIndex::new(&raw);
                run.spectra = self.accumulator.accumulate(&raw);
                let representative = run.spectra.iter().find(|s| s.is_ms1());
                ctx.infusion_time = infusion_time(&raw, representative);
                debug!(
                    "Loaded {} scans, {} with a time axis",
                    raw.len(),
                    ctx.ms1_scans.num_scans()
                );
            }
            Stage::DetectPeaks => {
                run.features = match run.spectra.iter().find(|s| s.is_ms1()) {
                    Some(ms1) => self.detector.detect(ms1, ctx.infusion_time),
                    None => {
                        warn!("No MS1 spectrum to pick peaks from");
                        Vec::new()
                    }
                };
            }
            Stage::EstimateIsotopes => self.isotopes.estimate(&mut run.features),
            Stage::MatchMs2 => {
                let matcher = Ms2Matcher::new(
                    &run.spectra,
                    self.config.ms2_matching.acquisition_type,
                    self.config.precursor_tolerance(),
                )?;
                matcher.assign(&mut run.features);
            }
            Stage::Deconvolute => {
                run.msdec_results = self
                    .deconvoluter
                    .deconvolute_all(&mut run.features, &run.spectra);
            }
            Stage::LinkFeatures => {
                let inputs = LinkingInputs {
                    msdec_results: &run.msdec_results,
                    annotations,
                    ms1_scans: (ctx.ms1_scans.num_scans() > 0).then_some(&ctx.ms1_scans),
                };
                self.linker.link(&mut run.features, &inputs, &|done, total| {
                    debug!("Linking pass {}/{}", done, total)
                })?;
            }
        }
        Ok(())
    }
}

/// Infusion window from the raw MS1 scan times, with the apex at the
/// representative scan. Unknown when no scan carries a time.
fn infusion_time(raw: &[RawSpectrum], representative: Option<&RawSpectrum>) -> ChromTime {
    let (left, right) = raw
        .iter()
        .filter(|s| s.is_ms1() && s.has_scan_time())
        .map(|s| s.scan_start_time)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });
    if left > right {
        return ChromTime::UNKNOWN;
    }
    let apex = representative
        .filter(|s| s.has_scan_time())
        .map_or((left + right) / 2.0, |s| s.scan_start_time);
    ChromTime { apex, left, right }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnnotationTable;
    use dimsquery::{
        InMemorySpectra,
        IonMode,
        SpectrumPeak,
    };

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let mut conf = FeatureFindingConfig::default();
        conf.peak_picking.min_datapoints = 0;
        assert!(FeatureFindingPipeline::new(conf).is_err());
    }

    #[test]
    fn test_cancelled_before_start() {
        let pipeline = FeatureFindingPipeline::new(FeatureFindingConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.clone().cancel();
        let err = pipeline
            .run(
                &InMemorySpectra::default(),
                &AnnotationTable::new(),
                &|_, _| {},
                &cancel,
            )
            .unwrap_err();
        assert_eq!(err.stage, Stage::Accumulate);
        assert!(matches!(
            err.error,
            DimsSeekError::Cancelled {
                stage: Stage::Accumulate
            }
        ));
        assert!(err.partial.completed_stages.is_empty());
    }

    #[test]
    fn test_empty_provider_completes_with_no_features() {
        let pipeline = FeatureFindingPipeline::new(FeatureFindingConfig::default()).unwrap();
        let run = pipeline
            .run(
                &InMemorySpectra::default(),
                &AnnotationTable::new(),
                &|_, _| {},
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(run.is_complete());
        assert!(run.features.is_empty());
        assert!(run.msdec_results.is_empty());
    }

    #[test]
    fn test_infusion_time() {
        let scans: Vec<RawSpectrum> = [0.5, 0.1, 0.9]
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                RawSpectrum::new(i, 1, IonMode::Positive, vec![SpectrumPeak::new(1.0, 1.0)])
                    .with_scan_start_time(t)
            })
            .collect();
        let time = infusion_time(&scans, Some(&scans[0]));
        assert_eq!(time.left, 0.1);
        assert_eq!(time.right, 0.9);
        assert_eq!(time.apex, 0.5);

        let untimed = vec![RawSpectrum::new(0, 1, IonMode::Positive, vec![])];
        assert!(!infusion_time(&untimed, untimed.first()).has_time());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::MatchMs2.to_string(), "MS2 matching");
        assert_eq!(
            DimsSeekError::Cancelled {
                stage: Stage::LinkFeatures
            }
            .to_string(),
            "Cancelled before stage feature linking"
        );
    }
}
