pub mod config;
pub mod deconvolution;
pub mod detection;
pub mod errors;
pub mod linking;
pub mod models;
pub mod pipeline;
pub mod signal;
pub mod utils;

pub use config::FeatureFindingConfig;
pub use deconvolution::Ms2Deconvoluter;
pub use detection::{
    AcquisitionType,
    IsotopeEstimator,
    Ms2Matcher,
    PeakDetector,
};
pub use linking::PeakCharacterLinker;
pub use models::{
    AdductIon,
    Annotation,
    AnnotationConfidence,
    AnnotationEvaluator,
    AnnotationTable,
    ChromTime,
    Feature,
    FeatureId,
    LinkReason,
    MsDecResult,
    PeakCharacter,
    PeakLink,
};
pub use pipeline::{
    AnalysisRun,
    CancellationToken,
    FeatureFindingPipeline,
    PipelineFailure,
    Stage,
};
