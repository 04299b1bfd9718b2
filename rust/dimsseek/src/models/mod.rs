pub mod adduct;
pub mod annotation;
pub mod feature;
pub mod msdec;

pub use adduct::AdductIon;
pub use annotation::{
    Annotation,
    AnnotationConfidence,
    AnnotationEvaluator,
    AnnotationTable,
};
pub use feature::{
    ChromTime,
    Feature,
    FeatureId,
    LinkReason,
    PeakCharacter,
    PeakLink,
};
pub use msdec::MsDecResult;
