#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::accumulation::{
    AccumulationConfig,
    AccumulationStrategy,
    SpectrumAccumulator,
};
pub use crate::chromatogram::{
    ExtractedChromatogram,
    extract_chromatogram,
};
pub use crate::models::{
    IonMode,
    MzTolerance,
    PrecursorWindow,
    RawSpectrum,
    SpectrumPeak,
};
pub use crate::providers::InMemorySpectra;

// Re-export traits
pub use crate::traits::{
    AsyncSpectrumProvider,
    SpectrumProvider,
};

// Declare modules
pub mod accumulation;
pub mod chromatogram;
pub mod errors;
pub mod models;
pub mod providers;
pub mod traits;
pub mod utils;
pub use crate::utils::TupleRange;

// Re-export errors
pub use crate::errors::{
    DataProcessingError,
    DataReadingError,
    DimsqueryError,
};
