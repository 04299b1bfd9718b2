pub mod spectrum;
pub mod tolerance;

pub use spectrum::{
    IonMode,
    PrecursorWindow,
    RawSpectrum,
    SpectrumPeak,
};
pub use tolerance::MzTolerance;
