pub mod spectrum_provider;

pub use spectrum_provider::{
    AsyncSpectrumProvider,
    SpectrumProvider,
};
