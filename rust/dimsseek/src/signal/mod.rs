pub mod purity;
pub mod smoothing;

pub use purity::{
    ProfileSymmetryPurity,
    PurityEstimator,
};
pub use smoothing::{
    LinearWeightedMovingAverage,
    SavitzkyGolay,
    SimpleMovingAverage,
    Smoother,
    SmoothingMethod,
};
