pub mod isotopes;
pub mod ms2_matching;
pub mod peak_detector;

pub use isotopes::IsotopeEstimator;
pub use ms2_matching::{
    AcquisitionType,
    Ms2Matcher,
};
pub use peak_detector::{
    DetectedPeak,
    PeakDetector,
};
