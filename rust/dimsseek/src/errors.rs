use crate::detection::AcquisitionType;
use crate::pipeline::Stage;
use dimsquery::{
    DataReadingError,
    DimsqueryError,
};

#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedSlicesSameLength {
        expected: usize,
        other: usize,
        context: String,
    },
    ExpectedNonEmptyData {
        context: Option<String>,
    },
    FeatureIdMismatch {
        position: usize,
        id: usize,
    },
}

impl std::fmt::Display for DataProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedSlicesSameLength {
                expected,
                other,
                context,
            } => write!(
                f,
                "Expected slices of the same length ({} vs {}) in {}",
                expected, other, context
            ),
            Self::ExpectedNonEmptyData { context } => match context {
                Some(c) => write!(f, "Expected non-empty data in {}", c),
                None => write!(f, "Expected non-empty data"),
            },
            Self::FeatureIdMismatch { position, id } => write!(
                f,
                "Feature at position {} has id {}, features must be indexed by id",
                position, id
            ),
        }
    }
}

#[derive(Debug)]
pub enum DimsSeekError {
    Config {
        field: &'static str,
        reason: String,
    },
    UnsupportedAcquisition {
        acquisition: AcquisitionType,
        context: &'static str,
    },
    DataReading(DimsqueryError),
    DataProcessing(DataProcessingError),
    Cancelled {
        stage: Stage,
    },
}

impl DimsSeekError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DimsSeekError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config { field, reason } => {
                write!(f, "Invalid configuration value for `{}`: {}", field, reason)
            }
            Self::UnsupportedAcquisition {
                acquisition,
                context,
            } => write!(
                f,
                "Unsupported acquisition type {:?} during {}",
                acquisition, context
            ),
            Self::DataReading(e) => write!(f, "{}", e),
            Self::DataProcessing(e) => write!(f, "{}", e),
            Self::Cancelled { stage } => write!(f, "Cancelled before stage {}", stage),
        }
    }
}

impl std::error::Error for DimsSeekError {}

pub type Result<T> = std::result::Result<T, DimsSeekError>;

impl From<DimsqueryError> for DimsSeekError {
    fn from(x: DimsqueryError) -> Self {
        Self::DataReading(x)
    }
}

impl From<DataReadingError> for DimsSeekError {
    fn from(x: DataReadingError) -> Self {
        Self::DataReading(x.into())
    }
}

impl From<DataProcessingError> for DimsSeekError {
    fn from(x: DataProcessingError) -> Self {
        Self::DataProcessing(x)
    }
}
