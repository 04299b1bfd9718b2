use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug)]
pub enum DimsqueryError {
    DataReadingError(DataReadingError),
    DataProcessingError(DataProcessingError),
}

impl Display for DimsqueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataReadingError(e) => write!(f, "{}", e),
            Self::DataProcessingError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DimsqueryError {}

#[derive(Debug)]
pub enum DataReadingError {
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
    Parse {
        source: serde_json::Error,
        context: &'static str,
    },
    SpectrumNotFound {
        index: usize,
    },
}

impl Display for DataReadingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => match path {
                Some(path) => write!(f, "Error reading file {}: {}", path.display(), source),
                None => write!(f, "Error reading data: {}", source),
            },
            Self::Parse { source, context } => {
                write!(f, "Error parsing {}: {}", context, source)
            }
            Self::SpectrumNotFound { index } => {
                write!(f, "No spectrum with index {} in the data source", index)
            }
        }
    }
}

impl std::error::Error for DataReadingError {}

#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedFiniteData {
        spectrum_index: usize,
        mz: f64,
        intensity: f64,
    },
}

impl Display for DataProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedFiniteData {
                spectrum_index,
                mz,
                intensity,
            } => write!(
                f,
                "Spectrum {} has a peak at m/z {} with intensity {}, expected finite non-negative values",
                spectrum_index, mz, intensity
            ),
        }
    }
}

impl std::error::Error for DataProcessingError {}

impl From<DataReadingError> for DimsqueryError {
    fn from(e: DataReadingError) -> Self {
        DimsqueryError::DataReadingError(e)
    }
}

impl From<DataProcessingError> for DimsqueryError {
    fn from(e: DataProcessingError) -> Self {
        DimsqueryError::DataProcessingError(e)
    }
}

pub type Result<T> = std::result::Result<T, DimsqueryError>;
