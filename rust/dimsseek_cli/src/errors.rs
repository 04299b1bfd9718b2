use dimsseek::PipelineFailure;
use dimsseek::errors::DimsSeekError;

#[derive(Debug)]
pub enum CliError {
    Config {
        source: String,
    },
    ParseError {
        msg: String,
    },
    Io {
        source: String,
        path: Option<String>,
    },
    DataReading {
        source: String,
    },
    Pipeline {
        stage: String,
        source: String,
    },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config { source } => write!(f, "Error interpreting the config: {}", source),
            CliError::ParseError { msg } => write!(f, "Error parsing config: {}", msg),
            CliError::Io { source, path } => {
                if let Some(path) = path {
                    write!(f, "Error reading file {}: {}", path, source)
                } else {
                    write!(f, "Error reading file: {}", source)
                }
            }
            CliError::DataReading { source } => write!(f, "Error reading data: {}", source),
            CliError::Pipeline { stage, source } => {
                write!(f, "Feature finding failed during {}: {}", stage, source)
            }
        }
    }
}

impl From<dimsquery::DimsqueryError> for CliError {
    fn from(e: dimsquery::DimsqueryError) -> Self {
        CliError::DataReading {
            source: e.to_string(),
        }
    }
}

impl From<DimsSeekError> for CliError {
    fn from(e: DimsSeekError) -> Self {
        match e {
            DimsSeekError::Config { .. } => CliError::Config {
                source: e.to_string(),
            },
            other => CliError::DataReading {
                source: other.to_string(),
            },
        }
    }
}

impl From<&PipelineFailure> for CliError {
    fn from(e: &PipelineFailure) -> Self {
        CliError::Pipeline {
            stage: e.stage.to_string(),
            source: e.error.to_string(),
        }
    }
}
