use dimsseek::FeatureFindingConfig;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub analysis: FeatureFindingConfig,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputConfig {
    /// JSON array of raw spectra.
    pub spectra_file: PathBuf,
    /// JSON object from feature id to annotation.
    #[serde(default)]
    pub annotations_file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Config {
    /// Applies the command line overrides and checks that input and output
    /// are both known.
    pub fn with_cli_overrides(mut self, args: Cli) -> Result<(Self, InputConfig, OutputConfig), CliError> {
        if let Some(spectra_file) = args.spectra_file {
            let annotations_file = self.input.take().and_then(|i| i.annotations_file);
            self.input = Some(InputConfig {
                spectra_file,
                annotations_file,
            });
        }
        if let Some(annotations_file) = args.annotations_file {
            match self.input.as_mut() {
                Some(input) => input.annotations_file = Some(annotations_file),
                None => {
                    return Err(CliError::Config {
                        source: "An annotations file was given without a spectra file".to_string(),
                    });
                }
            }
        }
        if let Some(directory) = args.output_dir {
            self.output = Some(OutputConfig { directory });
        }

        let input = self.input.clone().ok_or_else(|| CliError::Config {
            source: "No input provided, please provide one in either the config file or with the --spectra-file flag".to_string(),
        })?;
        let output = self.output.clone().ok_or_else(|| CliError::Config {
            source: "No output directory provided, please provide one in either the config file or with the --output-dir flag".to_string(),
        })?;
        Ok((self, input, output))
    }
}
