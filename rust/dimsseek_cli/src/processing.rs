use dimsquery::InMemorySpectra;
use dimsseek::{
    AnalysisRun,
    AnnotationTable,
    CancellationToken,
    FeatureFindingConfig,
    FeatureFindingPipeline,
    Stage,
};
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use serde::Serialize;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::{
    error,
    info,
};

use crate::config::{
    InputConfig,
    OutputConfig,
};
use crate::errors::CliError;

fn io_error(e: std::io::Error, path: &Path) -> CliError {
    CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    }
}

fn write_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<(), CliError> {
    let file = std::fs::File::create(path).map_err(|e| io_error(e, path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), data).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn load_annotations(path: Option<&Path>) -> Result<AnnotationTable, CliError> {
    let Some(path) = path else {
        return Ok(AnnotationTable::new());
    };
    let file = std::fs::File::open(path).map_err(|e| io_error(e, path))?;
    let table: AnnotationTable =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| CliError::ParseError {
            msg: format!("{}: {}", path.display(), e),
        })?;
    info!("Loaded {} annotations from {}", table.len(), path.display());
    Ok(table)
}

fn write_results(run: &AnalysisRun, output: &OutputConfig) -> Result<(), CliError> {
    let dir = &output.directory;
    write_json(&run.features, &dir.join("features.json"))?;
    write_json(&run.msdec_results, &dir.join("msdec_results.json"))?;
    write_json(&run.timings, &dir.join("timings.json"))?;
    Ok(())
}

/// Runs feature finding on one spectra file and writes the results.
///
/// A run that fails part-way still writes what the finished stages produced.
pub fn process_spectra_file(
    analysis: &FeatureFindingConfig,
    input: &InputConfig,
    output: &OutputConfig,
) -> Result<(), CliError> {
    let st = Instant::now();
    let provider = InMemorySpectra::from_file(&input.spectra_file)?;
    info!(
        "Loading {} spectra took: {:?} for {}",
        provider.len(),
        st.elapsed(),
        input.spectra_file.display()
    );
    let annotations = load_annotations(input.annotations_file.as_deref())?;

    let pipeline = FeatureFindingPipeline::new(analysis.clone())?;
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(Stage::ALL.len() as u64).with_style(style);

    let outcome = pipeline.run(
        &provider,
        &annotations,
        &|done, _| bar.set_position(done as u64),
        &CancellationToken::new(),
    );
    bar.finish();

    match outcome {
        Ok(run) => {
            write_results(&run, output)?;
            println!(
                "Found {} features in {:?}",
                run.features.len(),
                run.timings.total()
            );
            Ok(())
        }
        Err(failure) => {
            error!("{}", failure);
            write_results(&failure.partial, output)?;
            Err(CliError::from(&failure))
        }
    }
}
