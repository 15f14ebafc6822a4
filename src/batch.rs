use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::convert::{Converter, Outcome};
use crate::error::ConvertError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub skipped: usize,
}

impl Summary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Converted => self.converted += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// A file input is taken as-is; a directory is walked recursively for files with `ext`,
/// returned in sorted order.
pub fn collect_inputs(input: &Path, ext: &str) -> Result<Vec<PathBuf>, ConvertError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(ConvertError::MissingInput(input.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(input).to_path_buf();
            ConvertError::read(path, e.into())
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), ext) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Converts every input, stopping at the first error. With `jobs > 1` files are converted
/// on a dedicated rayon pool.
pub fn run_batch(
    conv: &Converter,
    inputs: &[PathBuf],
    jobs: usize,
) -> Result<Summary, ConvertError> {
    let t0 = Instant::now();
    let mut summary = Summary::default();
    if jobs > 1 && inputs.len() > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        let outcomes = pool.install(|| {
            inputs
                .par_iter()
                .map(|p| conv.convert(p))
                .collect::<Result<Vec<_>, _>>()
        })?;
        for o in outcomes {
            summary.record(o);
        }
    } else {
        for p in inputs {
            summary.record(conv.convert(p)?);
        }
    }
    log::info!(target: "perf", "ms={} batch files={} jobs={}", t0.elapsed().as_millis(), inputs.len(), jobs.max(1));
    log::info!(
        "{} converted, {} skipped",
        summary.converted,
        summary.skipped
    );
    Ok(summary)
}
