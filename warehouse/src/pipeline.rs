//! Batch driver: discover files, process each one, commit per file.
//!
//! Song files are loaded before log files so that songplay lookups can see
//! every song. A failure on any file rolls back that file and ends the run;
//! files already committed stay in the database.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::discover::{find_files, DATA_EXTENSION};
use crate::load::{process_log_file, process_song_file, FileReport, LoadOptions, Processor};
use crate::store::Warehouse;
use crate::{Config, Error, Result};

/// Which data sets a run loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub songs: bool,
    pub logs: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            songs: true,
            logs: true,
        }
    }
}

/// Totals for one data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub files: usize,
    pub rows: FileReport,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub songs: DatasetSummary,
    pub logs: DatasetSummary,
}

/// Run `processor` over every data file under `root`, one transaction per file.
pub fn process_data<W: Warehouse>(
    warehouse: &mut W,
    root: &Path,
    processor: Processor<W>,
    options: &LoadOptions,
) -> Result<DatasetSummary> {
    let files = find_files(root, DATA_EXTENSION)?;
    let total = files.len();
    info!("{} files found in {}", total, root.display());

    let mut summary = DatasetSummary::default();
    for (i, path) in files.iter().enumerate() {
        let report = process_one(warehouse, path, processor, options)?;
        debug!(path = %path.display(), ?report, "file loaded");

        summary.files += 1;
        summary.rows += report;
        info!("{}/{} files processed.", i + 1, total);
    }

    Ok(summary)
}

fn process_one<W: Warehouse>(
    warehouse: &mut W,
    path: &Path,
    processor: Processor<W>,
    options: &LoadOptions,
) -> Result<FileReport> {
    warehouse.begin().map_err(|e| with_path(path, e))?;

    let outcome = processor(warehouse, path, options).and_then(|report| {
        warehouse.commit()?;
        Ok(report)
    });

    outcome.map_err(|e| {
        if let Err(rollback) = warehouse.rollback() {
            warn!(path = %path.display(), error = %rollback, "rollback failed");
        }
        error!(path = %path.display(), kind = %e.kind(), "aborting load: {}", e);
        with_path(path, e)
    })
}

fn with_path(path: &Path, e: Error) -> Error {
    match e {
        // Already names the file
        Error::MalformedRecord { .. } | Error::FileSystem { .. } | Error::File { .. } => e,
        other => Error::File {
            path: PathBuf::from(path),
            source: Box::new(other),
        },
    }
}

/// Load the configured song tree, then the log tree.
pub fn run<W: Warehouse>(warehouse: &mut W, config: &Config, selection: Selection) -> Result<RunSummary> {
    let options = LoadOptions { clock: config.clock };
    let mut summary = RunSummary::default();

    if selection.songs {
        summary.songs = process_data(warehouse, &config.song_data, process_song_file::<W>, &options)?;
    }
    if selection.logs {
        summary.logs = process_data(warehouse, &config.log_data, process_log_file::<W>, &options)?;
    }

    info!(
        song_files = summary.songs.files,
        log_files = summary.logs.files,
        songplays = summary.logs.rows.songplays,
        resolved = summary.logs.rows.resolved,
        "load complete"
    );
    Ok(summary)
}
