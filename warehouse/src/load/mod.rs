//! Per-file record processors.
//!
//! Each processor reads one data file, derives rows, and writes them through
//! a [`Warehouse`](crate::Warehouse). Processors never commit; the batch driver owns the
//! transaction around each file.

pub mod logs;
pub mod songs;

use std::path::Path;

use crate::config::Clock;
use crate::{Error, Result};

pub use logs::process_log_file;
pub use songs::process_song_file;

/// Settings shared by all processors.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Zone used for calendar fields of time rows.
    pub clock: Clock,
}

/// What a processor wrote for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileReport {
    /// Records (lines or objects) read from the file.
    pub records: usize,
    pub songs: usize,
    pub artists: usize,
    /// Playback events kept after filtering.
    pub plays: usize,
    pub times: usize,
    pub users: usize,
    pub songplays: usize,
    /// Songplays whose song and artist keys were resolved.
    pub resolved: usize,
}

impl std::ops::AddAssign for FileReport {
    fn add_assign(&mut self, other: Self) {
        self.records += other.records;
        self.songs += other.songs;
        self.artists += other.artists;
        self.plays += other.plays;
        self.times += other.times;
        self.users += other.users;
        self.songplays += other.songplays;
        self.resolved += other.resolved;
    }
}

/// Signature shared by the song and log processors.
pub type Processor<W> = fn(&mut W, &Path, &LoadOptions) -> Result<FileReport>;

/// Read a data file as UTF-8 text.
///
/// I/O failures are filesystem errors; bytes that are not UTF-8 are a
/// malformed record on the line where decoding stopped.
pub(crate) fn read_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::fs(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        Error::malformed(path, line, e.utf8_error().to_string())
    })
}
