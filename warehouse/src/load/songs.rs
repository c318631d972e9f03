//! Song metadata files: one JSON object yields one song and one artist.

use std::path::Path;

use serde::Deserialize;

use super::{read_file, FileReport, LoadOptions};
use crate::schema::{ArtistRecord, SongRecord};
use crate::store::Warehouse;
use crate::{Error, Result};

/// Layout of a song metadata file. Unknown fields (`num_songs`) are ignored.
#[derive(Debug, Deserialize)]
struct SongFile {
    song_id: String,
    title: String,
    artist_id: String,
    year: i32,
    duration: f64,
    artist_name: String,
    #[serde(default)]
    artist_location: Option<String>,
    #[serde(default)]
    artist_latitude: Option<f64>,
    #[serde(default)]
    artist_longitude: Option<f64>,
}

impl SongFile {
    fn into_records(self) -> (SongRecord, ArtistRecord) {
        let song = SongRecord {
            song_id: self.song_id,
            title: self.title,
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        };
        let artist = ArtistRecord {
            artist_id: self.artist_id,
            name: self.artist_name,
            location: self.artist_location.filter(|l| !l.trim().is_empty()),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        };
        (song, artist)
    }
}

/// Parse a song file's contents. `path` is only used for error reporting.
pub fn parse_song_file(path: &Path, contents: &str) -> Result<(SongRecord, ArtistRecord)> {
    let parsed: SongFile = serde_json::from_str(contents.trim())
        .map_err(|e| Error::malformed(path, e.line(), e.to_string()))?;
    Ok(parsed.into_records())
}

/// Load one song file: insert its song row, then its artist row.
pub fn process_song_file<W: Warehouse>(
    warehouse: &mut W,
    path: &Path,
    _options: &LoadOptions,
) -> Result<FileReport> {
    let contents = read_file(path)?;
    let (song, artist) = parse_song_file(path, &contents)?;

    warehouse.insert_song(&song)?;
    warehouse.insert_artist(&artist)?;

    Ok(FileReport {
        records: 1,
        songs: 1,
        artists: 1,
        ..FileReport::default()
    })
}
