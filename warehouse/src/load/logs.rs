//! Activity log files: one JSON event per line.
//!
//! Only playback events (`page == "NextSong"`) are loaded. For each file the
//! processor writes, in order:
//!
//! 1. one time row per playback event (repeated instants are not collapsed)
//! 2. one user row per distinct (id, names, gender, level) tuple, in the
//!    order first seen
//! 3. one songplay per playback event, with song and artist keys taken from
//!    a single exact (title, artist name, duration) lookup

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::{read_file, FileReport, LoadOptions};
use crate::config::Clock;
use crate::schema::{SongplayRecord, TimeRecord, UserRecord};
use crate::store::Warehouse;
use crate::{Error, Result};

/// Page value marking a playback event.
pub const PLAYBACK_PAGE: &str = "NextSong";

/// User ids appear as strings in most logs and as integers in some exports.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserId {
    Text(String),
    Number(i64),
}

impl UserId {
    fn into_string(self) -> String {
        match self {
            UserId::Text(s) => s,
            UserId::Number(n) => n.to_string(),
        }
    }
}

/// One log line as written. Non-playback events leave most fields null.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    page: String,
    ts: i64,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    song: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    session_id: Option<i64>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
}

/// A validated playback event.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    /// 1-based line number in the source file.
    pub line: usize,
    pub ts: i64,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: String,
    pub song: String,
    pub artist: String,
    pub length: f64,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}

impl PlaybackEvent {
    fn user(&self) -> UserRecord {
        UserRecord {
            user_id: self.user_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level.clone(),
        }
    }

    fn songplay(&self) -> SongplayRecord {
        SongplayRecord {
            start_time: self.ts,
            user_id: self.user_id.clone(),
            level: self.level.clone(),
            song_id: None,
            artist_id: None,
            session_id: self.session_id,
            location: self.location.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    fn time(&self, clock: Clock, path: &Path) -> Result<TimeRecord> {
        let at = clock.at_millis(self.ts).ok_or_else(|| {
            Error::malformed(path, self.line, format!("timestamp {} out of range", self.ts))
        })?;
        Ok(TimeRecord::from_datetime(&at))
    }
}

/// The parsed contents of a log file.
#[derive(Debug, Default)]
pub struct LogFile {
    /// Non-blank lines read.
    pub events: usize,
    /// Playback events in file order.
    pub plays: Vec<PlaybackEvent>,
}

fn required<T>(value: Option<T>, field: &str, path: &Path, line: usize) -> Result<T> {
    value.ok_or_else(|| Error::malformed(path, line, format!("playback event missing field `{}`", field)))
}

impl RawEvent {
    /// An empty `userId` is rejected, not stored as an anonymous play.
    fn into_playback(self, path: &Path, line: usize) -> Result<PlaybackEvent> {
        let user_id = required(self.user_id, "userId", path, line)?.into_string();
        if user_id.is_empty() {
            return Err(Error::malformed(path, line, "playback event has an empty `userId`"));
        }

        Ok(PlaybackEvent {
            line,
            ts: self.ts,
            user_id,
            first_name: required(self.first_name, "firstName", path, line)?,
            last_name: required(self.last_name, "lastName", path, line)?,
            gender: required(self.gender, "gender", path, line)?,
            level: required(self.level, "level", path, line)?,
            song: required(self.song, "song", path, line)?,
            artist: required(self.artist, "artist", path, line)?,
            length: required(self.length, "length", path, line)?,
            session_id: required(self.session_id, "sessionId", path, line)?,
            location: required(self.location, "location", path, line)?,
            user_agent: required(self.user_agent, "userAgent", path, line)?,
        })
    }
}

/// Parse log file contents and keep the playback events.
///
/// Any line that is not a JSON object with `page` and `ts` fails the whole
/// file. Playback events must also carry every field a songplay needs.
pub fn parse_log_file(path: &Path, contents: &str) -> Result<LogFile> {
    let mut parsed = LogFile::default();

    for (idx, text) in contents.lines().enumerate() {
        let line = idx + 1;
        if text.trim().is_empty() {
            continue;
        }
        parsed.events += 1;

        let raw: RawEvent =
            serde_json::from_str(text).map_err(|e| Error::malformed(path, line, e.to_string()))?;
        if raw.page != PLAYBACK_PAGE {
            continue;
        }
        parsed.plays.push(raw.into_playback(path, line)?);
    }

    Ok(parsed)
}

/// Distinct user rows in first-seen order. Rows differing only in level are distinct.
pub fn distinct_users(plays: &[PlaybackEvent]) -> Vec<UserRecord> {
    let mut seen = HashSet::new();
    plays
        .iter()
        .map(PlaybackEvent::user)
        .filter(|user| seen.insert(user.clone()))
        .collect()
}

/// Load one log file into the time, users and songplays tables.
pub fn process_log_file<W: Warehouse>(
    warehouse: &mut W,
    path: &Path,
    options: &LoadOptions,
) -> Result<FileReport> {
    let contents = read_file(path)?;
    let log = parse_log_file(path, &contents)?;

    let mut report = FileReport {
        records: log.events,
        plays: log.plays.len(),
        ..FileReport::default()
    };

    for play in &log.plays {
        let time = play.time(options.clock, path)?;
        warehouse.insert_time(&time)?;
        report.times += 1;
    }

    for user in distinct_users(&log.plays) {
        warehouse.insert_user(&user)?;
        report.users += 1;
    }

    for play in &log.plays {
        let found = warehouse.find_song(&play.song, &play.artist, play.length)?;
        let songplay = play.songplay().with_match(found);
        warehouse.insert_songplay(&songplay)?;
        report.songplays += 1;
        if songplay.is_resolved() {
            report.resolved += 1;
        }
    }

    Ok(report)
}
