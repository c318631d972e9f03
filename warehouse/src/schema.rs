//! Record types for the star schema tables.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `songs` dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    /// Track length in seconds. Matched exactly against log events.
    pub duration: f64,
}

/// A row of the `artists` dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A row of the `time` dimension: one playback instant broken into calendar fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub timestamp: DateTime<Utc>,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    /// Monday = 0 .. Sunday = 6.
    pub week_day: u32,
    /// ISO 8601 week number.
    pub week_of_year: u32,
}

impl TimeRecord {
    /// Decompose a zoned instant. Calendar fields follow the zone of `at`.
    pub fn from_datetime(at: &DateTime<FixedOffset>) -> Self {
        Self {
            timestamp: at.with_timezone(&Utc),
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            week_day: at.weekday().num_days_from_monday(),
            week_of_year: at.iso_week().week(),
        }
    }
}

/// A row of the `users` dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    /// Subscription level, "free" or "paid".
    pub level: String,
}

/// Song and artist keys resolved for a playback event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// A row of the `songplays` fact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongplayRecord {
    /// Raw event timestamp in epoch milliseconds.
    pub start_time: i64,
    pub user_id: String,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}

impl SongplayRecord {
    /// Attach resolved keys. Both stay null when there is no match.
    pub fn with_match(mut self, found: Option<SongMatch>) -> Self {
        match found {
            Some(m) => {
                self.song_id = Some(m.song_id);
                self.artist_id = Some(m.artist_id);
            }
            None => {
                self.song_id = None;
                self.artist_id = None;
            }
        }
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.song_id.is_some() && self.artist_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Clock;

    #[test]
    fn test_time_record_decomposition() {
        let at = Clock::Offset(8 * 3600).at_millis(1_541_079_112_796).unwrap();
        let record = TimeRecord::from_datetime(&at);

        assert_eq!(record.year, 2018);
        assert_eq!(record.month, 11);
        assert_eq!(record.day, 1);
        assert_eq!(record.hour, 21);
        // 2018-11-01 was a Thursday
        assert_eq!(record.week_day, 3);
        assert_eq!(record.week_of_year, 44);
        assert_eq!(record.timestamp.timestamp_millis(), 1_541_079_112_796);
    }

    #[test]
    fn test_time_record_zone_changes_day() {
        // 2018-11-04 23:30 UTC is already Monday in UTC+1
        let ts = 1_541_374_200_000;
        let utc = TimeRecord::from_datetime(&Clock::Utc.at_millis(ts).unwrap());
        let cet = TimeRecord::from_datetime(&Clock::Offset(3600).at_millis(ts).unwrap());

        assert_eq!((utc.day, utc.week_day, utc.week_of_year), (4, 6, 44));
        assert_eq!((cet.day, cet.week_day, cet.week_of_year), (5, 0, 45));
        assert_eq!(utc.timestamp, cet.timestamp);
    }

    #[test]
    fn test_songplay_match_is_all_or_nothing() {
        let play = SongplayRecord {
            start_time: 1,
            user_id: "7".to_string(),
            level: "free".to_string(),
            song_id: Some("stale".to_string()),
            artist_id: None,
            session_id: 3,
            location: "Nowhere".to_string(),
            user_agent: "curl".to_string(),
        };

        let unresolved = play.clone().with_match(None);
        assert_eq!((unresolved.song_id, unresolved.artist_id), (None, None));

        let resolved = play.with_match(Some(SongMatch {
            song_id: "SOA".to_string(),
            artist_id: "ARA".to_string(),
        }));
        assert!(resolved.is_resolved());
    }
}
