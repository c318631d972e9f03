//! Dimension table writes: songs, artists, users, time.
//!
//! Keyed rows are upserted so that reloading the same files does not trip
//! the primary keys.

use duckdb::{params, Connection};

use crate::schema::{ArtistRecord, SongRecord, TimeRecord, UserRecord};
use crate::Result;

pub(super) fn insert_song(conn: &Connection, song: &SongRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO songs (song_id, title, artist_id, year, duration)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT DO NOTHING
        "#,
        params![song.song_id, song.title, song.artist_id, song.year, song.duration],
    )?;
    Ok(())
}

pub(super) fn insert_artist(conn: &Connection, artist: &ArtistRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO artists (artist_id, name, location, latitude, longitude)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT DO NOTHING
        "#,
        params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude,
        ],
    )?;
    Ok(())
}

pub(super) fn insert_time(conn: &Connection, time: &TimeRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO "time" (start_time, hour, day, week, month, year, weekday)
        VALUES (epoch_ms(CAST(? AS BIGINT)), ?, ?, ?, ?, ?, ?)
        ON CONFLICT DO NOTHING
        "#,
        params![
            time.timestamp.timestamp_millis(),
            time.hour,
            time.day,
            time.week_of_year,
            time.month,
            time.year,
            time.week_day,
        ],
    )?;
    Ok(())
}

/// Insert a user, or refresh the level of a known one.
pub(super) fn insert_user(conn: &Connection, user: &UserRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO users (user_id, first_name, last_name, gender, level)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET level = excluded.level
        "#,
        params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender,
            user.level,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Clock;
    use crate::schema::{ArtistRecord, SongRecord, TimeRecord, UserRecord};
    use crate::store::tests::setup_store;
    use crate::store::Warehouse;

    fn song() -> SongRecord {
        SongRecord {
            song_id: "SOUPIRU12A6D4FA1E1".to_string(),
            title: "Der Kleine Dompfaff".to_string(),
            artist_id: "ARJIE2Y1187B994AB7".to_string(),
            year: 0,
            duration: 152.92036,
        }
    }

    fn artist() -> ArtistRecord {
        ArtistRecord {
            artist_id: "ARJIE2Y1187B994AB7".to_string(),
            name: "Line Renaud".to_string(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    fn user(level: &str) -> UserRecord {
        UserRecord {
            user_id: "80".to_string(),
            first_name: "Tegan".to_string(),
            last_name: "Levine".to_string(),
            gender: "F".to_string(),
            level: level.to_string(),
        }
    }

    #[test]
    fn test_duplicate_song_and_artist_are_ignored() {
        let (_tmp, mut store) = setup_store();

        for _ in 0..2 {
            store.insert_song(&song()).unwrap();
            store.insert_artist(&artist()).unwrap();
        }

        let counts = store.counts().unwrap();
        assert_eq!(counts.songs, 1);
        assert_eq!(counts.artists, 1);
    }

    #[test]
    fn test_duplicate_time_is_ignored() {
        let (_tmp, mut store) = setup_store();
        let at = Clock::Utc.at_millis(1_541_079_112_796).unwrap();
        let record = TimeRecord::from_datetime(&at);

        store.insert_time(&record).unwrap();
        store.insert_time(&record).unwrap();

        assert_eq!(store.counts().unwrap().time, 1);
    }

    #[test]
    fn test_user_upsert_refreshes_level() {
        let (tmp, mut store) = setup_store();

        store.insert_user(&user("free")).unwrap();
        store.insert_user(&user("paid")).unwrap();
        assert_eq!(store.counts().unwrap().users, 1);
        drop(store);

        let conn = duckdb::Connection::open(tmp.path().join("sparkify.duckdb")).unwrap();
        let level: String = conn
            .query_row("SELECT level FROM users WHERE user_id = '80'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(level, "paid");
    }
}
