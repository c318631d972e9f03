//! Fact table writes and the song lookup that resolves their keys.

use duckdb::{params, Connection};

use crate::schema::{SongMatch, SongplayRecord};
use crate::Result;

pub(super) fn insert_songplay(conn: &Connection, songplay: &SongplayRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO songplays (
            start_time, user_id, level, song_id, artist_id, session_id, location, user_agent
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            songplay.start_time,
            songplay.user_id,
            songplay.level,
            songplay.song_id,
            songplay.artist_id,
            songplay.session_id,
            songplay.location,
            songplay.user_agent,
        ],
    )?;
    Ok(())
}

/// Exact match on title, artist name and duration; lowest song_id wins.
pub(super) fn find_song(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> Result<Option<SongMatch>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT s.song_id, s.artist_id
        FROM songs s
        JOIN artists a ON s.artist_id = a.artist_id
        WHERE s.title = ? AND a.name = ? AND s.duration = ?
        ORDER BY s.song_id
        LIMIT 1
        "#,
    )?;
    let mut rows = stmt.query(params![title, artist_name, duration])?;

    let found = match rows.next()? {
        Some(row) => Some(SongMatch {
            song_id: row.get(0)?,
            artist_id: row.get(1)?,
        }),
        None => None,
    };
    Ok(found)
}
