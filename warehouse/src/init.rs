//! Database initialization - creates the star schema.
//!
//! # Tables
//!
//! - `songplays` - fact table, one row per playback event
//! - `users` - listeners, keyed by user_id
//! - `songs` - song metadata, keyed by song_id
//! - `artists` - artist metadata, keyed by artist_id
//! - `time` - playback instants broken into calendar fields
//!
//! Relationships (songplays -> songs/artists, songs -> artists) are not
//! declared as foreign keys: DuckDB rejects upserts on tables referenced by a
//! foreign key, and the loader relies on upserts for re-runs.

use std::fs;

use crate::{Config, Result};

/// Table names in creation order.
pub const TABLES: [&str; 5] = ["songplays", "users", "songs", "artists", "time"];

/// Check whether the database file exists.
pub fn is_initialized(config: &Config) -> bool {
    config.database.exists()
}

/// Create the database file (and parent directories) and the star schema.
///
/// With `reset`, existing tables are dropped first. Without it, existing
/// tables are kept as they are.
pub fn initialize(config: &Config, reset: bool) -> Result<()> {
    if let Some(parent) = config.database.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = duckdb::Connection::open(&config.database)?;

    if reset {
        drop_tables(&conn)?;
    }
    create_tables(&conn)?;

    Ok(())
}

/// Drop every table and the songplay id sequence.
fn drop_tables(conn: &duckdb::Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS songplays;
        DROP TABLE IF EXISTS users;
        DROP TABLE IF EXISTS songs;
        DROP TABLE IF EXISTS artists;
        DROP TABLE IF EXISTS "time";
        DROP SEQUENCE IF EXISTS songplay_id_seq;
        "#,
    )?;
    Ok(())
}

fn create_tables(conn: &duckdb::Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE SEQUENCE IF NOT EXISTS songplay_id_seq START 1;

        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id BIGINT PRIMARY KEY DEFAULT nextval('songplay_id_seq'),
            start_time BIGINT NOT NULL,
            user_id VARCHAR NOT NULL,
            level VARCHAR,
            song_id VARCHAR,
            artist_id VARCHAR,
            session_id BIGINT,
            location VARCHAR,
            user_agent VARCHAR
        );

        CREATE TABLE IF NOT EXISTS users (
            user_id VARCHAR PRIMARY KEY,
            first_name VARCHAR,
            last_name VARCHAR,
            gender VARCHAR,
            level VARCHAR
        );

        CREATE TABLE IF NOT EXISTS songs (
            song_id VARCHAR PRIMARY KEY,
            title VARCHAR NOT NULL,
            artist_id VARCHAR NOT NULL,
            year INTEGER,
            duration DOUBLE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS artists (
            artist_id VARCHAR PRIMARY KEY,
            name VARCHAR NOT NULL,
            location VARCHAR,
            latitude DOUBLE,
            longitude DOUBLE
        );

        CREATE TABLE IF NOT EXISTS "time" (
            start_time TIMESTAMP PRIMARY KEY,
            hour INTEGER,
            day INTEGER,
            week INTEGER,
            month INTEGER,
            year INTEGER,
            weekday INTEGER
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_count(config: &Config) -> i64 {
        let conn = duckdb::Connection::open(&config.database).unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'main'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_initialize_creates_tables() {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_root(tmp.path().join("nested"));

        assert!(!is_initialized(&config));
        initialize(&config, false).unwrap();
        assert!(is_initialized(&config));
        assert_eq!(table_count(&config), TABLES.len() as i64);
    }

    #[test]
    fn test_initialize_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_root(tmp.path());

        initialize(&config, false).unwrap();
        {
            let conn = duckdb::Connection::open(&config.database).unwrap();
            conn.execute("INSERT INTO users VALUES ('1', 'A', 'B', 'F', 'free')", [])
                .unwrap();
        }

        // Without reset, data survives
        initialize(&config, false).unwrap();
        let conn = duckdb::Connection::open(&config.database).unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 1);
        drop(conn);

        // With reset, tables come back empty
        initialize(&config, true).unwrap();
        let conn = duckdb::Connection::open(&config.database).unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0);
    }
}
