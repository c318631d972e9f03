//! Store - writes records into the star schema and resolves song lookups.
//!
//! A [`Store`] owns a single DuckDB connection for the whole run. Writes made
//! between [`Warehouse::begin`] and [`Warehouse::commit`] are invisible to
//! other connections and discarded by [`Warehouse::rollback`]; DuckDB holds
//! them in the transaction until commit.

mod dimensions;
mod songplays;

use std::path::{Path, PathBuf};

use duckdb::Connection;

use crate::schema::{ArtistRecord, SongMatch, SongRecord, SongplayRecord, TimeRecord, UserRecord};
use crate::{init, Config, Error, Result};

/// The operations loaders need from the database.
///
/// Implemented by [`Store`]; tests substitute a recording double.
pub trait Warehouse {
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    fn insert_song(&mut self, song: &SongRecord) -> Result<()>;
    fn insert_artist(&mut self, artist: &ArtistRecord) -> Result<()>;
    fn insert_time(&mut self, time: &TimeRecord) -> Result<()>;
    fn insert_user(&mut self, user: &UserRecord) -> Result<()>;
    fn insert_songplay(&mut self, songplay: &SongplayRecord) -> Result<()>;

    /// Find the song whose title, artist name and duration all match exactly.
    ///
    /// When several songs match, the one with the lowest song_id wins.
    fn find_song(&mut self, title: &str, artist_name: &str, duration: f64) -> Result<Option<SongMatch>>;
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songplays: i64,
    /// Songplays with resolved song and artist keys.
    pub resolved_songplays: i64,
    pub users: i64,
    pub songs: i64,
    pub artists: i64,
    pub time: i64,
}

/// A DuckDB-backed star schema.
pub struct Store {
    conn: Connection,
    path: PathBuf,
    in_transaction: bool,
}

impl Store {
    /// Open an initialized database.
    pub fn open(config: &Config) -> Result<Self> {
        if !init::is_initialized(config) {
            return Err(Error::NotInitialized(config.database.clone()));
        }
        let conn = Connection::open(&config.database)?;
        Ok(Self {
            conn,
            path: config.database.clone(),
            in_transaction: false,
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count rows in every table.
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |sql: &str| -> Result<i64> { Ok(self.conn.query_row(sql, [], |row| row.get(0))?) };

        Ok(TableCounts {
            songplays: count("SELECT COUNT(*) FROM songplays")?,
            resolved_songplays: count(
                "SELECT COUNT(*) FROM songplays WHERE song_id IS NOT NULL AND artist_id IS NOT NULL",
            )?,
            users: count("SELECT COUNT(*) FROM users")?,
            songs: count("SELECT COUNT(*) FROM songs")?,
            artists: count("SELECT COUNT(*) FROM artists")?,
            time: count(r#"SELECT COUNT(*) FROM "time""#)?,
        })
    }
}

impl Warehouse for Store {
    fn begin(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        // A failed statement may already have aborted the transaction
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute("ROLLBACK", [])?;
        }
        Ok(())
    }

    fn insert_song(&mut self, song: &SongRecord) -> Result<()> {
        dimensions::insert_song(&self.conn, song)
    }

    fn insert_artist(&mut self, artist: &ArtistRecord) -> Result<()> {
        dimensions::insert_artist(&self.conn, artist)
    }

    fn insert_time(&mut self, time: &TimeRecord) -> Result<()> {
        dimensions::insert_time(&self.conn, time)
    }

    fn insert_user(&mut self, user: &UserRecord) -> Result<()> {
        dimensions::insert_user(&self.conn, user)
    }

    fn insert_songplay(&mut self, songplay: &SongplayRecord) -> Result<()> {
        songplays::insert_songplay(&self.conn, songplay)
    }

    fn find_song(&mut self, title: &str, artist_name: &str, duration: f64) -> Result<Option<SongMatch>> {
        songplays::find_song(&self.conn, title, artist_name, duration)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::initialize;
    use tempfile::TempDir;

    pub(super) fn setup_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_root(tmp.path());
        initialize(&config, false).unwrap();
        let store = Store::open(&config).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_store_open_uninitialized_fails() {
        let tmp = TempDir::new().unwrap();
        let config = Config::with_root(tmp.path());
        let result = Store::open(&config);
        assert!(matches!(result, Err(Error::NotInitialized(_))));
    }

    #[test]
    fn test_counts_empty() {
        let (_tmp, store) = setup_store();
        assert_eq!(store.counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn test_rollback_discards_uncommitted_rows() {
        let (_tmp, mut store) = setup_store();

        store.begin().unwrap();
        store
            .insert_user(&UserRecord {
                user_id: "10".to_string(),
                first_name: "Sylvie".to_string(),
                last_name: "Cruz".to_string(),
                gender: "F".to_string(),
                level: "free".to_string(),
            })
            .unwrap();
        store.rollback().unwrap();

        assert_eq!(store.counts().unwrap().users, 0);
    }

    #[test]
    fn test_commit_persists_rows() {
        let (tmp, mut store) = setup_store();

        store.begin().unwrap();
        store
            .insert_user(&UserRecord {
                user_id: "10".to_string(),
                first_name: "Sylvie".to_string(),
                last_name: "Cruz".to_string(),
                gender: "F".to_string(),
                level: "free".to_string(),
            })
            .unwrap();
        store.commit().unwrap();
        drop(store);

        let reopened = Store::open(&Config::with_root(tmp.path())).unwrap();
        assert_eq!(reopened.counts().unwrap().users, 1);
    }

    #[test]
    fn test_rollback_after_failed_statement() {
        let (_tmp, mut store) = setup_store();
        let user = UserRecord {
            user_id: "10".to_string(),
            first_name: "Sylvie".to_string(),
            last_name: "Cruz".to_string(),
            gender: "F".to_string(),
            level: "free".to_string(),
        };

        store.begin().unwrap();
        store.insert_user(&user).unwrap();
        // Plain insert of the same key violates the primary key
        let err = store
            .conn
            .execute(
                "INSERT INTO users (user_id, first_name, last_name, gender, level) VALUES ('10', 'a', 'b', 'F', 'free')",
                [],
            )
            .unwrap_err();
        assert_eq!(Error::from(err).kind(), crate::ErrorKind::Store);

        store.rollback().unwrap();
        assert_eq!(store.counts().unwrap().users, 0);

        // The connection is usable for the next file
        store.begin().unwrap();
        store.insert_user(&user).unwrap();
        store.commit().unwrap();
        assert_eq!(store.counts().unwrap().users, 1);
    }

    #[test]
    fn test_rollback_without_transaction_is_noop() {
        let (_tmp, mut store) = setup_store();
        store.rollback().unwrap();
    }
}
