//! Sparkify warehouse: loads song metadata and listening logs into a
//! DuckDB star schema.

pub mod config;
pub mod discover;
pub mod error;
pub mod init;
pub mod load;
pub mod pipeline;
pub mod schema;
pub mod store;

pub use config::{Clock, Config};
pub use error::{Error, ErrorKind, Result};
pub use load::{FileReport, LoadOptions};
pub use pipeline::{run, RunSummary, Selection};
pub use schema::{ArtistRecord, SongMatch, SongRecord, SongplayRecord, TimeRecord, UserRecord};
pub use store::{Store, TableCounts, Warehouse};
