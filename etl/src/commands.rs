//! Command implementations for etl.

use std::path::Path;

use warehouse::{init, pipeline, Config, Error, Selection, Store};

/// Create the schema, optionally dropping existing tables.
pub fn init(config_path: Option<&Path>, reset: bool, save_config: Option<&Path>) -> warehouse::Result<()> {
    let config = Config::load(config_path)?;
    let existed = init::is_initialized(&config);

    if let Some(target) = save_config {
        if target.exists() {
            return Err(Error::Config(format!("Refusing to overwrite {}", target.display())));
        }
        config.save(target)?;
        println!("Config written to {}", target.display());
    }

    init::initialize(&config, reset)?;

    if reset && existed {
        println!("Tables dropped and recreated in {}", config.database.display());
    } else {
        println!("Database initialized at {}", config.database.display());
    }
    Ok(())
}

/// Run the batch load and print a summary.
pub fn load(config_path: Option<&Path>, selection: Selection, create: bool) -> warehouse::Result<()> {
    let config = Config::load(config_path)?;

    if create && !init::is_initialized(&config) {
        init::initialize(&config, false)?;
    }
    let mut store = Store::open(&config)?;

    let summary = pipeline::run(&mut store, &config, selection)?;

    if selection.songs {
        println!(
            "Songs: {} files, {} songs, {} artists",
            summary.songs.files, summary.songs.rows.songs, summary.songs.rows.artists
        );
    }
    if selection.logs {
        let logs = &summary.logs.rows;
        println!(
            "Logs:  {} files, {} events, {} plays, {} users, {} songplays ({} matched to a song)",
            summary.logs.files, logs.records, logs.plays, logs.users, logs.songplays, logs.resolved
        );
    }
    Ok(())
}

/// Print row counts for every table.
pub fn counts(config_path: Option<&Path>) -> warehouse::Result<()> {
    let config = Config::load(config_path)?;
    let store = Store::open(&config)?;
    let counts = store.counts()?;

    println!("Database: {}", store.path().display());
    println!("  songplays  {:>10}  ({} matched)", counts.songplays, counts.resolved_songplays);
    println!("  users      {:>10}", counts.users);
    println!("  songs      {:>10}", counts.songs);
    println!("  artists    {:>10}", counts.artists);
    println!("  time       {:>10}", counts.time);
    Ok(())
}
