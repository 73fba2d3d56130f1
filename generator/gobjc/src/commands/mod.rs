//! Command handlers for the `gobj` CLI.
//!
//! Handlers print to stdout and exit the process with status 1 on failure.
//! The pieces worth testing (`render_database`, `verify`) return values.

mod inspect;
mod verify;

use std::path::Path;

use gobj_db::{DatabaseStore, GenerationDatabase};

pub use inspect::inspect_database;
pub use verify::verify_database;

/// Load a database file the user pointed at. A missing file is an error
/// here, unlike inside a session where it just means a fresh project.
fn load_existing(path: &str) -> (DatabaseStore, GenerationDatabase) {
    if !Path::new(path).is_file() {
        eprintln!("error: database file '{path}' not found");
        std::process::exit(1);
    }
    let store = DatabaseStore::new(path);
    let db = store.load();
    (store, db)
}
