//! The vspt-sqlite crate provides a common set of functions
//! for initializing, migrating and managing SQLite databases.
//!
//! It also includes some traits used to make common DB operations
//! (such as SELECT) easier.

pub mod errors;
pub mod traits;
pub mod migrations;

pub use rusqlite;
pub use r2d2;

use rusqlite::Connection;
use log::*;

use crate::errors::Result;
use crate::migrations::Migration;

/// A pool of SQLite database connections.
pub type VsptPool = r2d2::Pool<VsptConnectionManager>;

/// Opens the database at `path`, sets connection pragmas, and brings the
/// schema up to date by applying any pending `migrations`.
pub fn initialize_db(path: &str, migrations: &[Migration]) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
    migrations::initialize_migrations(&conn)?;
    migrations::run_pending_migrations(&mut conn, migrations)?;
    Ok(conn)
}

/// An r2d2 connection manager for a migrated verspaetung database.
pub struct VsptConnectionManager {
    path: String
}
impl VsptConnectionManager {
    /// Runs migrations against the database at `path`, then returns a
    /// manager producing connections to it.
    pub fn initialize(path: &str, migrations: &[Migration]) -> Result<Self> {
        info!("initializing database at {}", path);
        let _ = initialize_db(path, migrations)?;
        Ok(Self { path: path.into() })
    }
}
impl r2d2::ManageConnection for VsptConnectionManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> ::std::result::Result<Connection, Self::Error> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
    fn is_valid(&self, conn: &mut Connection) -> ::std::result::Result<(), Self::Error> {
        conn.execute_batch("")
    }
    fn has_broken(&self, _: &mut Connection) -> bool {
        false
    }
}
