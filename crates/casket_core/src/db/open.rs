//! Connection open helpers.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections with the pragmas snapshot
//!   loading relies on.
//!
//! # Invariants
//! - Every returned connection has foreign keys enforced and a bounded busy
//!   timeout.

use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and configures it for aggregate access.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    info!("event=db_open module=db status=start mode=file");
    let conn = Connection::open(path).map_err(|err| {
        error!("event=db_open module=db status=error mode=file error={err}");
        err
    })?;
    bootstrap_connection(&conn)?;
    info!("event=db_open module=db status=ok mode=file");
    Ok(conn)
}

/// Opens an in-memory SQLite database configured for aggregate access.
pub fn open_db_in_memory() -> DbResult<Connection> {
    info!("event=db_open module=db status=start mode=memory");
    let conn = Connection::open_in_memory().map_err(|err| {
        error!("event=db_open module=db status=error mode=memory error={err}");
        err
    })?;
    bootstrap_connection(&conn)?;
    info!("event=db_open module=db status=ok mode=memory");
    Ok(conn)
}

fn bootstrap_connection(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{open_db, open_db_in_memory};

    #[test]
    fn in_memory_connection_has_foreign_keys_on() {
        let conn = open_db_in_memory().expect("in-memory open should succeed");
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("pragma query should succeed");
        assert_eq!(enabled, 1);
    }

    #[test]
    fn file_connection_opens_in_temp_dir() {
        let dir = tempfile::tempdir().expect("temp dir should be creatable");
        let conn = open_db(dir.path().join("aggregate.db")).expect("file open should succeed");
        conn.execute_batch("CREATE TABLE probe (id INTEGER PRIMARY KEY);")
            .expect("schema statement should run");
    }
}
