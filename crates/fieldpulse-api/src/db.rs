//! Database connection management

use libsql::{Builder, Connection};

use crate::error::AppError;
use crate::migrations;

/// Open the backing database, creating it if needed, and bring the schema
/// up to date.
pub async fn open(path: &str) -> Result<Connection, AppError> {
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    configure(&conn).await;
    migrations::run(&conn).await?;
    Ok(conn)
}

/// Configure `SQLite` for a small single-writer service.
async fn configure(conn: &Connection) {
    // Best-effort; pragmas are tuning, not correctness.
    conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
    conn.execute("PRAGMA synchronous = NORMAL;", ()).await.ok();
    conn.execute("PRAGMA foreign_keys = ON;", ()).await.ok();
}

#[cfg(test)]
pub async fn open_in_memory() -> Connection {
    open(":memory:").await.expect("in-memory database")
}
