use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn conn(database_url: &str) -> Result<Connection> {
    ensure_parent_dir(database_url)?;

    let conn = Connection::open(database_url)
        .with_context(|| format!("failed to open database at {}", database_url))?;

    crate::database::create_database_with_connection(&conn)?;

    Ok(conn)
}

fn ensure_parent_dir(database_url: &str) -> Result<()> {
    if database_url == ":memory:" || database_url.starts_with("file:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(database_url).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            info!("📁 Created database directory {}", parent.display());
        }
    }
    Ok(())
}
