// ABOUTME: SQLite-backed import cache for fetched remote modules

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CompileError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS modules (
    specifier TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    fetched_at INTEGER NOT NULL
)";

/// Content cache keyed by import specifier. A hit skips the network
/// entirely; entries are only replaced by an explicit re-store.
pub struct ImportCache {
    conn: Connection,
}

impl ImportCache {
    /// Open (or create) an on-disk cache
    pub fn open(path: &Path) -> Result<Self, CompileError> {
        let conn = Connection::open(path)
            .map_err(|e| CompileError::Io(format!("cannot open import cache: {}", e)))?;
        conn.execute(SCHEMA, [])
            .map_err(|e| CompileError::Io(format!("cannot initialize import cache: {}", e)))?;
        Ok(ImportCache { conn })
    }

    /// An in-memory cache (REPL sessions and tests)
    pub fn in_memory() -> Result<Self, CompileError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CompileError::Io(format!("cannot open import cache: {}", e)))?;
        conn.execute(SCHEMA, [])
            .map_err(|e| CompileError::Io(format!("cannot initialize import cache: {}", e)))?;
        Ok(ImportCache { conn })
    }

    pub fn store(&self, specifier: &str, source: &str) -> Result<(), CompileError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.conn
            .execute(
                "INSERT OR REPLACE INTO modules (specifier, source, fetched_at) VALUES (?1, ?2, ?3)",
                params![specifier, source, now as i64],
            )
            .map_err(|e| CompileError::Io(format!("cannot store module: {}", e)))?;
        Ok(())
    }

    pub fn lookup(&self, specifier: &str) -> Result<Option<String>, CompileError> {
        self.conn
            .query_row(
                "SELECT source FROM modules WHERE specifier = ?1",
                params![specifier],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CompileError::Io(format!("cannot read module cache: {}", e)))
    }

    pub fn len(&self) -> Result<usize, CompileError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM modules", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(|e| CompileError::Io(format!("cannot count module cache: {}", e)))
    }

    pub fn is_empty(&self) -> Result<bool, CompileError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_lookup_round_trip() {
        let cache = ImportCache::in_memory().unwrap();
        assert!(cache.is_empty().unwrap());

        cache.store("npm:left-pad", "(fn pad (s) s)").unwrap();
        assert_eq!(
            cache.lookup("npm:left-pad").unwrap().as_deref(),
            Some("(fn pad (s) s)")
        );
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_lookup_miss() {
        let cache = ImportCache::in_memory().unwrap();
        assert!(cache.lookup("npm:nope").unwrap().is_none());
    }

    #[test]
    fn test_store_replaces_existing_entry() {
        let cache = ImportCache::in_memory().unwrap();
        cache.store("npm:x", "old").unwrap();
        cache.store("npm:x", "new").unwrap();
        assert_eq!(cache.lookup("npm:x").unwrap().as_deref(), Some("new"));
        assert_eq!(cache.len().unwrap(), 1);
    }
}
