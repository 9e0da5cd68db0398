// 💾 Snapshot Store - best-effort local persistence
//
// The whole registry is one named row: the serialized record sequence as a
// JSON payload, overwritten after every mutation. Restore degrades to an
// empty registry on any missing or unreadable snapshot instead of failing.

use crate::registry::{AnimalRecord, Registry};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Name of the single registry snapshot row
pub const SNAPSHOT_NAME: &str = "animals";

/// Default database location under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("field-tally")
        .join("tally.db")
}

/// Open (creating if needed) the snapshot database at `path`
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open snapshot database {}", path.display()))?;
    setup_database(&conn)?;

    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            name TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            saved_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Write the full record sequence as the registry snapshot.
///
/// Callers fire this after every mutation; a failure here must never
/// interrupt the mutation that triggered it, so callers log and move on
/// (the in-memory registry stays authoritative for the session).
pub fn save_registry(conn: &Connection, registry: &Registry) -> Result<()> {
    let payload =
        serde_json::to_string(registry.records()).context("Failed to serialize registry")?;

    conn.execute(
        "INSERT INTO snapshots (name, payload, saved_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at",
        params![SNAPSHOT_NAME, payload, Utc::now().to_rfc3339()],
    )
    .context("Failed to write registry snapshot")?;

    Ok(())
}

/// Load the last persisted registry snapshot.
///
/// Never fails: a missing row yields an empty registry silently (first run),
/// a corrupt or unreadable snapshot yields an empty registry with a warning.
pub fn load_registry(conn: &Connection) -> Registry {
    let payload = match read_snapshot_payload(conn) {
        Ok(Some(payload)) => payload,
        Ok(None) => return Registry::new(),
        Err(e) => {
            warn!("Could not read registry snapshot, starting empty: {e:#}");
            return Registry::new();
        }
    };

    match serde_json::from_str::<Vec<AnimalRecord>>(&payload) {
        Ok(records) => Registry::from_records(records),
        Err(e) => {
            warn!("Corrupt registry snapshot, starting empty: {e}");
            Registry::new()
        }
    }
}

fn read_snapshot_payload(conn: &Connection) -> Result<Option<String>> {
    let payload = conn
        .query_row(
            "SELECT payload FROM snapshots WHERE name = ?1",
            params![SNAPSHOT_NAME],
            |row| row.get(0),
        )
        .optional()
        .context("Snapshot query failed")?;

    Ok(payload)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Category, Treatment};

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_round_trip_empty_registry() {
        let conn = memory_conn();
        let registry = Registry::new();

        save_registry(&conn, &registry).unwrap();
        let restored = load_registry(&conn);

        assert_eq!(restored, registry);
    }

    #[test]
    fn test_round_trip_populated_registry() {
        let conn = memory_conn();
        let mut registry = Registry::new();

        let id = registry.add(Category::Vaca).id.clone();
        registry.set_tag(&id, "A-101");
        registry.toggle(&id, Treatment::Vaccinated);
        registry.add(Category::Ternero); // empty tag, both flags false
        let id2 = registry.add(Category::Vaquillona).id.clone();
        registry.toggle(&id2, Treatment::Dewormed);

        save_registry(&conn, &registry).unwrap();
        let restored = load_registry(&conn);

        assert_eq!(restored.records(), registry.records());
    }

    #[test]
    fn test_load_without_snapshot_is_empty() {
        let conn = memory_conn();
        assert!(load_registry(&conn).is_empty());
    }

    #[test]
    fn test_corrupt_payload_falls_back_to_empty() {
        let conn = memory_conn();
        conn.execute(
            "INSERT INTO snapshots (name, payload, saved_at) VALUES (?1, ?2, ?3)",
            params![SNAPSHOT_NAME, "{not json", Utc::now().to_rfc3339()],
        )
        .unwrap();

        assert!(load_registry(&conn).is_empty());
    }

    #[test]
    fn test_unknown_category_falls_back_to_empty() {
        let conn = memory_conn();
        let payload = r#"[{"id":"x","category":"Unicornio","tag":"","vaccinated":false,"dewormed":false}]"#;
        conn.execute(
            "INSERT INTO snapshots (name, payload, saved_at) VALUES (?1, ?2, ?3)",
            params![SNAPSHOT_NAME, payload, Utc::now().to_rfc3339()],
        )
        .unwrap();

        assert!(load_registry(&conn).is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let conn = memory_conn();
        let mut registry = Registry::new();

        registry.add(Category::Toro);
        save_registry(&conn, &registry).unwrap();

        registry.clear();
        registry.add(Category::Novillo);
        registry.add(Category::Novillo);
        save_registry(&conn, &registry).unwrap();

        let restored = load_registry(&conn);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.count(Category::Novillo), 2);
        assert_eq!(restored.count(Category::Toro), 0);
    }

    #[test]
    fn test_on_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.db");

        let mut registry = Registry::new();
        registry.add(Category::Ternera);

        {
            let conn = open_database(&path).unwrap();
            save_registry(&conn, &registry).unwrap();
        }

        let conn = open_database(&path).unwrap();
        let restored = load_registry(&conn);
        assert_eq!(restored.records(), registry.records());
    }
}
