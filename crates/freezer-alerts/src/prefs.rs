//! Persistent key/value preferences.
//!
//! Holds the two enabled flags and the last known coordinates. Reads of a
//! missing key return the caller's default; a value that cannot be parsed is
//! treated the same way.

use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use freezer_core::{RusqliteErrorExt, StorageError};
use freezer_weather::Coordinates;

use crate::kind::AlertKind;

pub const LAST_LAT_KEY: &str = "last_lat";
pub const LAST_LON_KEY: &str = "last_lon";

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value store shared by the scheduler, the checks and the foreground path.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> StorageResult<bool>;
    fn set_bool(&self, key: &str, value: bool) -> StorageResult<()>;
    fn get_float(&self, key: &str, default: f64) -> StorageResult<f64>;
    fn set_float(&self, key: &str, value: f64) -> StorageResult<()>;
    fn contains(&self, key: &str) -> StorageResult<bool>;
}

/// Whether alerts of `kind` are on. Defaults to off.
pub fn is_enabled(store: &dyn PreferenceStore, kind: AlertKind) -> StorageResult<bool> {
    store.get_bool(kind.enabled_key(), false)
}

pub fn set_enabled(store: &dyn PreferenceStore, kind: AlertKind, enabled: bool) -> StorageResult<()> {
    store.set_bool(kind.enabled_key(), enabled)
}

/// Last coordinates the foreground path saw, if both halves are stored and valid.
pub fn last_location(store: &dyn PreferenceStore) -> StorageResult<Option<Coordinates>> {
    if !store.contains(LAST_LAT_KEY)? || !store.contains(LAST_LON_KEY)? {
        return Ok(None);
    }
    let lat = store.get_float(LAST_LAT_KEY, f64::NAN)?;
    let lon = store.get_float(LAST_LON_KEY, f64::NAN)?;

    match Coordinates::new(lat, lon) {
        Ok(coords) => Ok(Some(coords)),
        Err(e) => {
            tracing::warn!("Ignoring stored location: {}", e);
            Ok(None)
        }
    }
}

pub fn save_location(store: &dyn PreferenceStore, coords: Coordinates) -> StorageResult<()> {
    store.set_float(LAST_LAT_KEY, coords.lat)?;
    store.set_float(LAST_LON_KEY, coords.lon)
}

fn parse_or_default<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparsable preference value, using default");
            default
        }),
    }
}

/// SQLite-backed preferences.
pub struct SqlitePreferences {
    conn: Mutex<Connection>,
}

impl SqlitePreferences {
    /// Open (or create) the preference database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(|e| e.into_storage_error())?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| e.into_storage_error())?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| e.into_storage_error())?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn get_raw(&self, key: &str) -> StorageResult<Option<String>> {
        self.conn
            .lock()
            .query_row("SELECT value FROM preferences WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| e.into_storage_error())
    }

    fn set_raw(&self, key: &str, value: String) -> StorageResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| e.into_storage_error())?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferences {
    fn get_bool(&self, key: &str, default: bool) -> StorageResult<bool> {
        Ok(parse_or_default(key, self.get_raw(key)?, default))
    }

    fn set_bool(&self, key: &str, value: bool) -> StorageResult<()> {
        self.set_raw(key, value.to_string())
    }

    fn get_float(&self, key: &str, default: f64) -> StorageResult<f64> {
        Ok(parse_or_default(key, self.get_raw(key)?, default))
    }

    fn set_float(&self, key: &str, value: f64) -> StorageResult<()> {
        self.set_raw(key, value.to_string())
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get_raw(key)?.is_some())
    }
}

/// In-process preferences; nothing survives a restart.
#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str, default: bool) -> StorageResult<bool> {
        Ok(parse_or_default(key, self.values.read().get(key).cloned(), default))
    }

    fn set_bool(&self, key: &str, value: bool) -> StorageResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_float(&self, key: &str, default: f64) -> StorageResult<f64> {
        Ok(parse_or_default(key, self.values.read().get(key).cloned(), default))
    }

    fn set_float(&self, key: &str, value: f64) -> StorageResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.values.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_default_off() {
        let store = SqlitePreferences::in_memory().unwrap();
        assert!(!is_enabled(&store, AlertKind::Freeze).unwrap());
        assert!(!is_enabled(&store, AlertKind::Umbrella).unwrap());
    }

    #[test]
    fn test_flags_are_independent() {
        let store = SqlitePreferences::in_memory().unwrap();
        set_enabled(&store, AlertKind::Freeze, true).unwrap();
        assert!(is_enabled(&store, AlertKind::Freeze).unwrap());
        assert!(!is_enabled(&store, AlertKind::Umbrella).unwrap());

        set_enabled(&store, AlertKind::Freeze, false).unwrap();
        assert!(!is_enabled(&store, AlertKind::Freeze).unwrap());
    }

    #[test]
    fn test_location_absent_until_saved() {
        let store = MemoryPreferences::new();
        assert_eq!(last_location(&store).unwrap(), None);

        let coords = Coordinates::new(46.87, -96.79).unwrap();
        save_location(&store, coords).unwrap();
        assert_eq!(last_location(&store).unwrap(), Some(coords));
    }

    #[test]
    fn test_zero_zero_is_a_real_location() {
        let store = MemoryPreferences::new();
        let coords = Coordinates::new(0.0, 0.0).unwrap();
        save_location(&store, coords).unwrap();
        assert_eq!(last_location(&store).unwrap(), Some(coords));
    }

    #[test]
    fn test_half_stored_location_is_absent() {
        let store = MemoryPreferences::new();
        store.set_float(LAST_LAT_KEY, 40.0).unwrap();
        assert_eq!(last_location(&store).unwrap(), None);
    }

    #[test]
    fn test_unparsable_value_uses_default() {
        let store = SqlitePreferences::in_memory().unwrap();
        store.set_raw("freeze_alerts_enabled", "maybe".into()).unwrap();
        assert!(!is_enabled(&store, AlertKind::Freeze).unwrap());
        assert!(store.get_bool("freeze_alerts_enabled", true).unwrap());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.db");
        {
            let store = SqlitePreferences::new(&path).unwrap();
            set_enabled(&store, AlertKind::Umbrella, true).unwrap();
            save_location(&store, Coordinates::new(47.6, -122.3).unwrap()).unwrap();
        }
        let store = SqlitePreferences::new(&path).unwrap();
        assert!(is_enabled(&store, AlertKind::Umbrella).unwrap());
        let coords = last_location(&store).unwrap().unwrap();
        assert_eq!(coords.lat, 47.6);
        assert_eq!(coords.lon, -122.3);
    }
}
