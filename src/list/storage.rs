use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::Checklist;

/// The single key under which the full task collection is persisted.
pub const STORE_KEY: &str = "checklist";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Key-value persistence capability.
///
/// The controller depends on this trait rather than a concrete location so
/// tests can substitute [`MemoryStore`]. `log_event` is the best-effort
/// activity sink; the default implementation discards events.
pub trait Store {
    /// Load the blob stored under `key`, `None` if absent.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the blob stored under `key` wholesale.
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Append one activity line. Failures must never surface.
    fn log_event(&self, _line: &str) {}
}

/// On-disk store: each key maps to `<dir>/<key>.json`. The directory is
/// created lazily on first save so the store behaves like always-available
/// local storage.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_path(key), blob)?;
        Ok(())
    }

    fn log_event(&self, line: &str) {
        let _ = self.try_log_event(line);
    }
}

impl FileStore {
    fn try_log_event(&self, line: &str) -> std::io::Result<()> {
        use std::io::Write;
        fs::create_dir_all(&self.dir)?;
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.dir.join("activity.log"))?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// In-memory store. The fake used by tests, with captured activity lines.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
    events: RefCell<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.blobs.borrow_mut().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn log_event(&self, line: &str) {
        self.events.borrow_mut().push(line.to_string());
    }
}

/// Find the `.checklist` directory by walking up from `start`. Falls back to
/// `<start>/.checklist` when no ancestor has one; the directory is only
/// created once something is saved.
pub fn find_store_dir(start: &Path) -> PathBuf {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(".checklist");
        if candidate.is_dir() {
            return candidate;
        }
        if !dir.pop() {
            return start.join(".checklist");
        }
    }
}

/// Load the checklist from the store. A missing, unreadable, or unparsable
/// blob degrades to an empty checklist with no error surfaced. Keeping the
/// silent degrade is deliberate; see DESIGN.md.
pub fn load_checklist(store: &dyn Store) -> Checklist {
    match store.load(STORE_KEY) {
        Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_default(),
        _ => Checklist::default(),
    }
}

/// Persist the full checklist (tasks plus id counter), never the
/// filtered or sorted view.
pub fn save_checklist(store: &dyn Store, checklist: &Checklist) -> Result<(), StorageError> {
    let blob = serde_json::to_string_pretty(checklist)?;
    store.save(STORE_KEY, &blob)
}

// ---------------------------------------------------------------------------
// Activity log (.checklist/activity.log — append-only JSONL)
// ---------------------------------------------------------------------------

/// Record one mutation as a JSONL event. Best-effort: a log failure never
/// interrupts the operation being recorded.
pub fn record_activity(store: &dyn Store, action: &str, id: u64, text: &str) {
    let line = serde_json::json!({
        "ts": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "action": action,
        "id": id,
        "text": text,
    });
    store.log_event(&line.to_string());
}

// ---------------------------------------------------------------------------
// Local config (.checklist/config.toml — per-user preferences)
// ---------------------------------------------------------------------------

/// Load per-user preferences from `<dir>/config.toml`.
/// Returns defaults if the file is absent; surfaces a `StorageError` if the
/// file exists but cannot be parsed, so callers can warn the user.
pub fn load_local_config(dir: &Path) -> Result<crate::config::LocalConfig, StorageError> {
    let path = dir.join("config.toml");
    if !path.exists() {
        return Ok(crate::config::LocalConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Checklist {
        let mut cl = Checklist::new();
        cl.add("alpha");
        cl.add("beta");
        cl.toggle(2);
        cl
    }

    #[test]
    fn round_trip_preserves_ids_text_done_and_order() {
        let store = MemoryStore::new();
        let original = sample();
        save_checklist(&store, &original).unwrap();
        let loaded = load_checklist(&store);
        assert_eq!(loaded.next_id, original.next_id);
        assert_eq!(loaded.tasks, original.tasks);
    }

    #[test]
    fn missing_blob_loads_empty() {
        let store = MemoryStore::new();
        let loaded = load_checklist(&store);
        assert!(loaded.tasks.is_empty());
        assert_eq!(loaded.next_id, 0);
    }

    #[test]
    fn malformed_blob_degrades_to_empty() {
        let store = MemoryStore::new();
        store.save(STORE_KEY, "{not json at all").unwrap();
        let loaded = load_checklist(&store);
        assert!(loaded.tasks.is_empty());
    }

    #[test]
    fn wrong_shape_blob_degrades_to_empty() {
        let store = MemoryStore::new();
        store.save(STORE_KEY, "[1, 2, 3]").unwrap();
        let loaded = load_checklist(&store);
        assert!(loaded.tasks.is_empty());
    }

    #[test]
    fn id_counter_survives_round_trip() {
        let store = MemoryStore::new();
        let mut cl = sample();
        cl.remove(2);
        save_checklist(&store, &cl).unwrap();
        let mut loaded = load_checklist(&store);
        // A fresh add after reload must not reuse the removed task's id
        assert_eq!(loaded.add("gamma"), Some(3));
    }

    #[test]
    fn file_store_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join(".checklist"));
        let original = sample();
        save_checklist(&store, &original).unwrap();
        let loaded = load_checklist(&store);
        assert_eq!(loaded.tasks, original.tasks);
    }

    #[test]
    fn file_store_creates_dir_on_first_save() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".checklist");
        let store = FileStore::new(dir.clone());
        assert!(!dir.exists());
        save_checklist(&store, &Checklist::new()).unwrap();
        assert!(dir.join("checklist.json").exists());
    }

    #[test]
    fn file_store_corrupt_file_degrades_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".checklist");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("checklist.json"), "garbage").unwrap();
        let store = FileStore::new(dir);
        assert!(load_checklist(&store).tasks.is_empty());
    }

    #[test]
    fn find_store_dir_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".checklist");
        fs::create_dir_all(&dir).unwrap();
        let nested = tmp.path().join("sub").join("sub2");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_store_dir(&nested), dir);
    }

    #[test]
    fn find_store_dir_falls_back_to_start() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(find_store_dir(tmp.path()), tmp.path().join(".checklist"));
    }

    #[test]
    fn record_activity_appends_jsonl() {
        let store = MemoryStore::new();
        record_activity(&store, "add", 1, "Buy milk");
        record_activity(&store, "toggle", 1, "Buy milk");
        let events = store.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("\"action\":\"add\""));
        assert!(events[0].contains("\"text\":\"Buy milk\""));
        let parsed: serde_json::Value = serde_json::from_str(&events[1]).unwrap();
        assert_eq!(parsed["action"], "toggle");
        assert_eq!(parsed["id"], 1);
    }

    #[test]
    fn file_store_activity_log_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".checklist");
        let store = FileStore::new(dir.clone());
        record_activity(&store, "add", 7, "task \"quoted\"");
        record_activity(&store, "delete", 7, "task \"quoted\"");
        let content = fs::read_to_string(dir.join("activity.log")).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["text"], "task \"quoted\"");
        }
    }

    #[test]
    fn local_config_defaults_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_local_config(tmp.path()).unwrap();
        assert!(config.confirm_delete);
        assert!(!config.show_ids);
    }

    #[test]
    fn local_config_parses_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "confirm_delete = false\nshow_ids = true\n",
        )
        .unwrap();
        let config = load_local_config(tmp.path()).unwrap();
        assert!(!config.confirm_delete);
        assert!(config.show_ids);
    }

    #[test]
    fn local_config_invalid_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("config.toml"), "confirm_delete = [oops").unwrap();
        assert!(matches!(
            load_local_config(tmp.path()),
            Err(StorageError::TomlDe(_))
        ));
    }
}
