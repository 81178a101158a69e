use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::TokenRecord;

/// Single-record holder of the upstream access token
pub trait TokenStore: Send + Sync {
    /// Full record, or None if absent or unusable
    fn load(&self) -> Option<TokenRecord>;

    /// Replace the record. Readers never observe a partial write.
    fn write(&self, token: &str, updated_at: &str) -> AppResult<()>;

    /// Current token, or None if absent, unreadable or empty
    fn read(&self) -> Option<String> {
        self.load().map(|record| record.token)
    }
}

/// Token record persisted as a JSON file
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read token file {:?}: {}", self.path, e);
                }
                return None;
            }
        };

        match serde_json::from_str::<TokenRecord>(&content) {
            Ok(record) if !record.token.is_empty() => Some(record),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to parse token file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn write(&self, token: &str, updated_at: &str) -> AppResult<()> {
        if token.is_empty() {
            return Err(AppError::Store("Refusing to store an empty token".to_string()));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&TokenRecord::new(token, updated_at))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("token.json");
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&temp_path, content) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        // Atomic rename
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(AppError::Store(format!(
                "Failed to replace token file {:?}: {}",
                self.path, e
            )));
        }

        Ok(())
    }
}

/// In-process token store
#[derive(Default)]
pub struct MemoryTokenStore {
    record: RwLock<Option<TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str, updated_at: &str) -> Self {
        Self {
            record: RwLock::new(Some(TokenRecord::new(token, updated_at))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenRecord> {
        self.record
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(|record| !record.token.is_empty())
    }

    fn write(&self, token: &str, updated_at: &str) -> AppResult<()> {
        if token.is_empty() {
            return Err(AppError::Store("Refusing to store an empty token".to_string()));
        }
        let mut guard = self
            .record
            .write()
            .map_err(|_| AppError::Store("Token store lock poisoned".to_string()))?;
        *guard = Some(TokenRecord::new(token, updated_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_file_store_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage").join("token.json");
        let store = FileTokenStore::new(&path);

        store.write("abc", "2024-05-01T10:00:00+07:00").unwrap();
        assert_eq!(store.read().as_deref(), Some("abc"));

        store.write("def", "2024-05-02T10:00:00+07:00").unwrap();
        let record = store.load().unwrap();
        assert_eq!(record.token, "def");
        assert_eq!(record.updated_at, "2024-05-02T10:00:00+07:00");

        // Only the record itself remains; temp files are renamed away
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_file_store_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        FileTokenStore::new(&path)
            .write("abc", "2024-05-01T10:00:00+07:00")
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["token"], "abc");
        assert_eq!(value["updated_at"], "2024-05-01T10:00:00+07:00");
    }

    #[test]
    fn test_file_store_garbage_and_empty_token_read_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let store = FileTokenStore::new(&path);

        fs::write(&path, "not json").unwrap();
        assert_eq!(store.read(), None);

        fs::write(&path, r#"{"token":"","updated_at":"x"}"#).unwrap();
        assert_eq!(store.read(), None);

        fs::write(&path, r#"{"updated_at":"x"}"#).unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_empty_token_write_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        assert!(store.write("", "2024-05-01T10:00:00+07:00").is_err());

        let memory = MemoryTokenStore::with_token("keep", "t0");
        assert!(memory.write("", "t1").is_err());
        assert_eq!(memory.read().as_deref(), Some("keep"));
    }

    #[test]
    fn test_concurrent_reads_see_whole_records() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileTokenStore::new(dir.path().join("token.json")));
        store.write("alpha-token", "2024-05-01T10:00:00+07:00").unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let token = if i % 2 == 0 { "beta-token" } else { "alpha-token" };
                    store.write(token, "2024-05-02T10:00:00+07:00").unwrap();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut reads = 0;
        loop {
            let finished = done.load(Ordering::SeqCst);
            let token = store.read();
            assert!(
                matches!(token.as_deref(), Some("alpha-token") | Some("beta-token")),
                "observed {:?}",
                token
            );
            reads += 1;
            if finished {
                break;
            }
        }
        writer.join().unwrap();

        assert!(reads > 0);
        assert!(store.read().is_some());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.read(), None);
        store.write("abc", "t1").unwrap();
        assert_eq!(store.load(), Some(TokenRecord::new("abc", "t1")));
    }
}
