use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{SessionError, SessionMap};

/// Backing storage for the session map.
pub trait SessionStore: Send + Sync {
    /// Current contents; an absent store reads as empty.
    fn load(&self) -> Result<SessionMap, SessionError>;
    fn save(&self, map: &SessionMap) -> Result<(), SessionError>;
}

/// Session kept as a pretty-printed JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionMap, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(SessionMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SessionMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, map: &SessionMap) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local store used by tests and scripted runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    map: Mutex<SessionMap>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionMap, SessionError> {
        self.map
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| std::io::Error::other("session store poisoned").into())
    }

    fn save(&self, map: &SessionMap) -> Result<(), SessionError> {
        let mut guard = self
            .map
            .lock()
            .map_err(|_| std::io::Error::other("session store poisoned"))?;
        *guard = map.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn file_round_trip_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("state").join("session.json"));
        let mut map = SessionMap::new();
        map.insert("code".into(), "a = 1\nb = 2".into());
        store.save(&map).unwrap();

        assert_eq!(store.load().unwrap(), map);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"code\""));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load(), Err(SessionError::Format(_))));
    }
}
