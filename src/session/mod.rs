//! Persisted pad state: pane heights and editor text, kept as a flat
//! string map between runs.

mod store;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::workspace::PaneHeights;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

pub const CODE_HEIGHT_KEY: &str = "codeBoxHeight";
pub const CONTEXT_HEIGHT_KEY: &str = "contextBoxHeight";
pub const OUTPUT_HEIGHT_KEY: &str = "outputBoxHeight";
pub const CODE_KEY: &str = "code";
pub const OUTPUT_KEY: &str = "output";

/// Raw key/value contents of a store.
pub type SessionMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not a flat string map: {0}")]
    Format(#[from] serde_json::Error),
}

/// Typed view of the stored session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadSession {
    /// Present only when all three heights parse.
    pub heights: Option<PaneHeights>,
    pub code: Option<String>,
    pub output: Option<String>,
}

impl PadSession {
    pub fn from_map(map: &SessionMap) -> Self {
        let height = |key: &str| map.get(key).and_then(|raw| raw.trim().parse::<u16>().ok());
        let heights = match (
            height(CODE_HEIGHT_KEY),
            height(CONTEXT_HEIGHT_KEY),
            height(OUTPUT_HEIGHT_KEY),
        ) {
            (Some(code), Some(context), Some(output)) => {
                Some(PaneHeights::new(code, context, output))
            }
            _ => None,
        };

        Self {
            heights,
            code: map.get(CODE_KEY).cloned(),
            output: map.get(OUTPUT_KEY).cloned(),
        }
    }

    /// Write this session over `map`, leaving unrelated keys alone.
    pub fn merge_into(&self, map: &mut SessionMap) {
        if let Some(heights) = self.heights {
            map.insert(CODE_HEIGHT_KEY.into(), heights.code.to_string());
            map.insert(CONTEXT_HEIGHT_KEY.into(), heights.context.to_string());
            map.insert(OUTPUT_HEIGHT_KEY.into(), heights.output.to_string());
        }
        if let Some(code) = &self.code {
            map.insert(CODE_KEY.into(), code.clone());
        }
        if let Some(output) = &self.output {
            map.insert(OUTPUT_KEY.into(), output.clone());
        }
    }
}

/// Read the typed session from a store.
pub fn load_session(store: &dyn SessionStore) -> Result<PadSession, SessionError> {
    Ok(PadSession::from_map(&store.load()?))
}

/// Merge `session` into whatever the store already holds and write it back.
pub fn save_session(store: &dyn SessionStore, session: &PadSession) -> Result<(), SessionError> {
    let mut map = store.load().unwrap_or_default();
    session.merge_into(&mut map);
    store.save(&map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_need_all_three_keys() {
        let mut map = SessionMap::new();
        map.insert(CODE_HEIGHT_KEY.into(), "12".into());
        map.insert(CONTEXT_HEIGHT_KEY.into(), "8".into());
        assert_eq!(PadSession::from_map(&map).heights, None);

        map.insert(OUTPUT_HEIGHT_KEY.into(), "nope".into());
        assert_eq!(PadSession::from_map(&map).heights, None);

        map.insert(OUTPUT_HEIGHT_KEY.into(), "20".into());
        assert_eq!(
            PadSession::from_map(&map).heights,
            Some(PaneHeights::new(12, 8, 20))
        );
    }

    #[test]
    fn save_keeps_foreign_keys() {
        let store = MemorySessionStore::default();
        let mut seed = SessionMap::new();
        seed.insert("theme".into(), "dark".into());
        store.save(&seed).unwrap();

        let session = PadSession {
            heights: Some(PaneHeights::new(10, 5, 5)),
            code: Some("print(1)".into()),
            output: Some(String::new()),
        };
        save_session(&store, &session).unwrap();

        let map = store.load().unwrap();
        assert_eq!(map["theme"], "dark");
        assert_eq!(map[CODE_HEIGHT_KEY], "10");
        assert_eq!(map[OUTPUT_KEY], "");
        assert_eq!(load_session(&store).unwrap(), session);
    }
}
