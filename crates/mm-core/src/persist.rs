//! Board persistence over a string key-value store.
//!
//! Layout of the keys:
//!
//! | key                  | value                   |
//! |----------------------|-------------------------|
//! | `board-<id>`         | JSON array of nodes     |
//! | `board-name-<id>`    | board name              |
//! | `board-theme-<id>`   | board theme name        |
//! | `mindmesh-theme`     | global theme name       |
//!
//! Loading never fails: unreadable or malformed entries fall back to an
//! empty board. Groups are derived state and are not stored.

use crate::model::{Board, Node};
use crate::store::NodeStore;
use std::collections::HashMap;

pub const GLOBAL_THEME_KEY: &str = "mindmesh-theme";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key} ({needed} bytes)")]
    QuotaExceeded { key: String, needed: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A synchronous string key-value backend (browser `localStorage`, memory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend with an optional byte quota over all values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

pub fn nodes_key(board_id: &str) -> String {
    format!("board-{board_id}")
}

pub fn name_key(board_id: &str) -> String {
    format!("board-name-{board_id}")
}

pub fn theme_key(board_id: &str) -> String {
    format!("board-theme-{board_id}")
}

/// Loads and saves boards through a [`KeyValueStore`].
pub struct BoardRepository<S> {
    storage: S,
}

impl<S: KeyValueStore> BoardRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load a board, or a fresh one if nothing usable is stored.
    pub fn load(&self, board_id: &str) -> Board {
        let mut board = Board::new(board_id);

        if let Some(raw) = self.read(&nodes_key(board_id)) {
            match serde_json::from_str::<Vec<Node>>(&raw) {
                Ok(nodes) => board.store = NodeStore::from_nodes(nodes),
                Err(e) => log::warn!("board {board_id}: ignoring malformed node data: {e}"),
            }
        }
        if let Some(name) = self.read(&name_key(board_id)) {
            board.name = name;
        }
        if let Some(theme) = self.read(&theme_key(board_id)) {
            board.theme_name = theme;
        }
        board
    }

    pub fn exists(&self, board_id: &str) -> bool {
        self.read(&nodes_key(board_id)).is_some()
    }

    /// Write nodes, name and theme. Callers may ignore the error and keep
    /// working from memory.
    pub fn save(&mut self, board: &Board) -> Result<(), PersistError> {
        let json = serde_json::to_string(board.store.nodes())?;
        self.storage.set(&nodes_key(&board.id), &json)?;
        self.storage.set(&name_key(&board.id), &board.name)?;
        self.storage.set(&theme_key(&board.id), &board.theme_name)?;
        log::debug!("board {}: saved {} node(s)", board.id, board.store.len());
        Ok(())
    }

    pub fn delete(&mut self, board_id: &str) -> Result<(), PersistError> {
        self.storage.remove(&nodes_key(board_id))?;
        self.storage.remove(&name_key(board_id))?;
        self.storage.remove(&theme_key(board_id))?;
        Ok(())
    }

    pub fn global_theme(&self) -> Option<String> {
        self.read(GLOBAL_THEME_KEY)
    }

    pub fn set_global_theme(&mut self, theme: &str) -> Result<(), PersistError> {
        self.storage.set(GLOBAL_THEME_KEY, theme)?;
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("storage read {key} failed: {e}");
                None
            }
        }
    }
}
