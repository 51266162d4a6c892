//! Persisted world state.
//!
//! The save document is a small JSON file shaped like
//! `{"player": {"position": [x, y], "life": 100, "current_world": "World"}}`.
//! Every accessor opens the file; every setter rewrites the whole document
//! (read, mutate one field, write back through a temp file and rename).
//! Unknown fields are preserved across writes.

use std::fs;
use std::path::{Path, PathBuf};

use macroquad::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STARTING_WORLD: &str = "World";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error on save file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed save file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, SaveError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub player: PlayerSave,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSave {
    #[serde(default)]
    pub position: Option<[f32; 2]>,
    #[serde(default)]
    pub life: Option<i32>,
    #[serde(default = "default_world")]
    pub current_world: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SaveFile {
    fn default() -> Self {
        Self {
            player: PlayerSave {
                position: None,
                life: None,
                current_world: default_world(),
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }
    }
}

fn default_world() -> String {
    STARTING_WORLD.to_string()
}

/// Handle on the save document. Holds only the path; no state is cached.
#[derive(Debug, Clone)]
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    /// Open the save file, writing a fresh document if none exists yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| store.io_error(source))?;
            }
            store.write(&SaveFile::default())?;
            tracing::info!("Created new save file at {}", store.path.display());
        }
        Ok(store)
    }

    pub fn read(&self) -> Result<SaveFile> {
        let content = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        serde_json::from_str(&content).map_err(|source| SaveError::Json {
            path: self.path.display().to_string(),
            source,
        })
    }

    pub fn current_world(&self) -> Result<String> {
        Ok(self.read()?.player.current_world)
    }

    pub fn position(&self) -> Result<Option<Vec2>> {
        Ok(self.read()?.player.position.map(|[x, y]| vec2(x, y)))
    }

    pub fn life(&self) -> Result<Option<i32>> {
        Ok(self.read()?.player.life)
    }

    pub fn set_current_world(&self, name: &str) -> Result<()> {
        self.modify(|player| player.current_world = name.to_string())
    }

    pub fn set_position(&self, position: Vec2) -> Result<()> {
        self.modify(|player| player.position = Some([position.x, position.y]))
    }

    pub fn set_life(&self, life: i32) -> Result<()> {
        self.modify(|player| player.life = Some(life))
    }

    fn modify(&self, mutate: impl FnOnce(&mut PlayerSave)) -> Result<()> {
        let mut save = self.read()?;
        mutate(&mut save.player);
        self.write(&save)
    }

    fn write(&self, save: &SaveFile) -> Result<()> {
        let json = serde_json::to_string_pretty(save).map_err(|source| SaveError::Json {
            path: self.path.display().to_string(),
            source,
        })?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|source| self.io_error(source))?;
        fs::rename(&temp_path, &self.path).map_err(|source| self.io_error(source))?;
        tracing::debug!("Wrote save file {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> SaveError {
        SaveError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
