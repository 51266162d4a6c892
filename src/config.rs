//! Runtime configuration.
//!
//! [`GameConfig`] locates assets and the save file (environment driven),
//! [`WorldConfig`] describes the maps, their portals and who lives on them.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::entity::{NPC_SPEED, PLAYER_SPEED};

const DEFAULT_ASSETS: &str = "assets";
const DEFAULT_SAVE: &str = "saves/saves.json";
const DEFAULT_WORLD: &str = "world.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml error in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub asset_root: PathBuf,
    pub save_path: PathBuf,
    pub world_file: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSETS),
            save_path: PathBuf::from(DEFAULT_SAVE),
            world_file: PathBuf::from(DEFAULT_WORLD),
        }
    }
}

impl GameConfig {
    /// Reads `TILEWALKER_ASSETS`, `TILEWALKER_SAVE` and `TILEWALKER_WORLD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            asset_root: lookup("TILEWALKER_ASSETS")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_root),
            save_path: lookup("TILEWALKER_SAVE")
                .map(PathBuf::from)
                .unwrap_or(defaults.save_path),
            world_file: lookup("TILEWALKER_WORLD")
                .map(PathBuf::from)
                .unwrap_or(defaults.world_file),
        }
    }

    pub fn asset(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(relative)
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.asset("maps")
    }

    pub fn sprites_dir(&self) -> PathBuf {
        self.asset("sprites")
    }

    pub fn world_path(&self) -> PathBuf {
        self.asset(&self.world_file)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub maps: Vec<MapConfig>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_life")]
    pub default_life: i32,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_npc_speed")]
    pub npc_speed: f32,
    #[serde(default = "default_player_sprite")]
    pub player_sprite: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_life: default_life(),
            player_speed: default_player_speed(),
            npc_speed: default_npc_speed(),
            player_sprite: default_player_sprite(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapConfig {
    pub name: String,
    #[serde(default)]
    pub portals: Vec<PortalConfig>,
    #[serde(default)]
    pub npcs: Vec<NpcConfig>,
    #[serde(default)]
    pub shops: Vec<NpcConfig>,
}

/// Portal leaving the map it is declared under.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PortalConfig {
    pub origin: String,
    pub target: String,
    pub teleport: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NpcConfig {
    pub name: String,
    pub sprite: Option<String>,
    #[serde(default = "default_movement")]
    pub movement: String,
    #[serde(default)]
    pub dialog: Vec<String>,
    #[serde(default)]
    pub on_interact: Vec<String>,
}

impl WorldConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn map(&self, name: &str) -> Option<&MapConfig> {
        self.maps.iter().find(|map| map.name == name)
    }
}

fn default_life() -> i32 {
    100
}

fn default_player_speed() -> f32 {
    PLAYER_SPEED
}

fn default_npc_speed() -> f32 {
    NPC_SPEED
}

fn default_player_sprite() -> String {
    "player".to_string()
}

fn default_movement() -> String {
    "patrol".to_string()
}
