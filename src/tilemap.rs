use macroquad::file::load_string;
use macroquad::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tiled stores flip flags in the top bits of every gid.
const GID_MASK: u32 = 0x1FFF_FFFF;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("json error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no tile map named '{0}'")]
    NotFound(String),

    #[error("texture error: {0}")]
    Texture(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", alias = "class", default)]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

impl MapObject {
    #[cfg(test)]
    pub fn new(name: &str, kind: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn point(&self) -> Vec2 {
        vec2(self.x, self.y)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileLayer {
    pub width: usize,
    pub data: Vec<u32>,
}

/// Read-only object model of one tile-map asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileMapData {
    pub tile_width: f32,
    pub tile_height: f32,
    tile_layers: Vec<TileLayer>,
    objects: Vec<MapObject>,
}

impl TileMapData {
    pub fn new(tile_width: f32, tile_height: f32) -> Self {
        Self {
            tile_width,
            tile_height,
            tile_layers: Vec::new(),
            objects: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_object(mut self, object: MapObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    #[cfg(test)]
    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<&MapObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: TileMapFile = serde_json::from_str(json)?;
        let mut data = Self::new(parsed.tilewidth, parsed.tileheight);
        for layer in parsed.layers {
            data.push_layer(layer);
        }
        Ok(data)
    }

    fn push_layer(&mut self, layer: LayerFile) {
        match layer {
            LayerFile::TileLayer { width, data } => self.tile_layers.push(TileLayer { width, data }),
            LayerFile::ObjectGroup { objects } => self.objects.extend(objects),
            LayerFile::Group { layers } => {
                for child in layers {
                    self.push_layer(child);
                }
            }
            LayerFile::Other => {}
        }
    }

    pub fn draw_layers(&self, tileset: &TileSet) {
        for layer in &self.tile_layers {
            for (i, raw) in layer.data.iter().enumerate() {
                let gid = raw & GID_MASK;
                if gid == 0 || layer.width == 0 {
                    continue;
                }
                let Some(source) = tileset.get(gid - 1) else {
                    continue;
                };
                let x = (i % layer.width) as f32 * self.tile_width;
                let y = (i / layer.width) as f32 * self.tile_height;
                draw_texture_ex(
                    tileset.texture(),
                    x,
                    y,
                    WHITE,
                    DrawTextureParams {
                        dest_size: Some(vec2(self.tile_width, self.tile_height)),
                        source: Some(source),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

/// Where tile-map assets come from.
pub trait MapSource {
    fn load(&self, name: &str) -> Result<TileMapData, AssetError>;
}

/// Tiled JSON exports stored as `{root}/{name}.json`.
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl MapSource for AssetDir {
    fn load(&self, name: &str) -> Result<TileMapData, AssetError> {
        let path = self.root.join(format!("{name}.json"));
        let json = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(name.to_string()),
            _ => AssetError::Io {
                path: path.display().to_string(),
                source,
            },
        })?;
        TileMapData::from_json(&json).map_err(|source| AssetError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

#[derive(Deserialize)]
struct TileMapFile {
    #[serde(default = "default_tile_size")]
    tilewidth: f32,
    #[serde(default = "default_tile_size")]
    tileheight: f32,
    #[serde(default)]
    layers: Vec<LayerFile>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LayerFile {
    TileLayer {
        width: usize,
        #[serde(default)]
        data: Vec<u32>,
    },
    ObjectGroup {
        #[serde(default)]
        objects: Vec<MapObject>,
    },
    Group {
        #[serde(default)]
        layers: Vec<LayerFile>,
    },
    #[serde(other)]
    Other,
}

fn default_tile_size() -> f32 {
    16.0
}

#[derive(Deserialize)]
struct TilesetFile {
    image: Option<String>,
    tile_width: u16,
    tile_height: u16,
    columns: u16,
    rows: u16,
    #[serde(default)]
    tiles: Vec<TileInfoFile>,
}

#[derive(Deserialize)]
struct TileInfoFile {
    id: u16,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

/// Atlas texture plus the source rectangle of every tile id.
pub struct TileSet {
    texture: Texture2D,
    tiles: Vec<Option<Rect>>,
}

impl TileSet {
    pub async fn load(tileset_json: &str, texture_path: &str) -> Result<Self, AssetError> {
        let json_content = load_string(tileset_json)
            .await
            .map_err(|err| AssetError::Texture(err.to_string()))?;
        let parsed: TilesetFile =
            serde_json::from_str(&json_content).map_err(|source| AssetError::Json {
                path: tileset_json.to_string(),
                source,
            })?;
        let tiles = tile_rects(&parsed);

        let texture = load_texture(texture_path)
            .await
            .map_err(|err| AssetError::Texture(err.to_string()))?;
        texture.set_filter(FilterMode::Nearest);

        if let Some(image) = parsed.image.as_ref() {
            let file_name = Path::new(texture_path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("");
            if !image.is_empty() && image != file_name {
                tracing::warn!(
                    "tileset image '{}' does not match texture path '{}'",
                    image,
                    texture_path
                );
            }
        }

        Ok(Self { texture, tiles })
    }

    fn get(&self, id: u32) -> Option<Rect> {
        self.tiles.get(id as usize).and_then(|rect| *rect)
    }

    pub fn texture(&self) -> &Texture2D {
        &self.texture
    }

    pub fn count(&self) -> usize {
        self.tiles.len()
    }
}

/// Explicit tile entries win; otherwise the atlas is cut into a uniform grid.
fn tile_rects(parsed: &TilesetFile) -> Vec<Option<Rect>> {
    if parsed.tiles.is_empty() {
        let columns = parsed.columns.max(1) as usize;
        let rows = parsed.rows.max(1) as usize;
        return (0..columns * rows)
            .map(|i| {
                Some(Rect::new(
                    (i % columns) as f32 * parsed.tile_width as f32,
                    (i / columns) as f32 * parsed.tile_height as f32,
                    parsed.tile_width as f32,
                    parsed.tile_height as f32,
                ))
            })
            .collect();
    }

    let mut tiles: Vec<Option<Rect>> = Vec::new();
    for tile in &parsed.tiles {
        let idx = tile.id as usize;
        if idx >= tiles.len() {
            tiles.resize(idx + 1, None);
        }
        tiles[idx] = Some(Rect::new(
            tile.x as f32,
            tile.y as f32,
            tile.width as f32,
            tile.height as f32,
        ));
    }
    tiles
}

/// In-memory maps keyed by name.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySource {
    maps: std::collections::HashMap<String, TileMapData>,
}

#[cfg(test)]
impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, data: TileMapData) {
        self.maps.insert(name.to_string(), data);
    }
}

#[cfg(test)]
impl MapSource for MemorySource {
    fn load(&self, name: &str) -> Result<TileMapData, AssetError> {
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}
