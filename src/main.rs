use macroquad::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod animation;
mod config;
mod entity;
mod helpers;
mod interact;
mod map;
mod movement;
mod player;
mod render;
mod save;
mod tilemap;

use config::{GameConfig, WorldConfig};
use entity::{Actor, Entity};
use interact::{InteractRegistry, Interaction};
use map::MapManager;
use movement::MovementRegistry;
use player::PlayerLife;
use render::SpriteBank;
use save::SaveStore;
use tilemap::{AssetDir, TileSet};

const DIALOG_FONT_SIZE: f32 = 28.0;
const DIALOG_HEIGHT: f32 = 120.0;
const DIALOG_MARGIN: f32 = 20.0;

fn window_conf() -> Conf {
    Conf {
        window_title: "tilewalker".to_owned(),
        window_width: 800,
        window_height: 640,
        sample_count: 1,
        ..Default::default()
    }
}

async fn show_loading(label: &str, progress: f32) {
    let pct = (progress.clamp(0.0, 1.0) * 100.0).round();
    set_default_camera();
    clear_background(BLACK);
    draw_text(&format!("{label} {pct:.0}%"), 20.0, 40.0, 30.0, WHITE);
    next_frame().await;
}

/// Every `*.png` under the sprites directory, keyed by file stem.
async fn load_sprites(config: &GameConfig) -> SpriteBank {
    let mut sprites = SpriteBank::new();
    let dir = config.sprites_dir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("no sprites loaded from {}: {}", dir.display(), err);
            return sprites;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if !is_png {
            continue;
        }
        let dir = dir.to_string_lossy();
        if let Some(texture) = helpers::load_single_texture(&dir, stem).await {
            sprites.insert(stem.to_string(), texture);
        }
    }
    tracing::info!("Loaded {} sprites", sprites.len());
    sprites
}

/// `RUST_LOG`-style directives; `info` when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

struct DialogState {
    speaker: String,
    lines: Vec<String>,
    index: usize,
}

impl DialogState {
    fn new(interaction: Interaction) -> Option<Self> {
        let lines = interaction.lines().to_vec();
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            speaker: interaction.speaker().to_string(),
            lines,
            index: 0,
        })
    }

    /// Returns false once the last line has been dismissed.
    fn advance(&mut self) -> bool {
        self.index += 1;
        self.index < self.lines.len()
    }

    fn draw(&self) {
        let top = screen_height() - DIALOG_HEIGHT - DIALOG_MARGIN;
        let width = screen_width() - DIALOG_MARGIN * 2.0;
        draw_rectangle(DIALOG_MARGIN, top, width, DIALOG_HEIGHT, Color::new(0.0, 0.0, 0.0, 0.8));
        draw_rectangle_lines(DIALOG_MARGIN, top, width, DIALOG_HEIGHT, 2.0, WHITE);
        draw_text(
            &self.speaker,
            DIALOG_MARGIN * 2.0,
            top + DIALOG_FONT_SIZE,
            DIALOG_FONT_SIZE,
            YELLOW,
        );
        draw_text(
            &self.lines[self.index],
            DIALOG_MARGIN * 2.0,
            top + DIALOG_FONT_SIZE * 2.0 + DIALOG_MARGIN,
            DIALOG_FONT_SIZE,
            WHITE,
        );
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_writer(std::io::stderr)
        .init();

    let config = GameConfig::from_env();
    show_loading("Loading", 0.0).await;

    let world = match WorldConfig::load(config.world_path()) {
        Ok(world) => world,
        Err(err) => {
            tracing::error!("world layout load failed: {err}");
            return;
        }
    };
    show_loading("Loading", 0.2).await;

    let tileset_json = config.asset("tileset.json");
    let tileset_png = config.asset("tileset.png");
    let tileset = TileSet::load(&tileset_json.to_string_lossy(), &tileset_png.to_string_lossy())
        .await
        .map_err(|err| tracing::warn!("tileset load failed, drawing without tiles: {err}"))
        .ok();
    if let Some(tileset) = tileset.as_ref() {
        tracing::info!("Loaded tileset with {} tiles", tileset.count());
    }
    show_loading("Loading", 0.4).await;

    let sprites = load_sprites(&config).await;
    show_loading("Loading", 0.6).await;

    let save = match SaveStore::open(&config.save_path) {
        Ok(save) => save,
        Err(err) => {
            tracing::error!("save file unavailable: {err}");
            return;
        }
    };
    let mut life = match PlayerLife::load(save.clone(), world.settings.default_life) {
        Ok(life) => life,
        Err(err) => {
            tracing::error!("player life unavailable: {err}");
            return;
        }
    };
    show_loading("Loading", 0.8).await;

    let movement = MovementRegistry::new();
    let hero = Actor::player(
        &world.settings.player_sprite,
        Entity::new(Vec2::ZERO, world.settings.player_speed),
    );
    let mut maps = match MapManager::new(
        vec2(screen_width(), screen_height()),
        hero,
        save,
        Box::new(AssetDir::new(config.maps_dir())),
        &world,
        &movement,
    ) {
        Ok(maps) => maps,
        Err(err) => {
            tracing::error!("world setup failed: {err}");
            return;
        }
    };

    let interactions = InteractRegistry::new();
    let mut dialog: Option<DialogState> = None;
    let mut show_walls = false;

    loop {
        if is_key_pressed(KeyCode::F3) {
            show_walls = !show_walls;
        }

        if let Some(state) = dialog.as_mut() {
            if (is_key_pressed(KeyCode::E) || is_key_pressed(KeyCode::Space)) && !state.advance() {
                dialog = None;
            }
        } else {
            let entity = maps.player_entity_mut();
            entity.begin_step();
            player::handle_input(entity);

            if let Err(err) = maps.update() {
                tracing::error!("world update failed: {err}");
                break;
            }

            if is_key_pressed(KeyCode::E) {
                match maps.interact(&interactions, &mut life) {
                    Ok(Some(interaction)) => dialog = DialogState::new(interaction),
                    Ok(None) => {}
                    Err(err) => tracing::warn!("interaction failed: {err}"),
                }
            }
        }

        clear_background(BLACK);
        if let Err(err) = maps.draw(tileset.as_ref(), &sprites) {
            tracing::error!("draw failed: {err}");
            break;
        }

        if show_walls {
            if let (Ok(walls), Ok(group)) = (maps.get_walls(), maps.get_group()) {
                let view = vec2(screen_width(), screen_height()) / group.zoom();
                set_camera(&Camera2D {
                    target: group.camera_center(),
                    zoom: vec2(2.0 / view.x, 2.0 / view.y),
                    ..Default::default()
                });
                for wall in walls {
                    helpers::draw_hitbox(*wall);
                }
                helpers::draw_hitbox(maps.player_entity().feet());
                set_default_camera();
            }
        }

        if let Some(state) = dialog.as_ref() {
            state.draw();
        }

        draw_text(
            &format!("{}  HP: {}", maps.current_map(), life.life()),
            20.0,
            40.0,
            30.0,
            WHITE,
        );
        if life.is_dead() {
            draw_text("You fainted...", 20.0, 80.0, 30.0, RED);
        }

        next_frame().await;
    }
}
