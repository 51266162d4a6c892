use std::collections::HashMap;

use macroquad::prelude::*;

use crate::entity::{ActorId, ActorKind, Actors};
use crate::tilemap::{TileMapData, TileSet};

const ZOOM_BASE: f32 = 5.6;
const ZOOM_DIVISOR: f32 = 720.0;
const MIN_ZOOM: f32 = 1.0;
const IDLE_ROW: f32 = 32.0;
const WALK_ROW: f32 = 64.0;

/// Zoom shrinks as the window grows so bigger windows see more of the map.
pub fn zoom_for_target(width: f32, height: f32) -> f32 {
    (ZOOM_BASE - (width + height) / ZOOM_DIVISOR).max(MIN_ZOOM)
}

pub type SpriteBank = HashMap<String, Texture2D>;

/// Actors drawn on top of one map, plus the camera looking at them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderGroup {
    members: Vec<ActorId>,
    zoom: f32,
    center: Vec2,
}

impl RenderGroup {
    pub fn new(zoom: f32) -> Self {
        Self {
            members: Vec::new(),
            zoom,
            center: Vec2::ZERO,
        }
    }

    pub fn add(&mut self, id: ActorId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    pub fn remove(&mut self, id: ActorId) {
        self.members.retain(|member| *member != id);
    }

    #[cfg(test)]
    pub fn contains(&self, id: ActorId) -> bool {
        self.members.contains(&id)
    }

    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn center(&mut self, point: Vec2) {
        self.center = point;
    }

    pub fn camera_center(&self) -> Vec2 {
        self.center
    }

    pub fn update(&self, actors: &mut Actors) {
        for &id in &self.members {
            actors.get_mut(id).animation.tick();
        }
    }

    pub fn draw(&self, actors: &Actors, data: &TileMapData, tileset: Option<&TileSet>, sprites: &SpriteBank) {
        let view = vec2(screen_width(), screen_height()) / self.zoom.max(0.01);
        set_camera(&Camera2D {
            target: self.center,
            zoom: vec2(2.0 / view.x.max(1.0), 2.0 / view.y.max(1.0)),
            ..Default::default()
        });

        if let Some(tileset) = tileset {
            data.draw_layers(tileset);
        }

        let mut order = self.members.clone();
        order.sort_by(|a, b| {
            let a = actors.get(*a).entity.rect();
            let b = actors.get(*b).entity.rect();
            (a.y + a.h).total_cmp(&(b.y + b.h))
        });

        for id in order {
            let actor = actors.get(id);
            let rect = actor.entity.rect();
            let Some(texture) = sprites.get(&actor.sprite) else {
                draw_rectangle(rect.x, rect.y, rect.w, rect.h, Color::from_hex(0xFF00FF));
                continue;
            };
            let frame = actor.animation.frame();
            let source = match actor.kind {
                ActorKind::Decoration => Rect::new(frame as f32 * rect.w, 0.0, rect.w, rect.h),
                _ => {
                    let row = if actor.entity.moving { WALK_ROW } else { IDLE_ROW };
                    let column = actor.entity.direction.sheet_offset() + frame;
                    Rect::new(column as f32 * rect.w, row, rect.w, rect.h)
                }
            };
            draw_texture_ex(
                texture,
                rect.x,
                rect.y,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(rect.size()),
                    source: Some(source),
                    ..Default::default()
                },
            );
        }

        set_default_camera();
    }
}
