use std::collections::HashMap;

use macroquad::prelude::*;

use crate::animation::Animation;
use crate::movement::Behavior;

pub const ENTITY_SIZE: Vec2 = Vec2::new(16.0, 32.0);
pub const FEET_HEIGHT: f32 = 12.0;
pub const PLAYER_SPEED: f32 = 2.0;
pub const NPC_SPEED: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    Right,
    Up,
    Left,
    #[default]
    Down,
}

impl Direction {
    /// Column offset of this facing inside a sprite sheet row.
    pub fn sheet_offset(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Up => 6,
            Self::Left => 12,
            Self::Down => 18,
        }
    }
}

/// Movable body: position, last known good position and footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pos: Vec2,
    old_pos: Vec2,
    size: Vec2,
    pub speed: f32,
    default_speed: f32,
    pub direction: Direction,
    pub moving: bool,
}

impl Entity {
    pub fn new(pos: Vec2, speed: f32) -> Self {
        Self::with_size(pos, ENTITY_SIZE, speed)
    }

    pub fn with_size(pos: Vec2, size: Vec2, speed: f32) -> Self {
        Self {
            pos,
            old_pos: pos,
            size,
            speed,
            default_speed: speed,
            direction: Direction::default(),
            moving: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    #[cfg(test)]
    pub fn old_position(&self) -> Vec2 {
        self.old_pos
    }

    pub fn default_speed(&self) -> f32 {
        self.default_speed
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    /// Half-width strip at the bottom-center of the body.
    pub fn feet(&self) -> Rect {
        let w = self.size.x * 0.5;
        let h = FEET_HEIGHT.min(self.size.y);
        Rect::new(
            self.pos.x + (self.size.x - w) * 0.5,
            self.pos.y + self.size.y - h,
            w,
            h,
        )
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    pub fn save_location(&mut self) {
        self.old_pos = self.pos;
    }

    /// Start of a movement step: remember where we are and assume we stand still.
    pub fn begin_step(&mut self) {
        self.save_location();
        self.moving = false;
    }

    pub fn move_back(&mut self) {
        self.pos = self.old_pos;
    }

    /// One tick of movement. On a diagonal the horizontal component runs at half speed.
    pub fn step(&mut self, direction: Direction, diagonal: bool) {
        let horizontal = if diagonal { self.speed * 0.5 } else { self.speed };
        match direction {
            Direction::Up => self.pos.y -= self.speed,
            Direction::Down => self.pos.y += self.speed,
            Direction::Left => self.pos.x -= horizontal,
            Direction::Right => self.pos.x += horizontal,
        }
        self.moving = true;
        self.direction = direction;
    }

    /// Combined input: the vertical part moves first, the horizontal part decides the facing.
    pub fn walk(&mut self, horizontal: Option<Direction>, vertical: Option<Direction>) {
        match (horizontal, vertical) {
            (Some(h), Some(v)) => {
                self.step(v, true);
                self.step(h, true);
            }
            (Some(h), None) => self.step(h, false),
            (None, Some(v)) => self.step(v, false),
            (None, None) => {}
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    BasicNpc,
    ShopNpc,
    Decoration,
}

impl ActorKind {
    pub fn collides_with_walls(self) -> bool {
        !matches!(self, Self::Decoration)
    }

    pub fn gated_by_proximity(self) -> bool {
        matches!(self, Self::BasicNpc)
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, Self::BasicNpc | Self::ShopNpc)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(usize);

pub struct Actor {
    pub name: String,
    pub kind: ActorKind,
    pub sprite: String,
    pub entity: Entity,
    pub animation: Animation,
    pub dialog: Vec<String>,
    pub on_interact: Vec<String>,
    pub behavior: Option<Behavior>,
}

impl Actor {
    pub fn player(sprite: &str, entity: Entity) -> Self {
        Self::walker("player", ActorKind::Player, sprite, entity)
    }

    pub fn npc(name: &str, sprite: &str, speed: f32, behavior: Behavior) -> Self {
        let mut actor = Self::walker(name, ActorKind::BasicNpc, sprite, Entity::new(Vec2::ZERO, speed));
        actor.behavior = Some(behavior);
        actor
    }

    pub fn shop(name: &str, sprite: &str, behavior: Behavior) -> Self {
        let mut actor = Self::walker(name, ActorKind::ShopNpc, sprite, Entity::new(Vec2::ZERO, 0.0));
        actor.behavior = Some(behavior);
        actor
    }

    pub fn decoration(name: &str, area: Rect) -> Self {
        Self {
            name: name.to_string(),
            kind: ActorKind::Decoration,
            sprite: name.to_string(),
            entity: Entity::with_size(area.point(), area.size(), 0.0),
            animation: Animation::decoration(),
            dialog: Vec::new(),
            on_interact: Vec::new(),
            behavior: None,
        }
    }

    fn walker(name: &str, kind: ActorKind, sprite: &str, entity: Entity) -> Self {
        Self {
            name: name.to_string(),
            kind,
            sprite: sprite.to_string(),
            entity,
            animation: Animation::walking(),
            dialog: Vec::new(),
            on_interact: Vec::new(),
            behavior: None,
        }
    }

    pub fn with_dialog(mut self, dialog: Vec<String>, on_interact: Vec<String>) -> Self {
        self.dialog = dialog;
        self.on_interact = on_interact;
        self
    }
}

/// Owner of every actor in the game. Maps and render groups refer to actors by id.
///
/// Ids are never reused, so a despawned id stays dead.
#[derive(Default)]
pub struct Actors {
    list: HashMap<ActorId, Actor>,
    next: usize,
}

impl Actors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        let id = ActorId(self.next);
        self.next += 1;
        self.list.insert(id, actor);
        id
    }

    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        self.list.remove(&id)
    }

    pub fn get(&self, id: ActorId) -> &Actor {
        &self.list[&id]
    }

    pub fn get_mut(&mut self, id: ActorId) -> &mut Actor {
        self.list
            .get_mut(&id)
            .unwrap_or_else(|| panic!("actor {id:?} was despawned"))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.list.len()
    }
}
