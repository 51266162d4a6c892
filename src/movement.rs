use std::collections::HashMap;

use macroquad::prelude::*;

use crate::entity::{Direction, Entity};
use crate::helpers::rects_collide;
use crate::tilemap::TileMapData;

/// Horizontal or vertical alignment tolerance when picking a patrol leg direction.
const ALIGN_TOLERANCE: f32 = 3.0;

pub type MovementFn = fn(entity: &mut Entity, route: &mut PatrolRoute);

/// Points an NPC walks between, read from `{name}_path1`, `{name}_path2`, ...
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatrolRoute {
    points: Vec<Rect>,
    current: usize,
}

impl PatrolRoute {
    pub fn new(points: Vec<Rect>) -> Self {
        Self { points, current: 0 }
    }

    /// Scans consecutive path objects; an empty route means the map has no spawn for `npc`.
    pub fn load(npc: &str, data: &TileMapData) -> Self {
        let points = (1..)
            .map_while(|n| data.get_object_by_name(&format!("{npc}_path{n}")))
            .map(|object| object.rect())
            .collect();
        Self::new(points)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn spawn(&self) -> Option<Vec2> {
        self.points.first().map(|rect| rect.point())
    }

    #[cfg(test)]
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    fn leg(&self) -> Option<(Rect, usize)> {
        let from = *self.points.get(self.current)?;
        let target = (self.current + 1) % self.points.len();
        Some((from, target))
    }
}

pub struct Behavior {
    pub movement: MovementFn,
    pub route: PatrolRoute,
}

impl Behavior {
    pub fn new(policy: &str, registry: &MovementRegistry) -> Self {
        Self {
            movement: registry.resolve(policy),
            route: PatrolRoute::default(),
        }
    }

    pub fn run(&mut self, entity: &mut Entity) {
        (self.movement)(entity, &mut self.route);
    }

    /// Place the entity on its spawn point and rewind the route.
    pub fn teleport_spawn(&mut self, entity: &mut Entity) -> bool {
        let Some(spawn) = self.route.spawn() else {
            return false;
        };
        self.route.reset();
        entity.set_position(spawn);
        entity.save_location();
        true
    }
}

pub struct MovementRegistry {
    fns: HashMap<String, MovementFn>,
}

impl Default for MovementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            fns: HashMap::new(),
        };
        registry.register("idle", movement_idle);
        registry.register("patrol", movement_patrol);
        registry
    }

    pub fn register(&mut self, name: &str, func: MovementFn) {
        self.fns.insert(name.to_string(), func);
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> MovementFn {
        self.fns.get(name).copied().unwrap_or_else(|| {
            tracing::warn!("unknown movement policy '{}', falling back to idle", name);
            movement_idle
        })
    }
}

pub fn movement_idle(entity: &mut Entity, _route: &mut PatrolRoute) {
    entity.begin_step();
}

pub fn movement_patrol(entity: &mut Entity, route: &mut PatrolRoute) {
    entity.begin_step();
    if route.len() < 2 {
        return;
    }
    let Some((from, target_index)) = route.leg() else {
        return;
    };
    let target = route.points[target_index];

    let aligned_x = (from.x - target.x).abs() < ALIGN_TOLERANCE;
    let aligned_y = (from.y - target.y).abs() < ALIGN_TOLERANCE;
    if from.y < target.y && aligned_x {
        entity.step(Direction::Down, false);
    } else if from.y > target.y && aligned_x {
        entity.step(Direction::Up, false);
    } else if from.x > target.x && aligned_y {
        entity.step(Direction::Left, false);
    } else if from.x < target.x && aligned_y {
        entity.step(Direction::Right, false);
    }

    if rects_collide(entity.rect(), target) {
        route.current = target_index;
    }
}
