//! Maps, portals and the manager that owns them.
//!
//! A [`MapManager`] holds every registered [`Map`], knows which one is
//! active and resolves collisions on it once per tick: portals first (at
//! most one transition per tick), then NPC proximity gating, then walls.
//! Map switches and teleports are written to the save file immediately.

use std::collections::HashMap;

use macroquad::prelude::*;
use thiserror::Error;

use crate::config::{MapConfig, NpcConfig, WorldConfig};
use crate::entity::{Actor, ActorId, ActorKind, Actors, Entity};
use crate::helpers::{collide_list, rect_center, rects_collide};
use crate::interact::{InteractContext, InteractRegistry, Interaction};
use crate::movement::{Behavior, MovementRegistry, PatrolRoute};
use crate::player::PlayerLife;
use crate::render::{RenderGroup, SpriteBank, zoom_for_target};
use crate::save::{STARTING_WORLD, SaveError, SaveStore};
use crate::tilemap::{AssetError, MapObject, MapSource, TileMapData, TileSet};

pub const COLLISION_TYPE: &str = "collisions";
pub const ANIMATED_TYPE: &str = "animated";
pub const PLAYER_ANCHOR: &str = "player";

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to load map '{name}': {source}")]
    MapLoad {
        name: String,
        #[source]
        source: AssetError,
    },

    #[error("object '{object}' not found on map '{map}'")]
    MissingObject { map: String, object: String },

    #[error("map '{0}' is not registered")]
    UnknownMap(String),

    #[error(transparent)]
    Save(#[from] SaveError),
}

pub type Result<T> = std::result::Result<T, WorldError>;

/// One-way transition: stepping on `origin_point` of `from_world` moves the
/// player to `teleport_point` of `target_world`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Portal {
    pub from_world: String,
    pub origin_point: String,
    pub target_world: String,
    pub teleport_point: String,
}

impl Portal {
    pub fn new(from_world: &str, origin_point: &str, target_world: &str, teleport_point: &str) -> Self {
        Self {
            from_world: from_world.to_string(),
            origin_point: origin_point.to_string(),
            target_world: target_world.to_string(),
            teleport_point: teleport_point.to_string(),
        }
    }
}

pub struct Map {
    name: String,
    walls: Vec<Rect>,
    data: TileMapData,
    portals: Vec<Portal>,
    npcs: Vec<ActorId>,
    shops: Vec<ActorId>,
    group: RenderGroup,
}

impl Map {
    pub fn object(&self, name: &str) -> Result<&MapObject> {
        self.data
            .get_object_by_name(name)
            .ok_or_else(|| WorldError::MissingObject {
                map: self.name.clone(),
                object: name.to_string(),
            })
    }
}

pub struct MapManager {
    maps: HashMap<String, Map>,
    current_map: String,
    actors: Actors,
    player: ActorId,
    target_size: Vec2,
    save: SaveStore,
    source: Box<dyn MapSource>,
}

impl MapManager {
    /// Registers every map of `world` (the starting map first), places the
    /// player according to the save file and puts every NPC on its spawn.
    pub fn new(
        target_size: Vec2,
        player: Actor,
        save: SaveStore,
        source: Box<dyn MapSource>,
        world: &WorldConfig,
        movement: &MovementRegistry,
    ) -> Result<Self> {
        let current_map = save.current_world()?;
        let mut actors = Actors::new();
        let player = actors.spawn(player);

        let mut manager = Self {
            maps: HashMap::new(),
            current_map,
            actors,
            player,
            target_size,
            save,
            source,
        };

        let starting = world.map(STARTING_WORLD).cloned().unwrap_or_else(|| MapConfig {
            name: STARTING_WORLD.to_string(),
            portals: Vec::new(),
            npcs: Vec::new(),
            shops: Vec::new(),
        });
        manager.register_from_config(&starting, world, movement)?;
        for map in world.maps.iter().filter(|map| map.name != STARTING_WORLD) {
            manager.register_from_config(map, world, movement)?;
        }

        if !manager.maps.contains_key(&manager.current_map) {
            return Err(WorldError::UnknownMap(manager.current_map.clone()));
        }
        manager.validate_portals()?;

        match manager.save.position()? {
            Some(position) if manager.current_map == STARTING_WORLD => {
                let entity = manager.player_entity_mut();
                entity.set_position(position);
                entity.save_location();
                tracing::info!("Restored player at ({}, {}) on {}", position.x, position.y, STARTING_WORLD);
            }
            _ => {
                manager.teleport_player(PLAYER_ANCHOR)?;
                tracing::info!("Placed player on '{}' anchor of {}", PLAYER_ANCHOR, manager.current_map);
            }
        }

        manager.teleport_npcs()?;
        Ok(manager)
    }

    fn register_from_config(
        &mut self,
        config: &MapConfig,
        world: &WorldConfig,
        movement: &MovementRegistry,
    ) -> Result<()> {
        let portals = config
            .portals
            .iter()
            .map(|p| Portal::new(&config.name, &p.origin, &p.target, &p.teleport))
            .collect();
        let npcs = config
            .npcs
            .iter()
            .map(|npc| {
                let actor = Actor::npc(
                    &npc.name,
                    npc_sprite(npc),
                    world.settings.npc_speed,
                    Behavior::new(&npc.movement, movement),
                );
                self.spawn_actor(actor.with_dialog(npc.dialog.clone(), npc.on_interact.clone()))
            })
            .collect();
        let shops = config
            .shops
            .iter()
            .map(|shop| {
                let actor = Actor::shop(&shop.name, npc_sprite(shop), Behavior::new(&shop.movement, movement));
                self.spawn_actor(actor.with_dialog(shop.dialog.clone(), shop.on_interact.clone()))
            })
            .collect();
        self.register_map(&config.name, portals, npcs, shops)
    }

    pub fn spawn_actor(&mut self, actor: Actor) -> ActorId {
        self.actors.spawn(actor)
    }

    /// Load `name` and store it, replacing any map already registered under that name.
    ///
    /// On replacement, actors of the old entry that the new one does not list
    /// (its decorations and dropped NPCs) are despawned.
    pub fn register_map(
        &mut self,
        name: &str,
        portals: Vec<Portal>,
        npcs: Vec<ActorId>,
        shops: Vec<ActorId>,
    ) -> Result<()> {
        let data = self.source.load(name).map_err(|source| WorldError::MapLoad {
            name: name.to_string(),
            source,
        })?;

        for portal in portals.iter().filter(|p| p.from_world == name) {
            if data.get_object_by_name(&portal.origin_point).is_none() {
                return Err(WorldError::MissingObject {
                    map: name.to_string(),
                    object: portal.origin_point.clone(),
                });
            }
        }

        let mut group = RenderGroup::new(zoom_for_target(self.target_size.x, self.target_size.y));
        let mut walls = Vec::new();
        for object in data.objects() {
            match object.kind.as_str() {
                COLLISION_TYPE => walls.push(object.rect()),
                ANIMATED_TYPE => {
                    let id = self.actors.spawn(Actor::decoration(&object.name, object.rect()));
                    group.add(id);
                }
                _ => {}
            }
        }

        if name == self.current_map {
            group.add(self.player);
        }
        for &id in npcs.iter().chain(shops.iter()) {
            group.add(id);
        }

        if let Some(previous) = self.maps.remove(name) {
            tracing::warn!("map '{}' registered twice, replacing previous entry", name);
            let stale: Vec<ActorId> = previous
                .group
                .members()
                .iter()
                .copied()
                .filter(|&id| id != self.player && !npcs.contains(&id) && !shops.contains(&id))
                .collect();
            for id in stale {
                self.actors.despawn(id);
            }
        }
        tracing::info!(
            "Registered map '{}' ({} walls, {} portals, {} npcs, {} shops)",
            name,
            walls.len(),
            portals.len(),
            npcs.len(),
            shops.len()
        );

        self.maps.insert(
            name.to_string(),
            Map {
                name: name.to_string(),
                walls,
                data,
                portals,
                npcs,
                shops,
                group,
            },
        );
        Ok(())
    }

    fn validate_portals(&self) -> Result<()> {
        for map in self.maps.values() {
            for portal in &map.portals {
                let target = self
                    .maps
                    .get(&portal.target_world)
                    .ok_or_else(|| WorldError::UnknownMap(portal.target_world.clone()))?;
                target.object(&portal.teleport_point)?;
            }
        }
        Ok(())
    }

    /// Resolve one tick of collisions on the active map. Returns whether a portal fired.
    pub fn check_collisions(&mut self) -> Result<bool> {
        let transitioned = self.check_portals()?;

        let player_rect = self.player_entity().rect();
        let map = self
            .maps
            .get(&self.current_map)
            .ok_or_else(|| WorldError::UnknownMap(self.current_map.clone()))?;
        let members = map.group.members().to_vec();
        let walls = &map.walls;

        for id in members {
            let actor = self.actors.get_mut(id);
            if actor.kind.gated_by_proximity() {
                actor.entity.speed = if rects_collide(actor.entity.feet(), player_rect) {
                    0.0
                } else {
                    actor.entity.default_speed()
                };
            }
            if actor.kind.collides_with_walls() && collide_list(actor.entity.feet(), walls).is_some() {
                actor.entity.move_back();
            }
        }

        Ok(transitioned)
    }

    fn check_portals(&mut self) -> Result<bool> {
        let feet = self.player_entity().feet();
        let map = self.get_map()?;
        let mut triggered = None;
        for portal in map.portals.iter().filter(|p| p.from_world == self.current_map) {
            if rects_collide(feet, map.object(&portal.origin_point)?.rect()) {
                triggered = Some(portal.clone());
                break;
            }
        }

        let Some(portal) = triggered else {
            return Ok(false);
        };
        tracing::info!(
            "Portal '{}' on {} leads to {}",
            portal.origin_point,
            portal.from_world,
            portal.target_world
        );
        self.change_map(&portal.target_world)?;
        self.teleport_player(&portal.teleport_point)?;
        Ok(true)
    }

    /// Make `target` the active map, move the player into its group and persist the switch.
    pub fn change_map(&mut self, target: &str) -> Result<()> {
        if !self.maps.contains_key(target) {
            return Err(WorldError::UnknownMap(target.to_string()));
        }
        let player = self.player;
        if let Some(map) = self.maps.get_mut(&self.current_map) {
            map.group.remove(player);
        }
        self.current_map = target.to_string();
        self.save.set_current_world(target)?;
        if let Some(map) = self.maps.get_mut(target) {
            map.group.add(player);
        }
        Ok(())
    }

    pub fn teleport_player(&mut self, name: &str) -> Result<()> {
        let point = self.get_object(name)?.point();
        let entity = self.player_entity_mut();
        entity.set_position(point);
        entity.save_location();
        self.save.set_position(point)?;
        tracing::debug!("Teleported player to '{}' ({}, {}) on {}", name, point.x, point.y, self.current_map);
        Ok(())
    }

    /// Load every NPC's route from the map it lives on and snap it to its spawn.
    pub fn teleport_npcs(&mut self) -> Result<()> {
        for map in self.maps.values() {
            for &id in map.npcs.iter().chain(map.shops.iter()) {
                let Actor {
                    name,
                    entity,
                    behavior,
                    ..
                } = self.actors.get_mut(id);
                let Some(behavior) = behavior.as_mut() else {
                    continue;
                };
                behavior.route = PatrolRoute::load(name, &map.data);
                if !behavior.teleport_spawn(entity) {
                    return Err(WorldError::MissingObject {
                        map: map.name.clone(),
                        object: format!("{name}_path1"),
                    });
                }
                tracing::debug!("Spawned '{}' on {} with {} patrol points", name, map.name, behavior.route.len());
            }
        }
        Ok(())
    }

    pub fn update(&mut self) -> Result<bool> {
        let map = self
            .maps
            .get(&self.current_map)
            .ok_or_else(|| WorldError::UnknownMap(self.current_map.clone()))?;
        map.group.update(&mut self.actors);
        let transitioned = self.check_collisions()?;

        let npcs = self.get_map()?.npcs.clone();
        for id in npcs {
            let Actor { entity, behavior, .. } = self.actors.get_mut(id);
            if let Some(behavior) = behavior.as_mut() {
                behavior.run(entity);
            }
        }
        Ok(transitioned)
    }

    /// Talk to the first NPC or shop on the active map standing against the player.
    pub fn interact(
        &mut self,
        registry: &InteractRegistry,
        life: &mut PlayerLife,
    ) -> Result<Option<Interaction>> {
        let player_rect = self.player_entity().rect();
        let map = self.get_map()?;
        let found = map
            .npcs
            .iter()
            .chain(map.shops.iter())
            .copied()
            .find(|&id| {
                let actor = self.actors.get(id);
                actor.kind.is_interactive() && rects_collide(actor.entity.feet(), player_rect)
            });
        let Some(id) = found else {
            return Ok(None);
        };

        let actor = self.actors.get(id);
        let mut ctx = InteractContext {
            actor: &actor.name,
            area: actor.entity.rect(),
            life,
        };
        registry.execute(&actor.on_interact, &mut ctx)?;

        let lines = actor.dialog.clone();
        Ok(Some(match actor.kind {
            ActorKind::ShopNpc => Interaction::Shop {
                name: actor.name.clone(),
                lines,
            },
            _ => Interaction::Dialog {
                npc: actor.name.clone(),
                lines,
            },
        }))
    }

    pub fn draw(&mut self, tileset: Option<&TileSet>, sprites: &SpriteBank) -> Result<()> {
        let center = rect_center(self.player_entity().rect());
        let map = self
            .maps
            .get_mut(&self.current_map)
            .ok_or_else(|| WorldError::UnknownMap(self.current_map.clone()))?;
        map.group.center(center);
        map.group.draw(&self.actors, &map.data, tileset, sprites);
        Ok(())
    }

    pub fn current_map(&self) -> &str {
        &self.current_map
    }

    pub fn get_map(&self) -> Result<&Map> {
        self.maps
            .get(&self.current_map)
            .ok_or_else(|| WorldError::UnknownMap(self.current_map.clone()))
    }

    pub fn get_group(&self) -> Result<&RenderGroup> {
        Ok(&self.get_map()?.group)
    }

    pub fn get_walls(&self) -> Result<&[Rect]> {
        Ok(&self.get_map()?.walls)
    }

    pub fn get_object(&self, name: &str) -> Result<&MapObject> {
        self.get_map()?.object(name)
    }

    pub fn player_entity(&self) -> &Entity {
        &self.actors.get(self.player).entity
    }

    pub fn player_entity_mut(&mut self) -> &mut Entity {
        &mut self.actors.get_mut(self.player).entity
    }
}

#[cfg(test)]
impl MapManager {
    pub fn map(&self, name: &str) -> Option<&Map> {
        self.maps.get(name)
    }

    pub fn player(&self) -> ActorId {
        self.player
    }

    pub fn actor(&self, id: ActorId) -> &Actor {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> &mut Actor {
        self.actors.get_mut(id)
    }
}

#[cfg(test)]
impl Map {
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn npcs(&self) -> &[ActorId] {
        &self.npcs
    }

    pub fn shops(&self) -> &[ActorId] {
        &self.shops
    }

    pub fn group(&self) -> &RenderGroup {
        &self.group
    }
}

fn npc_sprite(npc: &NpcConfig) -> &str {
    npc.sprite.as_deref().unwrap_or(&npc.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NPC_SPEED, PLAYER_SPEED};
    use crate::tilemap::MemorySource;
    use tempfile::TempDir;

    const WORLD_YAML: &str = r#"
maps:
  - name: World
    portals:
      - { origin: cave_entrance, target: Cave, teleport: cave_spawn }
      - { origin: forest_entrance, target: Forest, teleport: forest_spawn }
    npcs:
      - name: paul
        dialog: ["Hello there!"]
        on_interact: [damage_player_small]
  - name: Cave
    portals:
      - { origin: cave_exit, target: World, teleport: cave_return }
    shops:
      - { name: merchant, movement: idle, dialog: ["Buy something!"] }
  - name: Forest
"#;

    fn world_data() -> TileMapData {
        TileMapData::new(16.0, 16.0)
            .with_object(MapObject::new(PLAYER_ANCHOR, "", 10.0, 10.0, 0.0, 0.0))
            .with_object(MapObject::new("cave_entrance", "", 100.0, 100.0, 32.0, 16.0))
            .with_object(MapObject::new("forest_entrance", "", 110.0, 100.0, 32.0, 16.0))
            .with_object(MapObject::new("cave_return", "", 100.0, 130.0, 0.0, 0.0))
            .with_object(MapObject::new("", COLLISION_TYPE, 200.0, 0.0, 16.0, 200.0))
            .with_object(MapObject::new("paul_path1", "", 50.0, 150.0, 16.0, 16.0))
            .with_object(MapObject::new("paul_path2", "", 50.0, 190.0, 16.0, 16.0))
            .with_object(MapObject::new("torch", ANIMATED_TYPE, 196.0, 20.0, 16.0, 16.0))
    }

    fn cave_data() -> TileMapData {
        TileMapData::new(16.0, 16.0)
            .with_object(MapObject::new(PLAYER_ANCHOR, "", 30.0, 30.0, 0.0, 0.0))
            .with_object(MapObject::new("cave_spawn", "", 40.0, 64.0, 0.0, 0.0))
            // overlaps the player's feet when arriving on cave_spawn
            .with_object(MapObject::new("cave_exit", "", 40.0, 90.0, 16.0, 16.0))
            .with_object(MapObject::new("merchant_path1", "", 80.0, 80.0, 16.0, 16.0))
    }

    fn forest_data() -> TileMapData {
        TileMapData::new(16.0, 16.0)
            .with_object(MapObject::new(PLAYER_ANCHOR, "", 0.0, 0.0, 0.0, 0.0))
            .with_object(MapObject::new("forest_spawn", "", 5.0, 5.0, 0.0, 0.0))
    }

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert("World", world_data());
        source.insert("Cave", cave_data());
        source.insert("Forest", forest_data());
        source
    }

    fn new_player() -> Actor {
        Actor::player("player", Entity::new(Vec2::ZERO, PLAYER_SPEED))
    }

    fn build_with(store: &SaveStore, source: MemorySource, yaml: &str) -> Result<MapManager> {
        let world = WorldConfig::from_yaml(yaml).unwrap();
        MapManager::new(
            vec2(800.0, 640.0),
            new_player(),
            store.clone(),
            Box::new(source),
            &world,
            &MovementRegistry::new(),
        )
    }

    fn setup() -> (TempDir, SaveStore, MapManager) {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        store.set_position(vec2(10.0, 10.0)).unwrap();
        let manager = build_with(&store, source(), WORLD_YAML).unwrap();
        (temp_dir, store, manager)
    }

    fn npc_named(manager: &MapManager, map: &str, name: &str) -> ActorId {
        let map = manager.map(map).unwrap();
        map.npcs()
            .iter()
            .chain(map.shops().iter())
            .copied()
            .find(|&id| manager.actor(id).name == name)
            .unwrap()
    }

    /// Put the player so that its feet overlap `area`.
    fn stand_on(manager: &mut MapManager, area: Rect) {
        let entity = manager.player_entity_mut();
        entity.begin_step();
        entity.set_position(vec2(area.x - 4.0, area.y - 20.0));
    }

    #[test]
    fn portal_moves_player_to_cave() {
        let (_temp, store, mut manager) = setup();
        assert_eq!(manager.current_map(), "World");
        assert_eq!(manager.player_entity().position(), vec2(10.0, 10.0));

        stand_on(&mut manager, Rect::new(100.0, 100.0, 32.0, 16.0));
        assert!(manager.check_collisions().unwrap());

        assert_eq!(manager.current_map(), "Cave");
        assert_eq!(manager.player_entity().position(), vec2(40.0, 64.0));
        assert_eq!(store.current_world().unwrap(), "Cave");
        assert_eq!(store.position().unwrap(), Some(vec2(40.0, 64.0)));

        let player = manager.player();
        assert!(manager.map("Cave").unwrap().group().contains(player));
        assert!(!manager.map("World").unwrap().group().contains(player));
    }

    #[test]
    fn one_transition_per_tick() {
        let (_temp, _store, mut manager) = setup();

        // feet overlap both cave_entrance and forest_entrance
        stand_on(&mut manager, Rect::new(112.0, 100.0, 8.0, 12.0));
        assert!(manager.check_collisions().unwrap());
        assert_eq!(manager.current_map(), "Cave");

        // the player lands on cave_exit; it only fires on the next tick
        assert_eq!(manager.player_entity().position(), vec2(40.0, 64.0));
        assert!(manager.check_collisions().unwrap());
        assert_eq!(manager.current_map(), "World");
        assert_eq!(manager.player_entity().position(), vec2(100.0, 130.0));
    }

    #[test]
    fn walls_fully_revert_movement() {
        let (_temp, _store, mut manager) = setup();

        let entity = manager.player_entity_mut();
        entity.begin_step();
        entity.set_position(vec2(190.0, 50.0));
        assert!(!manager.check_collisions().unwrap());
        assert_eq!(manager.player_entity().position(), vec2(10.0, 10.0));

        let paul = npc_named(&manager, "World", "paul");
        let entity = &mut manager.actor_mut(paul).entity;
        entity.begin_step();
        entity.set_position(vec2(195.0, 100.0));
        manager.check_collisions().unwrap();
        assert_eq!(manager.actor(paul).entity.position(), vec2(50.0, 150.0));
    }

    #[test]
    fn decorations_ignore_walls() {
        let (_temp, _store, mut manager) = setup();
        let group = manager.get_group().unwrap().members().to_vec();
        let torch = group
            .into_iter()
            .find(|&id| manager.actor(id).kind == ActorKind::Decoration)
            .unwrap();

        let entity = &mut manager.actor_mut(torch).entity;
        entity.set_position(vec2(196.0, 30.0));
        manager.check_collisions().unwrap();
        assert_eq!(manager.actor(torch).entity.position(), vec2(196.0, 30.0));
    }

    #[test]
    fn npc_stops_while_touching_player() {
        let (_temp, _store, mut manager) = setup();
        let paul = npc_named(&manager, "World", "paul");
        assert_eq!(manager.actor(paul).entity.position(), vec2(50.0, 150.0));

        manager.player_entity_mut().set_position(vec2(50.0, 160.0));
        manager.player_entity_mut().save_location();
        manager.check_collisions().unwrap();
        assert_eq!(manager.actor(paul).entity.speed, 0.0);

        manager.update().unwrap();
        assert_eq!(manager.actor(paul).entity.position(), vec2(50.0, 150.0));

        manager.player_entity_mut().set_position(vec2(10.0, 10.0));
        manager.player_entity_mut().save_location();
        manager.check_collisions().unwrap();
        assert_eq!(manager.actor(paul).entity.speed, NPC_SPEED);

        manager.update().unwrap();
        assert_eq!(manager.actor(paul).entity.position(), vec2(50.0, 151.0));
    }

    #[test]
    fn npcs_and_shops_start_on_their_spawn() {
        let (_temp, _store, manager) = setup();
        let merchant = npc_named(&manager, "Cave", "merchant");
        assert_eq!(manager.actor(merchant).entity.position(), vec2(80.0, 80.0));
        assert_eq!(manager.actor(merchant).kind, ActorKind::ShopNpc);
    }

    #[test]
    fn only_active_map_npcs_move() {
        let (_temp, _store, mut manager) = setup();
        manager.change_map("Cave").unwrap();
        manager.teleport_player(PLAYER_ANCHOR).unwrap();
        let paul = npc_named(&manager, "World", "paul");

        manager.update().unwrap();
        assert_eq!(manager.actor(paul).entity.position(), vec2(50.0, 150.0));
    }

    #[test]
    fn starting_map_round_trip() {
        let (_temp, store, mut manager) = setup();
        let entity = manager.player_entity_mut();
        entity.set_position(vec2(33.0, 44.0));
        store.set_position(vec2(33.0, 44.0)).unwrap();

        let reloaded = build_with(&store, source(), WORLD_YAML).unwrap();
        assert_eq!(reloaded.current_map(), "World");
        assert_eq!(reloaded.player_entity().position(), vec2(33.0, 44.0));
    }

    #[test]
    fn resuming_elsewhere_uses_player_anchor() {
        let (_temp, store, mut manager) = setup();
        stand_on(&mut manager, Rect::new(100.0, 100.0, 32.0, 16.0));
        manager.check_collisions().unwrap();

        let reloaded = build_with(&store, source(), WORLD_YAML).unwrap();
        assert_eq!(reloaded.current_map(), "Cave");
        assert_eq!(reloaded.player_entity().position(), vec2(30.0, 30.0));
        assert_eq!(store.position().unwrap(), Some(vec2(30.0, 30.0)));
        assert!(reloaded.get_group().unwrap().contains(reloaded.player()));
    }

    #[test]
    fn fresh_save_starts_on_anchor() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        let manager = build_with(&store, source(), WORLD_YAML).unwrap();
        assert_eq!(manager.player_entity().position(), vec2(10.0, 10.0));
    }

    #[test]
    fn reregistering_replaces_npcs() {
        let (_temp, _store, mut manager) = setup();
        let registry = MovementRegistry::new();
        let first = manager.spawn_actor(Actor::npc("anna", "anna", NPC_SPEED, Behavior::new("idle", &registry)));
        let second = manager.spawn_actor(Actor::npc("bob", "bob", NPC_SPEED, Behavior::new("idle", &registry)));

        manager.register_map("World", Vec::new(), vec![first], Vec::new()).unwrap();
        manager.register_map("World", Vec::new(), vec![second], Vec::new()).unwrap();

        let world = manager.map("World").unwrap();
        assert_eq!(world.npcs(), &[second]);
        assert!(!world.group().contains(first));
        assert!(world.group().contains(second));
        assert!(world.group().contains(manager.player()));
        assert!(world.portals().is_empty());
    }

    #[test]
    fn reregistering_despawns_replaced_actors() {
        let (_temp, _store, mut manager) = setup();
        manager.register_map("World", Vec::new(), Vec::new(), Vec::new()).unwrap();
        let settled = manager.actors.len();
        let old_torch = manager
            .get_group()
            .unwrap()
            .members()
            .iter()
            .copied()
            .find(|&id| manager.actor(id).kind == ActorKind::Decoration)
            .unwrap();

        manager.register_map("World", Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert_eq!(manager.actors.len(), settled);
        assert!(manager.actors.despawn(old_torch).is_none());
        assert!(manager.get_group().unwrap().contains(manager.player()));
    }

    #[test]
    fn shops_open_a_shop_interaction() {
        let (_temp, store, mut manager) = setup();
        let mut life = PlayerLife::load(store.clone(), 100).unwrap();
        manager.change_map("Cave").unwrap();
        manager.player_entity_mut().set_position(vec2(80.0, 90.0));

        let interaction = manager.interact(&InteractRegistry::new(), &mut life).unwrap();
        assert_eq!(
            interaction,
            Some(Interaction::Shop {
                name: "merchant".to_string(),
                lines: vec!["Buy something!".to_string()],
            })
        );
        assert_eq!(life.life(), 100);
    }

    #[test]
    fn interaction_runs_hooks_and_returns_dialog() {
        let (_temp, store, mut manager) = setup();
        let mut life = PlayerLife::load(store.clone(), 100).unwrap();
        let registry = InteractRegistry::new();

        assert_eq!(manager.interact(&registry, &mut life).unwrap(), None);

        manager.player_entity_mut().set_position(vec2(50.0, 160.0));
        let interaction = manager.interact(&registry, &mut life).unwrap();
        assert_eq!(
            interaction,
            Some(Interaction::Dialog {
                npc: "paul".to_string(),
                lines: vec!["Hello there!".to_string()],
            })
        );
        assert_eq!(life.life(), 75);
    }

    #[test]
    fn missing_teleport_target_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        let mut source = source();
        source.insert(
            "Forest",
            TileMapData::new(16.0, 16.0).with_object(MapObject::new(PLAYER_ANCHOR, "", 0.0, 0.0, 0.0, 0.0)),
        );

        let err = build_with(&store, source, WORLD_YAML).err().unwrap();
        assert!(matches!(
            err,
            WorldError::MissingObject { ref map, ref object } if map == "Forest" && object == "forest_spawn"
        ));
    }

    #[test]
    fn unknown_portal_target_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        let yaml = r#"
maps:
  - name: World
    portals:
      - { origin: cave_entrance, target: Cave, teleport: cave_spawn }
"#;
        let err = build_with(&store, source(), yaml).err().unwrap();
        assert!(matches!(err, WorldError::UnknownMap(ref name) if name == "Cave"));
    }

    #[test]
    fn missing_portal_origin_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        let yaml = r#"
maps:
  - name: World
    portals:
      - { origin: nowhere, target: Forest, teleport: forest_spawn }
  - name: Forest
"#;
        let err = build_with(&store, source(), yaml).err().unwrap();
        assert!(matches!(err, WorldError::MissingObject { ref object, .. } if object == "nowhere"));
    }

    #[test]
    fn missing_starting_map_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        let err = build_with(&store, MemorySource::new(), "maps: []").err().unwrap();
        assert!(matches!(err, WorldError::MapLoad { ref name, .. } if name == "World"));
    }

    #[test]
    fn unknown_saved_map_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        store.set_current_world("Moon").unwrap();
        let err = build_with(&store, source(), WORLD_YAML).err().unwrap();
        assert!(matches!(err, WorldError::UnknownMap(ref name) if name == "Moon"));
    }

    #[test]
    fn npc_without_spawn_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SaveStore::open(temp_dir.path().join("saves.json")).unwrap();
        let yaml = r#"
maps:
  - name: World
    npcs:
      - { name: ghost }
"#;
        let err = build_with(&store, source(), yaml).err().unwrap();
        assert!(matches!(err, WorldError::MissingObject { ref object, .. } if object == "ghost_path1"));
    }
}
