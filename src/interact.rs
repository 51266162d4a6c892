use std::collections::HashMap;

use macroquad::prelude::*;

use crate::player::PlayerLife;
use crate::save::SaveError;

const SMALL_AMOUNT: i32 = 25;

/// What the player started by talking to someone.
#[derive(Clone, Debug, PartialEq)]
pub enum Interaction {
    Dialog { npc: String, lines: Vec<String> },
    Shop { name: String, lines: Vec<String> },
}

impl Interaction {
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Dialog { lines, .. } | Self::Shop { lines, .. } => lines,
        }
    }

    pub fn speaker(&self) -> &str {
        match self {
            Self::Dialog { npc, .. } => npc,
            Self::Shop { name, .. } => name,
        }
    }
}

pub struct InteractContext<'a> {
    pub actor: &'a str,
    pub area: Rect,
    pub life: &'a mut PlayerLife,
}

pub type InteractFn = fn(&mut InteractContext<'_>) -> Result<(), SaveError>;

pub struct InteractRegistry {
    funcs: HashMap<String, InteractFn>,
}

impl Default for InteractRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            funcs: HashMap::new(),
        };
        registry.register("log_interact", interact_log);
        registry.register("heal_player_small", interact_heal_player_small);
        registry.register("damage_player_small", interact_damage_player_small);
        registry
    }

    pub fn register(&mut self, name: &str, func: InteractFn) {
        self.funcs.insert(name.to_string(), func);
    }

    pub fn execute(&self, names: &[String], ctx: &mut InteractContext<'_>) -> Result<(), SaveError> {
        for name in names {
            if let Some(func) = self.funcs.get(name).copied() {
                func(ctx)?;
            } else {
                tracing::warn!("unknown interact function '{}' on '{}'", name, ctx.actor);
            }
        }
        Ok(())
    }
}

fn interact_log(ctx: &mut InteractContext<'_>) -> Result<(), SaveError> {
    tracing::info!(
        "interacted with '{}' at ({:.1}, {:.1})",
        ctx.actor,
        ctx.area.x,
        ctx.area.y
    );
    Ok(())
}

fn interact_heal_player_small(ctx: &mut InteractContext<'_>) -> Result<(), SaveError> {
    ctx.life.heal(SMALL_AMOUNT)
}

fn interact_damage_player_small(ctx: &mut InteractContext<'_>) -> Result<(), SaveError> {
    ctx.life.apply_damage(SMALL_AMOUNT)
}
