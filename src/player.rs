use macroquad::prelude::*;

use crate::entity::{Direction, Entity};
use crate::save::{SaveError, SaveStore};

/// Hit points, mirrored into the save file on every change.
pub struct PlayerLife {
    life: i32,
    store: SaveStore,
}

impl PlayerLife {
    /// A missing or zero persisted life starts over at `default_life`.
    pub fn load(store: SaveStore, default_life: i32) -> Result<Self, SaveError> {
        let life = match store.life()? {
            Some(life) if life != 0 => life,
            _ => {
                store.set_life(default_life)?;
                default_life
            }
        };
        Ok(Self { life, store })
    }

    pub fn life(&self) -> i32 {
        self.life
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0
    }

    pub fn heal(&mut self, amount: i32) -> Result<(), SaveError> {
        if amount <= 0 {
            return Ok(());
        }
        self.set(self.life.saturating_add(amount))
    }

    pub fn apply_damage(&mut self, amount: i32) -> Result<(), SaveError> {
        if amount <= 0 {
            return Ok(());
        }
        self.set((self.life - amount).max(0))
    }

    fn set(&mut self, life: i32) -> Result<(), SaveError> {
        self.life = life;
        self.store.set_life(life)
    }
}

/// Keyboard movement for one frame (arrow keys or WASD).
pub fn handle_input(entity: &mut Entity) {
    let up = is_key_down(KeyCode::Up) || is_key_down(KeyCode::W);
    let down = is_key_down(KeyCode::Down) || is_key_down(KeyCode::S);
    let left = is_key_down(KeyCode::Left) || is_key_down(KeyCode::A);
    let right = is_key_down(KeyCode::Right) || is_key_down(KeyCode::D);

    let vertical = match (up, down) {
        (true, false) => Some(Direction::Up),
        (false, true) => Some(Direction::Down),
        _ => None,
    };
    let horizontal = match (left, right) {
        (true, false) => Some(Direction::Left),
        (false, true) => Some(Direction::Right),
        _ => None,
    };
    entity.walk(horizontal, vertical);
}
