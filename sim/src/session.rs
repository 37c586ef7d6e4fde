//! Level/session state.
//!
//! Owned by the [`World`](crate::world::World) and handed by reference to the
//! systems and subscribers that need it. Rebuilt on level start, dropped on
//! reset.

use crate::config::SimConfig;
use crate::entity::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Phase {
    /// No level loaded.
    #[default]
    Idle,
    Playing,
    /// Level cleared; exit choreography runs until the timer hits zero.
    Victory { exit_timer: f32 },
    Complete,
    Defeat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub level_id: Option<String>,
    pub phase: Phase,
    /// Seconds of unpaused play since level start.
    pub elapsed: f32,
    pub player: Option<EntityId>,
    pub level: u32,
    pub xp: f32,
    pub coins: f32,
    pub kills: u32,
    /// Index of the next wave in the level's schedule.
    pub next_wave: usize,
}

impl Session {
    /// Fresh session for `level_id`, in the playing phase.
    pub fn start(level_id: impl Into<String>) -> Self {
        Self {
            level_id: Some(level_id.into()),
            phase: Phase::Playing,
            level: 1,
            ..Self::default()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Add xp and return every level reached on the way, in order.
    pub fn add_xp(&mut self, amount: f32, config: &SimConfig) -> Vec<u32> {
        self.xp += amount;
        let mut reached = Vec::new();
        loop {
            let needed = config.xp_to_next(self.level);
            if needed <= 0.0 || self.xp < needed {
                break;
            }
            self.xp -= needed;
            self.level += 1;
            reached.push(self.level);
        }
        reached
    }
}
