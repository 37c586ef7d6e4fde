//! Level exit - victory choreography while the world is paused.

use crate::components::{Tag, Transform};
use crate::entity::{ComponentKind, KindSet};
use crate::session::Phase;
use crate::systems::System;
use crate::world::World;
use tracing::info;

const TAGGED: KindSet = KindSet::of(&[ComponentKind::Tag]);

/// Units per second the player flies off screen after victory.
const EXIT_SPEED: f32 = 400.0;

/// Runs while paused. During victory it clears hostile fire, flies the player
/// out and counts the exit timer down, then marks the level complete.
pub struct LevelExitSystem;

impl System for LevelExitSystem {
    fn name(&self) -> &'static str {
        "level_exit"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        let Phase::Victory { exit_timer } = world.session().phase else {
            return;
        };

        for id in world.query(TAGGED) {
            let hostile_fire = world
                .store()
                .get::<Tag>(id)
                .is_some_and(|t| matches!(t, Tag::EnemyBullet | Tag::Hazard));
            if hostile_fire {
                world.destroy(id);
            }
        }
        if let Some(player) = world.session().player {
            if let Some(t) = world.store_mut().get_mut::<Transform>(player) {
                t.x += EXIT_SPEED * dt;
            }
        }

        let remaining = exit_timer - dt;
        let session = world.session_mut();
        if remaining <= 0.0 {
            session.phase = Phase::Complete;
            info!(level = ?session.level_id, "level complete");
        } else {
            session.phase = Phase::Victory { exit_timer: remaining };
        }
    }
}
