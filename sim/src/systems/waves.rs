//! Wave spawner - plays the level's spawn schedule and detects victory.

use crate::components::Tag;
use crate::entity::{ComponentKind, KindSet};
use crate::session::Phase;
use crate::spawn;
use crate::systems::System;
use crate::world::World;
use tracing::{info, warn};

const HOSTILES: KindSet = KindSet::of(&[ComponentKind::Tag]);

/// Spawns each wave once its start time has passed. When every wave is out
/// and no enemy or boss is left, the session enters victory and the world
/// pauses; [`LevelExitSystem`](super::LevelExitSystem) takes it from there.
pub struct WaveSpawnerSystem;

impl WaveSpawnerSystem {
    fn hostiles_alive(world: &World) -> bool {
        world
            .query(HOSTILES)
            .into_iter()
            .any(|id| world.store().get::<Tag>(id).is_some_and(|t| t.is_hostile()))
    }
}

impl System for WaveSpawnerSystem {
    fn name(&self) -> &'static str {
        "wave_spawner"
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        if !world.session().is_playing() {
            return;
        }
        let Some(level_id) = world.session().level_id.clone() else {
            return;
        };
        let content = world.content_handle();
        let Some(level) = content.level(&level_id) else {
            warn!(level = %level_id, "unknown level id, nothing to spawn");
            return;
        };

        world.session_mut().elapsed += dt;
        let elapsed = world.session().elapsed;

        while let Some(wave) = level.waves.get(world.session().next_wave) {
            if wave.at > elapsed {
                break;
            }
            world.session_mut().next_wave += 1;
            for i in 0..wave.count {
                let (x, y) = (wave.x, wave.y + wave.spacing * i as f32);
                if wave.boss {
                    spawn::spawn_boss(world, &wave.enemy, x, y);
                } else {
                    spawn::spawn_enemy(world, &wave.enemy, x, y);
                }
            }
            info!(level = %level_id, enemy = %wave.enemy, count = wave.count, "wave spawned");
        }

        if world.session().next_wave >= level.waves.len() && !Self::hostiles_alive(world) {
            let exit_timer = world.config().exit_delay;
            world.session_mut().phase = Phase::Victory { exit_timer };
            world.pause();
            info!(level = %level_id, kills = world.session().kills, "level cleared");
        }
    }
}
