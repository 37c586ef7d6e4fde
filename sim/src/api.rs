//! Public API for the simulation.
//!
//! This module provides the main interface for the host (a game engine
//! bridge, a test, the demo) to drive the simulation: start a level, feed
//! input, step time and read back snapshots.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 60 Hz). When `step(dt)` is called,
//! the simulation accumulates time and runs fixed updates as needed. This ensures deterministic
//! behavior regardless of frame rate.

use crate::components::PlayerControl;
use crate::config::{ConfigError, ContentDb, SimConfig};
use crate::entity::EntityId;
use crate::events::{GameEvent, InputAction};
use crate::session::Session;
use crate::snapshot::Snapshot;
use crate::spawn;
use crate::stats::StatModifiers;
use crate::systems::{self, AiRegistry};
use crate::world::World;
use std::path::Path;
use tracing::{info, warn};

/// Horizontal start position of the player.
const PLAYER_START_X: f32 = 120.0;

/// The main simulation container.
///
/// Holds the [`World`] and the fixed-step accumulator, providing a clean API for:
/// - Starting levels
/// - Stepping the simulation forward
/// - Extracting state snapshots
/// - Forwarding player input
pub struct SimWorld {
    world: World,
    /// Builds the behavior registry each time a level starts.
    ai: Box<dyn Fn() -> AiRegistry>,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Simulation with default tuning and the built-in content.
    pub fn new() -> Self {
        Self::with_content(SimConfig::default(), ContentDb::builtin())
    }

    /// Simulation with explicit tuning and content tables.
    pub fn with_content(config: SimConfig, content: ContentDb) -> Self {
        Self {
            world: World::new(config, content),
            ai: Box::new(AiRegistry::with_builtins),
            time_accumulator: 0.0,
        }
    }

    /// Load content from a JSON file. Broken content is the one fatal error.
    pub fn load(config: SimConfig, content_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = ContentDb::load(content_path)?;
        Ok(Self::with_content(config, content))
    }

    /// Replace the AI behavior set used from the next `start_level` on.
    pub fn with_ai(mut self, build: impl Fn() -> AiRegistry + 'static) -> Self {
        self.ai = Box::new(build);
        self
    }

    /// Reset and start `level_id`. Returns false (and leaves the world
    /// untouched) when the level does not exist.
    pub fn start_level(&mut self, level_id: &str) -> bool {
        let Some(waves) = self.world.content().level(level_id).map(|l| l.waves.len()) else {
            warn!(level = level_id, "unknown level id");
            return false;
        };

        self.world.reset();
        self.time_accumulator = 0.0;
        systems::install_default_pipeline(&mut self.world, (self.ai)());
        systems::install_default_subscribers(&mut self.world);
        self.world.set_session(Session::start(level_id));

        let y = self.world.config().play_area.height / 2.0;
        spawn::spawn_player(&mut self.world, PLAYER_START_X, y);
        info!(level = level_id, waves, "level started");
        true
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs fixed updates
    /// as needed.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.world.config().fixed_timestep;
        if fixed_dt <= 0.0 {
            return;
        }
        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.world.update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run exactly one fixed update.
    pub fn tick(&mut self) {
        let fixed_dt = self.world.config().fixed_timestep;
        self.world.update(fixed_dt);
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_world(&self.world)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Set the player's movement intent; each axis in [-1, 1].
    pub fn set_movement(&mut self, x: f32, y: f32) {
        let Some(player) = self.player() else {
            return;
        };
        if let Some(control) = self.world.store_mut().get_mut::<PlayerControl>(player) {
            control.move_x = x.clamp(-1.0, 1.0);
            control.move_y = y.clamp(-1.0, 1.0);
        }
    }

    /// Forward a pressed action to the subscribers.
    pub fn press(&mut self, action: InputAction) {
        self.world.publish(GameEvent::Action { action, pressed: true });
    }

    /// Forward a released action to the subscribers.
    pub fn release(&mut self, action: InputAction) {
        self.world.publish(GameEvent::Action { action, pressed: false });
    }

    // ------------------------------------------------------------------------
    // Progression
    // ------------------------------------------------------------------------

    /// Append an upgrade's modifiers to the player. Returns false when the
    /// upgrade id is unknown or there is no player.
    pub fn apply_upgrade(&mut self, upgrade_id: &str) -> bool {
        let content = self.world.content_handle();
        let Some(upgrade) = content.upgrade(upgrade_id) else {
            warn!(upgrade = upgrade_id, "unknown upgrade id");
            return false;
        };
        let Some(player) = self.player() else {
            return false;
        };
        let store = self.world.store_mut();
        if store.get::<StatModifiers>(player).is_none() {
            store.attach(player, StatModifiers::new());
        }
        let Some(modifiers) = store.get_mut::<StatModifiers>(player) else {
            return false;
        };
        modifiers.extend(upgrade.modifiers.iter().cloned());
        info!(upgrade = upgrade_id, name = %upgrade.name, total = modifiers.len(), "upgrade applied");
        true
    }

    /// Give the player an orbiting companion.
    pub fn add_companion(&mut self, orbit_radius: f32, orbit_speed: f32, weapon: Option<&str>) -> Option<EntityId> {
        let player = self.player()?;
        spawn::spawn_companion(&mut self.world, player, orbit_radius, orbit_speed, weapon)
    }

    // ------------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------------

    /// Pause the simulation.
    pub fn pause(&mut self) {
        self.world.pause();
    }

    /// Resume the simulation.
    pub fn resume(&mut self) {
        self.world.resume();
    }

    /// Check if the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.world.is_paused()
    }

    /// Drop everything and return to an empty kernel.
    pub fn reset(&mut self) {
        self.world.reset();
        self.time_accumulator = 0.0;
    }

    /// The live player entity, if any.
    pub fn player(&self) -> Option<EntityId> {
        self.world
            .session()
            .player
            .filter(|p| self.world.store().is_active(*p))
    }

    /// Get the current session state.
    pub fn session(&self) -> &Session {
        self.world.session()
    }

    /// Get the current frame number.
    pub fn current_tick(&self) -> u64 {
        self.world.frame()
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.world.time()
    }

    /// Get a reference to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
