//! Systems for the arcade shooter simulation.
//!
//! A system is a named unit of per-frame logic. It declares the component
//! kinds it operates on, queries the [`World`] for them and mutates state
//! in place. Subscribers in this module react to events published by systems.
//!
//! ## Default pipeline
//!
//! Registered by [`install_default_pipeline`] in this order:
//!
//! 1. `player_input` - movement intent to velocity
//! 2. `movement` - integrate velocity
//! 3. `weapons` - cooldowns, `Shoot` events
//! 4. `ai` - behavior plug-ins write velocity
//! 5. `homing` - steer homing projectiles
//! 6. `companions` - orbit owners
//! 7. `collision` - overlap tests, `Damage` events
//! 8. `health` - invulnerability, max health rebalance
//! 9. `pickups` - collection and magnet pull
//! 10. `particles`, `lifetime` - aging and expiry
//! 11. `boundary_cull`, `population_cap` - lifecycle management
//! 12. `wave_spawner` - level schedule and victory
//! 13. `level_exit` - victory choreography, runs while paused

pub mod ai;
pub mod boundary;
pub mod collision;
pub mod companion;
pub mod health;
pub mod homing;
pub mod input;
pub mod level_exit;
pub mod lifetime;
pub mod movement;
pub mod particles;
pub mod pickups;
pub mod population;
pub mod progression;
pub mod waves;
pub mod weapons;

pub use ai::{AiBehavior, AiRegistry, AiSystem};
pub use boundary::BoundaryCullSystem;
pub use collision::{CollisionPair, CollisionPolicy, CollisionSystem};
pub use companion::CompanionSystem;
pub use health::{DamageResolver, HealthSystem};
pub use homing::HomingSystem;
pub use input::{InputActionHandler, PlayerInputSystem};
pub use level_exit::LevelExitSystem;
pub use lifetime::LifetimeSystem;
pub use movement::MovementSystem;
pub use particles::ParticleSystem;
pub use pickups::{LootDropper, PickupSystem};
pub use population::PopulationCapSystem;
pub use progression::SessionTracker;
pub use waves::WaveSpawnerSystem;
pub use weapons::{ProjectileSpawner, WeaponSystem};

use crate::entity::KindSet;
use crate::events::Topic;
use crate::world::World;
use std::rc::Rc;

/// Per-frame logic run by the [`World`] scheduler.
pub trait System {
    fn name(&self) -> &'static str;

    /// Component kinds an entity must hold to be processed. The scheduler
    /// skips the system in frames where no active entity holds all of them;
    /// an empty set always runs.
    fn requires(&self) -> KindSet {
        KindSet::EMPTY
    }

    /// Systems that return true keep running while the world is paused.
    fn runs_while_paused(&self) -> bool {
        false
    }

    fn update(&mut self, world: &mut World, dt: f32);
}

/// Register the standard system order.
pub fn install_default_pipeline(world: &mut World, ai: AiRegistry) {
    world.add_system(PlayerInputSystem);
    world.add_system(MovementSystem);
    world.add_system(WeaponSystem);
    world.add_system(AiSystem::new(ai));
    world.add_system(HomingSystem);
    world.add_system(CompanionSystem);
    world.add_system(CollisionSystem::default());
    world.add_system(HealthSystem);
    world.add_system(PickupSystem);
    world.add_system(ParticleSystem);
    world.add_system(LifetimeSystem);
    world.add_system(BoundaryCullSystem);
    world.add_system(PopulationCapSystem);
    world.add_system(WaveSpawnerSystem);
    world.add_system(LevelExitSystem);
}

/// Register the standard event subscribers.
pub fn install_default_subscribers(world: &mut World) {
    world.subscribe(Topic::Action, Rc::new(InputActionHandler));
    world.subscribe(Topic::Shoot, Rc::new(ProjectileSpawner));
    world.subscribe(Topic::Damage, Rc::new(DamageResolver));
    world.subscribe(Topic::Death, Rc::new(LootDropper));
    let tracker = Rc::new(SessionTracker);
    world.subscribe(Topic::Death, tracker.clone());
    world.subscribe(Topic::Pickup, tracker);
}
