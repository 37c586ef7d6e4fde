//! AI - pluggable behaviors that steer hostiles.
//!
//! Behaviors are registered by id in an [`AiRegistry`]. The [`Ai`] component
//! names the behavior and carries its parameters plus an opaque state box the
//! behavior owns. The state is created by `initialize` the first time the
//! system sees an entity and handed back to `update` on every later frame.
//!
//! ## Built-in behaviors
//!
//! | id         | params                          | movement                          |
//! |------------|---------------------------------|-----------------------------------|
//! | `straight` | `angle` (radians, default π)    | constant heading                  |
//! | `sine`     | `amplitude`, `frequency`        | drifts left, weaving vertically   |
//! | `chase`    | -                               | heads for the player              |
//!
//! Speed comes from the entity's `speed` stat.

use crate::components::{Ai, AiState, Transform, Velocity};
use crate::entity::{ComponentKind, EntityId, KindSet};
use crate::stats::{self, stat};
use crate::systems::System;
use crate::world::World;
use serde_json::Value;
use std::collections::HashMap;
use std::f32::consts::PI;
use tracing::warn;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Ai]);

const DEFAULT_SPEED: f32 = 80.0;

/// A behavior plug-in.
pub trait AiBehavior {
    /// Build the per-entity state. Called once, on first encounter.
    fn initialize(&mut self, entity: EntityId, world: &mut World, params: &Value) -> AiState;

    fn update(&mut self, entity: EntityId, state: &mut AiState, world: &mut World, dt: f32);
}

/// Behaviors keyed by id.
#[derive(Default)]
pub struct AiRegistry {
    behaviors: HashMap<String, Box<dyn AiBehavior>>,
}

impl AiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `straight`, `sine` and `chase`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("straight", StraightBehavior);
        registry.register("sine", SineBehavior);
        registry.register("chase", ChaseBehavior);
        registry
    }

    /// Register a behavior, replacing any previous one with the same id.
    pub fn register(&mut self, id: impl Into<String>, behavior: impl AiBehavior + 'static) {
        self.behaviors.insert(id.into(), Box::new(behavior));
    }

    /// Whether a behavior is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.behaviors.contains_key(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Box<dyn AiBehavior>> {
        self.behaviors.get_mut(id)
    }
}

pub struct AiSystem {
    registry: AiRegistry,
}

impl AiSystem {
    pub fn new(registry: AiRegistry) -> Self {
        Self { registry }
    }
}

impl System for AiSystem {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        for id in world.query(REQUIRES) {
            // The component is moved out while its behavior runs, so the
            // behavior gets the world mutably without aliasing its own state.
            let Some(mut ai) = world.store_mut().take::<Ai>(id) else {
                continue;
            };

            match self.registry.get_mut(&ai.behavior) {
                Some(behavior) => {
                    let mut state = match ai.state.take() {
                        Some(state) => state,
                        None => behavior.initialize(id, world, &ai.params),
                    };
                    behavior.update(id, &mut state, world, dt);
                    ai.state = Some(state);
                }
                None => {
                    warn!(entity = %id, behavior = %ai.behavior, "unknown AI behavior");
                    if let Some(vel) = world.store_mut().get_mut::<Velocity>(id) {
                        *vel = Velocity::default();
                    }
                }
            }

            // A behavior may have destroyed its own entity.
            if world.store().is_active(id) {
                world.store_mut().attach(id, ai);
            }
        }
    }
}

fn param(params: &Value, key: &str, default: f32) -> f32 {
    params.get(key).and_then(Value::as_f64).map_or(default, |v| v as f32)
}

fn speed_of(world: &World, id: EntityId) -> f32 {
    stats::resolve(world.store(), id, stat::SPEED, DEFAULT_SPEED)
}

fn set_velocity(world: &mut World, id: EntityId, vel: Velocity) {
    if let Some(v) = world.store_mut().get_mut::<Velocity>(id) {
        *v = vel;
    }
}

// ============================================================================
// BUILT-IN BEHAVIORS
// ============================================================================

/// Flies along a fixed heading.
pub struct StraightBehavior;

struct StraightState {
    angle: f32,
}

impl AiBehavior for StraightBehavior {
    fn initialize(&mut self, _entity: EntityId, _world: &mut World, params: &Value) -> AiState {
        Box::new(StraightState {
            angle: param(params, "angle", PI),
        })
    }

    fn update(&mut self, entity: EntityId, state: &mut AiState, world: &mut World, _dt: f32) {
        let Some(state) = state.downcast_ref::<StraightState>() else {
            return;
        };
        let speed = speed_of(world, entity);
        set_velocity(world, entity, Velocity::from_angle(state.angle, speed));
    }
}

/// Drifts left while weaving around the height it spawned at.
pub struct SineBehavior;

struct SineState {
    amplitude: f32,
    /// Radians per second.
    frequency: f32,
    phase: f32,
}

impl AiBehavior for SineBehavior {
    fn initialize(&mut self, _entity: EntityId, _world: &mut World, params: &Value) -> AiState {
        Box::new(SineState {
            amplitude: param(params, "amplitude", 40.0),
            frequency: param(params, "frequency", 2.0),
            phase: 0.0,
        })
    }

    fn update(&mut self, entity: EntityId, state: &mut AiState, world: &mut World, dt: f32) {
        let Some(state) = state.downcast_mut::<SineState>() else {
            return;
        };
        state.phase += dt;
        // d/dt of amplitude * sin(frequency * t)
        let vy = state.amplitude * state.frequency * (state.frequency * state.phase).cos();
        let speed = speed_of(world, entity);
        set_velocity(world, entity, Velocity::new(-speed, vy));
    }
}

/// Heads straight for the player; drifts left when there is none.
pub struct ChaseBehavior;

impl AiBehavior for ChaseBehavior {
    fn initialize(&mut self, _entity: EntityId, _world: &mut World, _params: &Value) -> AiState {
        Box::new(())
    }

    fn update(&mut self, entity: EntityId, _state: &mut AiState, world: &mut World, _dt: f32) {
        let speed = speed_of(world, entity);
        let target = world
            .session()
            .player
            .and_then(|p| world.store().get::<Transform>(p).copied());
        let Some(here) = world.store().get::<Transform>(entity).copied() else {
            return;
        };
        let vel = match target {
            Some(target) => {
                let angle = (target.y - here.y).atan2(target.x - here.x);
                Velocity::from_angle(angle, speed)
            }
            None => Velocity::new(-speed, 0.0),
        };
        set_velocity(world, entity, vel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BaseStats;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Counts calls into a shared log.
    struct Counting {
        log: Rc<RefCell<(u32, u32)>>,
    }

    impl AiBehavior for Counting {
        fn initialize(&mut self, _entity: EntityId, _world: &mut World, _params: &Value) -> AiState {
            self.log.borrow_mut().0 += 1;
            Box::new(0u32)
        }

        fn update(&mut self, _entity: EntityId, state: &mut AiState, _world: &mut World, _dt: f32) {
            if let Some(n) = state.downcast_mut::<u32>() {
                *n += 1;
            }
            self.log.borrow_mut().1 += 1;
        }
    }

    fn hostile(world: &mut World, behavior: &str, params: Value) -> EntityId {
        let id = world.store_mut().create();
        world.store_mut().attach(id, Transform::at(500.0, 100.0));
        world.store_mut().attach(id, Velocity::new(5.0, 5.0));
        world.store_mut().attach(id, BaseStats::default().with(stat::SPEED, 50.0));
        world.store_mut().attach(id, Ai::new(behavior, params));
        id
    }

    #[test]
    fn test_initialize_runs_once_per_entity() {
        let log = Rc::new(RefCell::new((0, 0)));
        let mut registry = AiRegistry::new();
        registry.register("count", Counting { log: Rc::clone(&log) });
        let mut system = AiSystem::new(registry);

        let mut world = World::default();
        let id = hostile(&mut world, "count", Value::Null);
        for _ in 0..3 {
            system.update(&mut world, 0.1);
        }

        assert_eq!(*log.borrow(), (1, 3));
        let ai = world.store().get::<Ai>(id).unwrap();
        assert_eq!(ai.state.as_ref().and_then(|s| s.downcast_ref::<u32>()), Some(&3));
    }

    #[test]
    fn test_unknown_behavior_zeroes_velocity() {
        let mut system = AiSystem::new(AiRegistry::with_builtins());
        let mut world = World::default();
        let id = hostile(&mut world, "teleport", Value::Null);

        system.update(&mut world, 0.1);

        assert_eq!(*world.store().get::<Velocity>(id).unwrap(), Velocity::default());
        assert!(world.store().get::<Ai>(id).unwrap().state.is_none());
    }

    #[test]
    fn test_straight_uses_angle_and_speed() {
        let mut system = AiSystem::new(AiRegistry::with_builtins());
        let mut world = World::default();
        let id = hostile(&mut world, "straight", serde_json::json!({ "angle": 0.0 }));

        system.update(&mut world, 0.1);

        let vel = world.store().get::<Velocity>(id).unwrap();
        assert!((vel.vx - 50.0).abs() < 1e-4);
        assert!(vel.vy.abs() < 1e-4);
    }

    #[test]
    fn test_chase_heads_for_player() {
        let mut system = AiSystem::new(AiRegistry::with_builtins());
        let mut world = World::default();
        let player = world.store_mut().create();
        world.store_mut().attach(player, Transform::at(500.0, 300.0));
        world.session_mut().player = Some(player);
        let id = hostile(&mut world, "chase", Value::Null);

        system.update(&mut world, 0.1);

        let vel = world.store().get::<Velocity>(id).unwrap();
        assert!(vel.vx.abs() < 1e-3);
        assert!((vel.vy - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_sine_moves_left_and_weaves() {
        let mut system = AiSystem::new(AiRegistry::with_builtins());
        let mut world = World::default();
        let id = hostile(&mut world, "sine", serde_json::json!({ "amplitude": 10.0, "frequency": 1.0 }));

        system.update(&mut world, 0.0);
        let vel = *world.store().get::<Velocity>(id).unwrap();
        assert_eq!(vel.vx, -50.0);
        assert!((vel.vy - 10.0).abs() < 1e-4);
    }
}
