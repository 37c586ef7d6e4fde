//! Arcade Shooter - Simulation Core
//!
//! A deterministic, fixed-timestep simulation kernel for a 2D arcade shooter.
//! Uses `bevy_ecs` as typed component storage behind an entity store that
//! guarantees monotonic ids, insertion-ordered queries and deferred deletion.
//!
//! Rendering, audio and input devices live outside the kernel: the host feeds
//! input through [`SimWorld`] and mirrors [`Snapshot`]s onto its scene.

pub mod api;
pub mod components;
pub mod config;
pub mod entity;
pub mod events;
pub mod pool;
pub mod profiler;
pub mod session;
pub mod snapshot;
pub mod spawn;
pub mod stats;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{ConfigError, ContentDb, SimConfig};
pub use entity::{ComponentKind, EntityId, EntityStore, KindSet, SimComponent};
pub use events::{GameEvent, InputAction, Subscriber, Topic};
pub use pool::ResourcePool;
pub use session::{Phase, Session};
pub use snapshot::Snapshot;
pub use stats::{StatModifier, StatModifiers, StatOp};
pub use systems::{AiBehavior, AiRegistry, System};
pub use world::World;
