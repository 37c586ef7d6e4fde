//! Components for the arcade shooter simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::entity::{ComponentKind, EntityId, SimComponent};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;

macro_rules! sim_component {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(impl SimComponent for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;
        })*
    };
}

sim_component! {
    Transform => Transform,
    Velocity => Velocity,
    Collider => Collider,
    Health => Health,
    Tag => Tag,
    Projectile => Projectile,
    Ai => Ai,
    Lifetime => Lifetime,
    Particle => Particle,
    Pickup => Pickup,
    Weapon => Weapon,
    PlayerControl => PlayerControl,
    OwnerLink => OwnerLink,
    Renderable => Renderable,
    Bounty => Bounty,
    BaseStats => BaseStats,
    Invulnerable => Invulnerable,
}

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Authoritative spatial state. `rotation` is in radians.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
}

impl Transform {
    pub fn new(x: f32, y: f32, rotation: f32, scale: f32) -> Self {
        Self { x, y, rotation, scale }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }

    /// Squared distance between the two centers.
    pub fn distance_sq_to(&self, other: &Transform) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// 2D velocity in units per second.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    pub fn from_angle(angle: f32, speed: f32) -> Self {
        Self::new(angle.cos() * speed, angle.sin() * speed)
    }

    pub fn magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn angle(&self) -> f32 {
        self.vy.atan2(self.vx)
    }
}

/// Circular collider. Two colliders only interact when their layer masks overlap.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    pub layer: u32,
}

impl Collider {
    pub const ALL_LAYERS: u32 = u32::MAX;

    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            layer: Self::ALL_LAYERS,
        }
    }

    pub fn interacts_with(&self, other: &Collider) -> bool {
        self.layer & other.layer != 0
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Semantic category. Drives system eligibility and collision grouping.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Player,
    Enemy,
    Boss,
    Bullet,
    EnemyBullet,
    Hazard,
    Pickup,
    Particle,
    Companion,
}

impl Tag {
    /// Anything that travels and hurts on contact.
    pub fn is_projectile_like(self) -> bool {
        matches!(self, Tag::Bullet | Tag::EnemyBullet | Tag::Hazard)
    }

    pub fn is_hostile(self) -> bool {
        matches!(self, Tag::Enemy | Tag::Boss)
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Subtract `amount`, clamping at zero. Returns true if this hit was lethal.
    pub fn damage(&mut self, amount: f32) -> bool {
        let was_alive = self.is_alive();
        self.current = (self.current - amount.max(0.0)).max(0.0);
        was_alive && !self.is_alive()
    }

    /// Raise the ceiling; current grows by the same amount. Never lowers max.
    pub fn raise_max(&mut self, new_max: f32) {
        if new_max > self.max {
            self.current += new_max - self.max;
            self.max = new_max;
        }
    }
}

/// Steering parameters for a homing projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Homing {
    /// Radians per second.
    pub turn_rate: f32,
    pub range: f32,
    #[serde(skip)]
    pub target: Option<EntityId>,
}

impl Homing {
    pub fn new(turn_rate: f32, range: f32) -> Self {
        Self {
            turn_rate,
            range,
            target: None,
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub damage: f32,
    /// Remaining extra targets before the projectile is spent.
    pub pierce: u32,
    pub max_pierce: u32,
    /// Remaining redirects to a fresh target once pierce is exhausted.
    /// While non-zero, a spent projectile is redirected instead of destroyed,
    /// so it outlives hit `max_pierce + 1`. Zero keeps the plain pierce rule.
    pub chain: u32,
    pub max_chain: u32,
    pub homing: Option<Homing>,
    /// Targets already resolved by this projectile. Never cleared.
    pub hit_set: HashSet<EntityId>,
    pub owner: Option<EntityId>,
}

impl Projectile {
    pub fn new(damage: f32, max_pierce: u32) -> Self {
        Self {
            damage,
            pierce: max_pierce,
            max_pierce,
            chain: 0,
            max_chain: 0,
            homing: None,
            hit_set: HashSet::new(),
            owner: None,
        }
    }

    /// Allow `max_chain` redirects after pierce runs out.
    pub fn with_chain(mut self, max_chain: u32) -> Self {
        self.chain = max_chain;
        self.max_chain = max_chain;
        self
    }

    pub fn with_homing(mut self, homing: Homing) -> Self {
        self.homing = Some(homing);
        self
    }

    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Remaining invulnerability after the player is hit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Invulnerable {
    pub remaining: f32,
}

/// XP dropped when this entity dies.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounty {
    pub xp: f32,
}

/// Unmodified stat values an entity was spawned with.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub values: HashMap<String, f32>,
}

impl BaseStats {
    pub fn with(mut self, stat: &str, value: f32) -> Self {
        self.values.insert(stat.to_string(), value);
        self
    }

    pub fn get(&self, stat: &str) -> Option<f32> {
        self.values.get(stat).copied()
    }
}

// ============================================================================
// AI COMPONENTS
// ============================================================================

/// Per-entity state owned by an AI behavior. The core never looks inside.
pub type AiState = Box<dyn Any + Send + Sync>;

#[derive(Component)]
pub struct Ai {
    pub behavior: String,
    /// Parameters handed to the behavior's `initialize`.
    pub params: serde_json::Value,
    /// `None` until the behavior has been initialized for this entity.
    pub state: Option<AiState>,
}

impl Ai {
    pub fn new(behavior: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            behavior: behavior.into(),
            params,
            state: None,
        }
    }
}

impl fmt::Debug for Ai {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ai")
            .field("behavior", &self.behavior)
            .field("params", &self.params)
            .field("initialized", &self.state.is_some())
            .finish()
    }
}

// ============================================================================
// LIFECYCLE COMPONENTS
// ============================================================================

/// Seconds until the entity expires.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub age: f32,
    pub duration: f32,
    pub start_scale: f32,
    pub end_scale: f32,
}

impl Particle {
    pub fn new(duration: f32, start_scale: f32, end_scale: f32) -> Self {
        Self {
            age: 0.0,
            duration,
            start_scale,
            end_scale,
        }
    }

    /// 0.0 at spawn, 1.0 at expiry.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.age / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Weak back-reference to an owning entity, plus orbit parameters.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwnerLink {
    pub owner: EntityId,
    pub orbit_radius: f32,
    /// Radians per second.
    pub orbit_speed: f32,
    pub angle: f32,
}

// ============================================================================
// PICKUP / WEAPON / INPUT COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Experience,
    Coin,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub amount: f32,
}

/// A weapon mounted on an entity; `weapon_id` keys into the content tables.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub weapon_id: String,
    /// Seconds until the next shot is allowed.
    pub cooldown: f32,
}

impl Weapon {
    pub fn new(weapon_id: impl Into<String>) -> Self {
        Self {
            weapon_id: weapon_id.into(),
            cooldown: 0.0,
        }
    }
}

/// Normalized movement intent and fire state from the input layer.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerControl {
    pub move_x: f32,
    pub move_y: f32,
    pub firing: bool,
}

// ============================================================================
// PRESENTATION COMPONENTS
// ============================================================================

/// Visual aspect mirrored by the external renderer.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub sprite: String,
    pub z_order: i32,
    /// Presentation slot leased from the world's pool.
    pub slot: Option<u32>,
}

impl Renderable {
    pub fn new(sprite: impl Into<String>, z_order: i32) -> Self {
        Self {
            sprite: sprite.into(),
            z_order,
            slot: None,
        }
    }
}
