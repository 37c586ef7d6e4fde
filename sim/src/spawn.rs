//! Entity factories.
//!
//! Every factory builds a complete entity in one go so systems never see a
//! half-assembled one. Content lookups that fail are logged and return `None`;
//! they never abort the frame.

use crate::components::*;
use crate::config::EnemyDef;
use crate::entity::EntityId;
use crate::stats::{stat, StatModifiers};
use crate::world::World;
use std::f32::consts::{PI, TAU};
use tracing::warn;

/// Draw order, back to front.
pub mod z {
    pub const PARTICLE: i32 = 0;
    pub const PICKUP: i32 = 1;
    pub const ENEMY: i32 = 2;
    pub const PROJECTILE: i32 = 3;
    pub const PLAYER: i32 = 4;
}

/// Everything needed to put a projectile in flight.
#[derive(Debug, Clone)]
pub struct ProjectileSpec {
    pub tag: Tag,
    pub x: f32,
    pub y: f32,
    /// Heading in radians.
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    pub pierce: u32,
    pub chain: u32,
    pub radius: f32,
    pub lifetime: f32,
    pub sprite: String,
    pub homing: Option<Homing>,
    pub owner: Option<EntityId>,
}

impl ProjectileSpec {
    /// A plain player bullet heading right.
    pub fn bullet(x: f32, y: f32, damage: f32) -> Self {
        Self {
            tag: Tag::Bullet,
            x,
            y,
            angle: 0.0,
            speed: 480.0,
            damage,
            pierce: 0,
            chain: 0,
            radius: 4.0,
            lifetime: 3.0,
            sprite: "bullet".to_string(),
            homing: None,
            owner: None,
        }
    }
}

/// Spawn the player from the content tables and register it on the session.
pub fn spawn_player(world: &mut World, x: f32, y: f32) -> EntityId {
    let content = world.content_handle();
    let def = &content.player;
    let pickup_radius = world.config().pickup_radius;

    let id = world.store_mut().create();
    let store = world.store_mut();
    store.attach(id, Transform::at(x, y));
    store.attach(id, Velocity::default());
    store.attach(id, Collider::new(def.radius));
    store.attach(id, Health::new(def.health));
    store.attach(id, Tag::Player);
    store.attach(id, PlayerControl::default());
    store.attach(id, Weapon::new(def.weapon.clone()));
    store.attach(
        id,
        BaseStats::default()
            .with(stat::SPEED, def.speed)
            .with(stat::MAX_HEALTH, def.health)
            .with(stat::PICKUP_RADIUS, pickup_radius),
    );
    store.attach(id, StatModifiers::new());
    world.attach_renderable(id, Renderable::new(def.sprite.clone(), z::PLAYER));

    world.session_mut().player = Some(id);
    id
}

/// Spawn an enemy from the content tables. `None` for unknown ids.
pub fn spawn_enemy(world: &mut World, enemy_id: &str, x: f32, y: f32) -> Option<EntityId> {
    let content = world.content_handle();
    let Some(def) = content.enemy(enemy_id) else {
        warn!(enemy = enemy_id, "unknown enemy id, spawn skipped");
        return None;
    };
    Some(spawn_hostile(world, def, Tag::Enemy, x, y))
}

/// Spawn a boss from the content tables. `None` for unknown ids.
pub fn spawn_boss(world: &mut World, boss_id: &str, x: f32, y: f32) -> Option<EntityId> {
    let content = world.content_handle();
    let Some(def) = content.boss(boss_id) else {
        warn!(boss = boss_id, "unknown boss id, spawn skipped");
        return None;
    };
    Some(spawn_hostile(world, def, Tag::Boss, x, y))
}

fn spawn_hostile(world: &mut World, def: &EnemyDef, tag: Tag, x: f32, y: f32) -> EntityId {
    let id = world.store_mut().create();
    let store = world.store_mut();
    // Hostiles enter from the right, facing the player.
    store.attach(id, Transform::new(x, y, PI, 1.0));
    store.attach(id, Velocity::default());
    store.attach(id, Collider::new(def.radius));
    store.attach(id, Health::new(def.health));
    store.attach(id, tag);
    store.attach(id, Ai::new(def.behavior.clone(), def.params.clone()));
    store.attach(id, BaseStats::default().with(stat::SPEED, def.speed));
    if def.xp > 0.0 {
        store.attach(id, Bounty { xp: def.xp });
    }
    if let Some(weapon) = &def.weapon {
        let mut weapon = Weapon::new(weapon.clone());
        // Stagger the first volley so a wave does not fire in lockstep.
        weapon.cooldown = 0.5 + (id.0 % 7) as f32 * 0.1;
        store.attach(id, weapon);
    }
    world.attach_renderable(id, Renderable::new(def.sprite.clone(), z::ENEMY));
    id
}

/// Spawn a projectile described by `spec`.
pub fn spawn_projectile(world: &mut World, spec: ProjectileSpec) -> EntityId {
    let mut projectile = Projectile::new(spec.damage, spec.pierce).with_chain(spec.chain);
    if let Some(homing) = spec.homing {
        projectile = projectile.with_homing(homing);
    }
    if let Some(owner) = spec.owner {
        projectile = projectile.with_owner(owner);
    }

    let id = world.store_mut().create();
    let store = world.store_mut();
    store.attach(id, Transform::new(spec.x, spec.y, spec.angle, 1.0));
    store.attach(id, Velocity::from_angle(spec.angle, spec.speed));
    store.attach(id, Collider::new(spec.radius));
    store.attach(id, spec.tag);
    store.attach(id, projectile);
    if spec.lifetime > 0.0 {
        store.attach(id, Lifetime { remaining: spec.lifetime });
    }
    world.attach_renderable(id, Renderable::new(spec.sprite, z::PROJECTILE));
    id
}

/// Drop a pickup at a position.
pub fn spawn_pickup(world: &mut World, kind: PickupKind, amount: f32, x: f32, y: f32) -> EntityId {
    let sprite = match kind {
        PickupKind::Experience => "xp_gem",
        PickupKind::Coin => "coin",
    };
    let id = world.store_mut().create();
    let store = world.store_mut();
    store.attach(id, Transform::at(x, y));
    store.attach(id, Velocity::default());
    store.attach(id, Tag::Pickup);
    store.attach(id, Pickup { kind, amount });
    world.attach_renderable(id, Renderable::new(sprite, z::PICKUP));
    id
}

/// Spawn a single spark that fades out over `duration`.
pub fn spawn_particle(world: &mut World, x: f32, y: f32, angle: f32, speed: f32, duration: f32) -> EntityId {
    let id = world.store_mut().create();
    let store = world.store_mut();
    store.attach(id, Transform::new(x, y, angle, 1.0));
    store.attach(id, Velocity::from_angle(angle, speed));
    store.attach(id, Tag::Particle);
    store.attach(id, Particle::new(duration, 1.0, 0.0));
    world.attach_renderable(id, Renderable::new("spark", z::PARTICLE));
    id
}

/// A ring of `count` sparks flying outward.
pub fn spawn_burst(world: &mut World, x: f32, y: f32, count: u32) {
    for i in 0..count {
        let angle = TAU * i as f32 / count as f32;
        spawn_particle(world, x, y, angle, 90.0, 0.4);
    }
}

/// A companion orbiting `owner`. `None` when the owner is gone.
pub fn spawn_companion(
    world: &mut World,
    owner: EntityId,
    orbit_radius: f32,
    orbit_speed: f32,
    weapon: Option<&str>,
) -> Option<EntityId> {
    let (ox, oy) = world.store().get::<Transform>(owner).map(|t| (t.x, t.y))?;

    let id = world.store_mut().create();
    let store = world.store_mut();
    store.attach(id, Transform::at(ox + orbit_radius, oy));
    store.attach(id, Tag::Companion);
    store.attach(
        id,
        OwnerLink {
            owner,
            orbit_radius,
            orbit_speed,
            angle: 0.0,
        },
    );
    if let Some(weapon) = weapon {
        store.attach(id, Weapon::new(weapon));
    }
    world.attach_renderable(id, Renderable::new("companion", z::PLAYER));
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentDb, SimConfig};
    use crate::entity::ComponentKind;

    fn world() -> World {
        World::new(SimConfig::default(), ContentDb::builtin())
    }

    #[test]
    fn test_spawn_player_registers_on_session() {
        let mut world = world();
        let player = spawn_player(&mut world, 100.0, 200.0);
        assert_eq!(world.session().player, Some(player));
        assert!(world.store().has(player, ComponentKind::PlayerControl));
        assert!(world.store().get::<Renderable>(player).unwrap().slot.is_some());
    }

    #[test]
    fn test_unknown_enemy_is_skipped() {
        let mut world = world();
        assert!(spawn_enemy(&mut world, "nope", 0.0, 0.0).is_none());
        assert!(world.store().is_empty());
    }

    #[test]
    fn test_enemy_gets_bounty_and_ai() {
        let mut world = world();
        let e = spawn_enemy(&mut world, "weaver", 500.0, 100.0).unwrap();
        assert_eq!(world.store().get::<Tag>(e), Some(&Tag::Enemy));
        assert_eq!(world.store().get::<Ai>(e).unwrap().behavior, "sine");
        assert_eq!(world.store().get::<Bounty>(e).unwrap().xp, 3.0);
        assert_eq!(world.store().get::<Weapon>(e).unwrap().weapon_id, "spitter");
    }

    #[test]
    fn test_companion_needs_live_owner() {
        let mut world = world();
        let player = spawn_player(&mut world, 0.0, 0.0);
        let c = spawn_companion(&mut world, player, 30.0, 2.0, None).unwrap();
        assert_eq!(world.store().get::<Transform>(c).unwrap().x, 30.0);

        world.destroy(player);
        assert!(spawn_companion(&mut world, player, 30.0, 2.0, None).is_none());
    }
}
