//! Weapons - fire cadence and projectile creation.
//!
//! [`WeaponSystem`] only decides *when* something fires and publishes a
//! `Shoot` event; [`ProjectileSpawner`] turns that event into projectiles.
//! Other listeners (audio, muzzle flashes) can hook the same event.

use crate::components::{Homing, OwnerLink, PlayerControl, Tag, Transform, Weapon};
use crate::entity::{ComponentKind, EntityId, KindSet};
use crate::events::{GameEvent, Subscriber};
use crate::spawn::{self, ProjectileSpec};
use crate::stats::{self, stat};
use crate::systems::System;
use crate::world::World;
use tracing::warn;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Weapon, ComponentKind::Transform]);

/// Delay before retrying a weapon whose definition is missing.
const MISSING_WEAPON_RETRY: f32 = 1.0;

/// Entity whose stat modifiers apply to `id`'s weapons: the owner for
/// companions, the entity itself otherwise.
fn stat_source(world: &World, id: EntityId) -> EntityId {
    world
        .store()
        .get::<OwnerLink>(id)
        .map_or(id, |link| link.owner)
}

pub struct WeaponSystem;

impl WeaponSystem {
    fn wants_to_fire(world: &World, id: EntityId, transform: &Transform) -> bool {
        let store = world.store();
        if let Some(control) = store.get::<PlayerControl>(id) {
            return control.firing;
        }
        match store.get::<Tag>(id) {
            Some(Tag::Companion) => store
                .get::<PlayerControl>(stat_source(world, id))
                .is_some_and(|c| c.firing),
            // Hostiles hold fire until they are on screen.
            Some(t) if t.is_hostile() => world.config().play_area.contains(transform.x, transform.y),
            _ => false,
        }
    }

    fn aim(world: &World, id: EntityId, transform: &Transform) -> f32 {
        let hostile = world.store().get::<Tag>(id).is_some_and(|t| t.is_hostile());
        if !hostile {
            return transform.rotation;
        }
        world
            .session()
            .player
            .and_then(|p| world.store().get::<Transform>(p))
            .map_or(transform.rotation, |target| {
                (target.y - transform.y).atan2(target.x - transform.x)
            })
    }
}

impl System for WeaponSystem {
    fn name(&self) -> &'static str {
        "weapons"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        let content = world.content_handle();
        for id in world.query(REQUIRES) {
            let (Some(weapon), Some(transform)) = (
                world.store().get::<Weapon>(id).cloned(),
                world.store().get::<Transform>(id).copied(),
            ) else {
                continue;
            };

            let remaining = weapon.cooldown - dt;
            let cooldown = if !Self::wants_to_fire(world, id, &transform) {
                Some(remaining.max(0.0))
            } else if remaining > 0.0 {
                Some(remaining)
            } else {
                None
            };
            if let Some(cooldown) = cooldown {
                if let Some(w) = world.store_mut().get_mut::<Weapon>(id) {
                    w.cooldown = cooldown;
                }
                continue;
            }

            let Some(def) = content.weapon(&weapon.weapon_id) else {
                warn!(entity = %id, weapon = %weapon.weapon_id, "unknown weapon id, shot skipped");
                if let Some(w) = world.store_mut().get_mut::<Weapon>(id) {
                    w.cooldown = MISSING_WEAPON_RETRY;
                }
                continue;
            };

            let rate = stats::resolve(world.store(), stat_source(world, id), stat::FIRE_RATE, 1.0).max(0.01);
            let interval = def.fire_interval / rate;
            if let Some(w) = world.store_mut().get_mut::<Weapon>(id) {
                w.cooldown = (remaining + interval).max(0.0);
            }

            let rotation = Self::aim(world, id, &transform);
            world.publish(GameEvent::Shoot {
                x: transform.x,
                y: transform.y,
                rotation,
                owner: id,
                weapon_id: weapon.weapon_id,
            });
        }
    }
}

/// Spawns projectiles for every `Shoot` event.
pub struct ProjectileSpawner;

impl Subscriber<World> for ProjectileSpawner {
    fn on_event(&self, event: &GameEvent, world: &mut World) {
        let GameEvent::Shoot {
            x,
            y,
            rotation,
            owner,
            weapon_id,
        } = event
        else {
            return;
        };
        let content = world.content_handle();
        let Some(def) = content.weapon(weapon_id) else {
            warn!(weapon = %weapon_id, "unknown weapon id, no projectiles spawned");
            return;
        };

        let tag = match world.store().get::<Tag>(*owner) {
            Some(Tag::Player) | Some(Tag::Companion) => Tag::Bullet,
            _ => Tag::EnemyBullet,
        };
        let source = stat_source(world, *owner);
        let store = world.store();
        let damage = stats::resolve(store, source, stat::DAMAGE, def.damage);
        let pierce = stats::resolve(store, source, stat::PIERCE, def.pierce as f32).round().max(0.0) as u32;
        let speed = stats::resolve(store, source, stat::PROJECTILE_SPEED, def.projectile_speed);

        let count = def.spread.max(1);
        for i in 0..count {
            let offset = if count > 1 {
                -def.spread_angle / 2.0 + def.spread_angle * i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            spawn::spawn_projectile(
                world,
                ProjectileSpec {
                    tag,
                    x: *x,
                    y: *y,
                    angle: rotation + offset,
                    speed,
                    damage,
                    pierce,
                    chain: def.chain,
                    radius: def.radius,
                    lifetime: def.lifetime,
                    sprite: def.sprite.clone(),
                    homing: def.homing.as_ref().map(|h| Homing::new(h.turn_rate, h.range)),
                    owner: Some(*owner),
                },
            );
        }
    }
}
