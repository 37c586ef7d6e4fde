//! Homing - steers homing projectiles toward the nearest valid target.

use crate::components::{Projectile, Tag, Transform, Velocity};
use crate::entity::{ComponentKind, EntityId, KindSet};
use crate::systems::System;
use crate::world::World;
use std::f32::consts::{PI, TAU};

const REQUIRES: KindSet = KindSet::of(&[
    ComponentKind::Projectile,
    ComponentKind::Transform,
    ComponentKind::Velocity,
]);

const TARGETS: KindSet = KindSet::of(&[ComponentKind::Tag, ComponentKind::Transform]);

/// Wrap an angle into `[-π, π)`.
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Turns a velocity toward `desired` by at most `max_turn` radians, keeping speed.
pub fn steer(vel: Velocity, desired: f32, max_turn: f32) -> Velocity {
    let speed = vel.magnitude();
    let current = vel.angle();
    let delta = wrap_angle(desired - current).clamp(-max_turn, max_turn);
    Velocity::from_angle(current + delta, speed)
}

pub struct HomingSystem;

impl HomingSystem {
    fn is_target(projectile_tag: Tag, candidate: Tag) -> bool {
        match projectile_tag {
            Tag::Bullet => candidate.is_hostile(),
            Tag::EnemyBullet | Tag::Hazard => candidate == Tag::Player,
            _ => false,
        }
    }

    fn acquire(world: &World, tag: Tag, from: &Transform, projectile: &Projectile, range: f32) -> Option<EntityId> {
        let range_sq = range * range;
        let mut best: Option<(EntityId, f32)> = None;
        for candidate in world.query(TARGETS) {
            let Some(candidate_tag) = world.store().get::<Tag>(candidate) else {
                continue;
            };
            if !Self::is_target(tag, *candidate_tag) || projectile.hit_set.contains(&candidate) {
                continue;
            }
            let Some(t) = world.store().get::<Transform>(candidate) else {
                continue;
            };
            let d = from.distance_sq_to(t);
            if d <= range_sq && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((candidate, d));
            }
        }
        best.map(|(id, _)| id)
    }
}

impl System for HomingSystem {
    fn name(&self) -> &'static str {
        "homing"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        for id in world.query(REQUIRES) {
            let store = world.store();
            let (Some(projectile), Some(from), Some(vel), Some(tag)) = (
                store.get::<Projectile>(id),
                store.get::<Transform>(id).copied(),
                store.get::<Velocity>(id).copied(),
                store.get::<Tag>(id).copied(),
            ) else {
                continue;
            };
            let Some(homing) = projectile.homing else {
                continue;
            };

            // Keep the current target while it is alive, unhit and in range.
            let current = homing.target.filter(|t| {
                !projectile.hit_set.contains(t)
                    && store
                        .get::<Transform>(*t)
                        .is_some_and(|tt| from.distance_sq_to(tt) <= homing.range * homing.range)
            });
            let target = current.or_else(|| Self::acquire(world, tag, &from, projectile, homing.range));

            let desired = target
                .and_then(|t| world.store().get::<Transform>(t))
                .map(|t| (t.y - from.y).atan2(t.x - from.x));

            if let Some(p) = world.store_mut().get_mut::<Projectile>(id) {
                if let Some(h) = p.homing.as_mut() {
                    h.target = target;
                }
            }
            if let Some(desired) = desired {
                let steered = steer(vel, desired, homing.turn_rate * dt);
                if let Some(v) = world.store_mut().get_mut::<Velocity>(id) {
                    *v = steered;
                }
            }
        }
    }
}
