//! Collision system - overlap tests between tagged groups and hit resolution.
//!
//! ## Algorithm
//!
//! For every configured [`CollisionPair`], each attacker is tested against
//! each defender (both in insertion order). Two circles overlap when
//! `dist² < (r_a + r_b)²`; touching is not a hit. On overlap:
//!
//! 1. Skip the defender if it is already in the attacker's hit set.
//! 2. Publish `Damage` (projectile damage, or the configured fallback).
//! 3. Record the defender in the hit set. Membership is permanent.
//! 4. Apply the pair's [`CollisionPolicy`].
//!
//! Damage subscribers run synchronously inside step 2, so a defender killed
//! by an earlier attacker is already inactive when later attackers reach it.
//!
//! ## Complexity
//!
//! O(attackers × defenders) per pair. Population caps bound both sides.

use crate::components::{Collider, Projectile, Tag, Transform, Velocity};
use crate::entity::{ComponentKind, EntityId, KindSet};
use crate::events::GameEvent;
use crate::systems::System;
use crate::world::World;
use std::collections::HashSet;
use tracing::trace;

const COLLIDABLE: KindSet = KindSet::of(&[ComponentKind::Transform, ComponentKind::Collider, ComponentKind::Tag]);

/// What happens to an attacker after it lands a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Spend pierce, then chain, then die.
    Pierce,
    /// Die on the first hit.
    Contact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair {
    pub attackers: Vec<Tag>,
    pub defenders: Vec<Tag>,
    pub policy: CollisionPolicy,
}

impl CollisionPair {
    pub fn new(attackers: &[Tag], defenders: &[Tag], policy: CollisionPolicy) -> Self {
        Self {
            attackers: attackers.to_vec(),
            defenders: defenders.to_vec(),
            policy,
        }
    }
}

/// Player bullets pierce into hostiles; hostile fire hits the player on contact.
pub fn default_pairs() -> Vec<CollisionPair> {
    vec![
        CollisionPair::new(&[Tag::Bullet], &[Tag::Enemy, Tag::Boss], CollisionPolicy::Pierce),
        CollisionPair::new(&[Tag::EnemyBullet, Tag::Hazard], &[Tag::Player], CollisionPolicy::Contact),
    ]
}

pub struct CollisionSystem {
    pairs: Vec<CollisionPair>,
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(default_pairs())
    }
}

/// Result of resolving one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Keep scanning defenders.
    Continue,
    /// Attacker is done for this frame.
    Stop,
}

impl CollisionSystem {
    /// Collision pass over the given group pairs, checked in order.
    pub fn new(pairs: Vec<CollisionPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[CollisionPair] {
        &self.pairs
    }

    fn group(world: &World, tags: &[Tag]) -> Vec<EntityId> {
        world
            .query(COLLIDABLE)
            .into_iter()
            .filter(|id| world.store().get::<Tag>(*id).is_some_and(|t| tags.contains(t)))
            .collect()
    }

    fn overlaps(world: &World, a: EntityId, b: EntityId) -> bool {
        let store = world.store();
        let (Some(ta), Some(ca), Some(tb), Some(cb)) = (
            store.get::<Transform>(a),
            store.get::<Collider>(a),
            store.get::<Transform>(b),
            store.get::<Collider>(b),
        ) else {
            return false;
        };
        if !ca.interacts_with(cb) {
            return false;
        }
        let reach = ca.radius + cb.radius;
        ta.distance_sq_to(tb) < reach * reach
    }

    fn resolve_attacker(world: &mut World, attacker: EntityId, defenders: &[EntityId], policy: CollisionPolicy) {
        let fallback = world.config().fallback_contact_damage;
        for &defender in defenders {
            if !world.store().is_active(attacker) {
                return;
            }
            if defender == attacker || !world.store().is_active(defender) {
                continue;
            }
            if !Self::overlaps(world, attacker, defender) {
                continue;
            }

            let projectile = world.store().get::<Projectile>(attacker);
            if projectile.is_some_and(|p| p.hit_set.contains(&defender)) {
                continue;
            }
            let amount = projectile.map_or(fallback, |p| p.damage);

            world.publish(GameEvent::Damage {
                target: defender,
                source: attacker,
                amount,
            });
            if let Some(p) = world.store_mut().get_mut::<Projectile>(attacker) {
                p.hit_set.insert(defender);
            }

            let outcome = match policy {
                CollisionPolicy::Contact => {
                    world.destroy(attacker);
                    Outcome::Stop
                }
                CollisionPolicy::Pierce => Self::spend_pierce(world, attacker, defenders),
            };
            if outcome == Outcome::Stop {
                return;
            }
        }
    }

    fn spend_pierce(world: &mut World, attacker: EntityId, defenders: &[EntityId]) -> Outcome {
        let Some(p) = world.store_mut().get_mut::<Projectile>(attacker) else {
            // Non-projectile attackers have nothing to spend.
            world.destroy(attacker);
            return Outcome::Stop;
        };
        if p.pierce > 0 {
            p.pierce -= 1;
            return Outcome::Continue;
        }
        if p.chain > 0 {
            p.chain -= 1;
            let hit_set = p.hit_set.clone();
            if Self::redirect(world, attacker, defenders, &hit_set) {
                return Outcome::Stop;
            }
        }
        world.destroy(attacker);
        Outcome::Stop
    }

    /// Point the attacker at the nearest live defender it has not hit yet.
    fn redirect(world: &mut World, attacker: EntityId, defenders: &[EntityId], hit_set: &HashSet<EntityId>) -> bool {
        let Some(from) = world.store().get::<Transform>(attacker).copied() else {
            return false;
        };
        let target = defenders
            .iter()
            .copied()
            .filter(|d| !hit_set.contains(d) && world.store().is_active(*d))
            .filter_map(|d| world.store().get::<Transform>(d).map(|t| (d, from.distance_sq_to(t), *t)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((target, _, to)) = target else {
            return false;
        };

        let angle = (to.y - from.y).atan2(to.x - from.x);
        let speed = world.store().get::<Velocity>(attacker).map_or(0.0, |v| v.magnitude());
        if let Some(v) = world.store_mut().get_mut::<Velocity>(attacker) {
            *v = Velocity::from_angle(angle, speed);
        }
        if let Some(t) = world.store_mut().get_mut::<Transform>(attacker) {
            t.rotation = angle;
        }
        trace!(projectile = %attacker, target = %target, "chained");
        true
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn requires(&self) -> KindSet {
        COLLIDABLE
    }

    fn update(&mut self, world: &mut World, _dt: f32) {
        for pair in &self.pairs {
            let attackers = Self::group(world, &pair.attackers);
            if attackers.is_empty() {
                continue;
            }
            let defenders = Self::group(world, &pair.defenders);
            for attacker in attackers {
                Self::resolve_attacker(world, attacker, &defenders, pair.policy);
            }
        }
    }
}
