//! Health - damage application, deaths and player invulnerability.

use crate::components::{BaseStats, Bounty, Health, Invulnerable, Tag, Transform};
use crate::entity::{ComponentKind, EntityId, KindSet};
use crate::events::{DeathInfo, GameEvent, Subscriber};
use crate::stats::{self, stat};
use crate::systems::System;
use crate::world::World;
use tracing::debug;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Health]);

/// Per-frame health upkeep.
///
/// - counts down `Invulnerable` and removes it when it runs out
/// - grows max health to the effective `maxHealth` stat; current health grows
///   by the same amount so an upgrade never reads as damage
pub struct HealthSystem;

impl System for HealthSystem {
    fn name(&self) -> &'static str {
        "health"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        for id in world.query(REQUIRES) {
            let expired = match world.store_mut().get_mut::<Invulnerable>(id) {
                Some(inv) => {
                    inv.remaining -= dt;
                    inv.remaining <= 0.0
                }
                None => false,
            };
            if expired {
                world.store_mut().detach::<Invulnerable>(id);
            }

            // Entities without a base value keep whatever max they spawned with.
            if world.store().get::<BaseStats>(id).and_then(|b| b.get(stat::MAX_HEALTH)).is_none() {
                continue;
            }
            let target = stats::resolve(world.store(), id, stat::MAX_HEALTH, 0.0);
            if let Some(health) = world.store_mut().get_mut::<Health>(id) {
                health.raise_max(target);
            }
        }
    }
}

/// Applies `Damage` events.
///
/// Damage to a missing, destroyed or invulnerable target is ignored. The hit
/// that takes a target to zero publishes exactly one `Death` and then
/// destroys the target; later hits find it inactive.
pub struct DamageResolver;

impl DamageResolver {
    fn death_info(world: &World, id: EntityId) -> DeathInfo {
        let store = world.store();
        let (x, y) = store.get::<Transform>(id).map_or((0.0, 0.0), |t| (t.x, t.y));
        DeathInfo {
            tag: store.get::<Tag>(id).copied(),
            x,
            y,
            bounty: store.get::<Bounty>(id).map(|b| b.xp),
        }
    }
}

impl Subscriber<World> for DamageResolver {
    fn on_event(&self, event: &GameEvent, world: &mut World) {
        let GameEvent::Damage { target, amount, .. } = event else {
            return;
        };
        let target = *target;
        if world.store().has(target, ComponentKind::Invulnerable) {
            return;
        }
        let Some(health) = world.store_mut().get_mut::<Health>(target) else {
            return;
        };
        let lethal = health.damage(*amount);

        if lethal {
            let info = Self::death_info(world, target);
            debug!(entity = %target, tag = ?info.tag, "killed");
            world.publish(GameEvent::Death { entity: target, info });
            world.destroy(target);
            return;
        }

        let grace = world.config().player_invulnerability;
        if grace > 0.0 && world.store().get::<Tag>(target) == Some(&Tag::Player) {
            world.store_mut().attach(target, Invulnerable { remaining: grace });
        }
    }
}
