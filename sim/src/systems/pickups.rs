//! Pickups - loot drops and collection by the player.

use crate::components::{Pickup, PickupKind, Tag, Transform};
use crate::entity::{ComponentKind, KindSet};
use crate::events::{GameEvent, Subscriber};
use crate::spawn;
use crate::stats::{self, stat};
use crate::systems::System;
use crate::world::World;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Pickup, ComponentKind::Transform]);

/// Units per second a pickup drifts toward the player inside magnet range.
const MAGNET_SPEED: f32 = 300.0;

const DEATH_SPARKS: u32 = 6;

/// Collects pickups that touch the player and pulls nearby ones in.
///
/// Collection radius is the player's `pickupRadius` stat; the magnet reaches
/// twice as far.
pub struct PickupSystem;

impl System for PickupSystem {
    fn name(&self) -> &'static str {
        "pickups"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        let Some(player) = world.session().player else {
            return;
        };
        let Some(at) = world.store().get::<Transform>(player).copied() else {
            return;
        };
        let radius = stats::resolve(world.store(), player, stat::PICKUP_RADIUS, world.config().pickup_radius);
        let magnet = radius * 2.0;

        for id in world.query(REQUIRES) {
            let (Some(pickup), Some(t)) = (
                world.store().get::<Pickup>(id).copied(),
                world.store().get::<Transform>(id).copied(),
            ) else {
                continue;
            };
            let d2 = at.distance_sq_to(&t);
            if d2 < radius * radius {
                world.destroy(id);
                world.publish(GameEvent::Pickup {
                    kind: pickup.kind,
                    amount: pickup.amount,
                });
            } else if d2 < magnet * magnet {
                let d = d2.sqrt();
                let step = (MAGNET_SPEED * dt).min(d);
                if let Some(t) = world.store_mut().get_mut::<Transform>(id) {
                    t.x += (at.x - t.x) / d * step;
                    t.y += (at.y - t.y) / d * step;
                }
            }
        }
    }
}

/// Drops loot and sparks where hostiles die.
pub struct LootDropper;

impl Subscriber<World> for LootDropper {
    fn on_event(&self, event: &GameEvent, world: &mut World) {
        let GameEvent::Death { info, .. } = event else {
            return;
        };
        if !info.tag.is_some_and(Tag::is_hostile) {
            return;
        }
        if let Some(xp) = info.bounty.filter(|xp| *xp > 0.0) {
            spawn::spawn_pickup(world, PickupKind::Experience, xp, info.x, info.y);
        }
        spawn::spawn_burst(world, info.x, info.y, DEATH_SPARKS);
    }
}
