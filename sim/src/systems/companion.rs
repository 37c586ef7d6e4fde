//! Companions - entities that orbit an owner and die with it.

use crate::components::{OwnerLink, Transform};
use crate::entity::{ComponentKind, KindSet};
use crate::systems::System;
use crate::world::World;
use tracing::debug;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::OwnerLink, ComponentKind::Transform]);

/// Advances orbits. The owner is referenced by id only; a companion whose
/// owner is gone destroys itself.
pub struct CompanionSystem;

impl System for CompanionSystem {
    fn name(&self) -> &'static str {
        "companions"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        for id in world.query(REQUIRES) {
            let Some(link) = world.store().get::<OwnerLink>(id).copied() else {
                continue;
            };
            let Some(owner) = world.store().get::<Transform>(link.owner).copied() else {
                debug!(companion = %id, owner = %link.owner, "owner gone, companion destroyed");
                world.destroy(id);
                continue;
            };

            let angle = link.angle + link.orbit_speed * dt;
            if let Some(l) = world.store_mut().get_mut::<OwnerLink>(id) {
                l.angle = angle;
            }
            if let Some(t) = world.store_mut().get_mut::<Transform>(id) {
                t.x = owner.x + link.orbit_radius * angle.cos();
                t.y = owner.y + link.orbit_radius * angle.sin();
            }
        }
    }
}
