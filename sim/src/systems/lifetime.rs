//! Lifetime - destroys entities when their timer runs out.

use crate::components::Lifetime;
use crate::entity::{ComponentKind, KindSet};
use crate::systems::System;
use crate::world::World;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Lifetime]);

pub struct LifetimeSystem;

impl System for LifetimeSystem {
    fn name(&self) -> &'static str {
        "lifetime"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        for id in world.query(REQUIRES) {
            let Some(lifetime) = world.store_mut().get_mut::<Lifetime>(id) else {
                continue;
            };
            lifetime.remaining -= dt;
            if lifetime.remaining <= 0.0 {
                world.destroy(id);
            }
        }
    }
}
