//! Particles - cosmetic sparks that shrink and expire.

use crate::components::{Particle, Transform};
use crate::entity::{ComponentKind, KindSet};
use crate::systems::System;
use crate::world::World;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Particle, ComponentKind::Transform]);

pub struct ParticleSystem;

impl System for ParticleSystem {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        for id in world.query(REQUIRES) {
            let Some(particle) = world.store_mut().get_mut::<Particle>(id) else {
                continue;
            };
            particle.age += dt;
            if particle.age >= particle.duration {
                world.destroy(id);
                continue;
            }
            let p = *particle;
            let scale = p.start_scale + (p.end_scale - p.start_scale) * p.progress();
            if let Some(t) = world.store_mut().get_mut::<Transform>(id) {
                t.scale = scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_shrinks_then_expires() {
        let mut world = World::default();
        let id = world.store_mut().create();
        world.store_mut().attach(id, Transform::at(0.0, 0.0));
        world.store_mut().attach(id, Particle::new(1.0, 2.0, 0.0));

        ParticleSystem.update(&mut world, 0.25);
        assert!((world.store().get::<Transform>(id).unwrap().scale - 1.5).abs() < 1e-5);

        ParticleSystem.update(&mut world, 0.75);
        assert!(!world.store().is_active(id));
    }
}
