//! Movement system - applies velocity to position.

use crate::components::{Collider, Tag, Transform, Velocity};
use crate::entity::{ComponentKind, KindSet};
use crate::systems::System;
use crate::world::World;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Transform, ComponentKind::Velocity]);

/// Integrates velocity into position.
///
/// Projectiles and particles turn to face their heading. The player is kept
/// inside the play area; everything else may leave it and is culled later.
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, dt: f32) {
        let area = world.config().play_area;
        for id in world.query(REQUIRES) {
            let Some(vel) = world.store().get::<Velocity>(id).copied() else {
                continue;
            };
            let tag = world.store().get::<Tag>(id).copied();
            let radius = world.store().get::<Collider>(id).map_or(0.0, |c| c.radius);

            let Some(transform) = world.store_mut().get_mut::<Transform>(id) else {
                continue;
            };
            transform.x += vel.vx * dt;
            transform.y += vel.vy * dt;

            match tag {
                Some(t) if t.is_projectile_like() || t == Tag::Particle => {
                    if vel.vx != 0.0 || vel.vy != 0.0 {
                        transform.rotation = vel.angle();
                    }
                }
                Some(Tag::Player) => {
                    transform.x = transform.x.clamp(radius, (area.width - radius).max(radius));
                    transform.y = transform.y.clamp(radius, (area.height - radius).max(radius));
                }
                _ => {}
            }
        }
    }
}
