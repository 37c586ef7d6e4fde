//! Boundary cull - removes entities that left the play area for good.

use crate::components::{Tag, Transform, Velocity};
use crate::entity::{ComponentKind, KindSet};
use crate::systems::System;
use crate::world::World;
use tracing::trace;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Transform, ComponentKind::Tag]);

/// Destroys entities outside the play area plus a margin.
///
/// The player and companions are exempt. Hostiles that are still off screen
/// get extra margin proportional to their speed, so a fast enemy spawned
/// beyond the edge is not culled before it flies in.
pub struct BoundaryCullSystem;

impl System for BoundaryCullSystem {
    fn name(&self) -> &'static str {
        "boundary_cull"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, _dt: f32) {
        let config = world.config();
        let area = config.play_area;
        let base_margin = config.cull_margin;
        let lookahead = config.cull_lookahead;

        let mut culled = 0;
        for id in world.query(REQUIRES) {
            let (Some(tag), Some(t)) = (
                world.store().get::<Tag>(id).copied(),
                world.store().get::<Transform>(id).copied(),
            ) else {
                continue;
            };
            if matches!(tag, Tag::Player | Tag::Companion) {
                continue;
            }

            let mut margin = base_margin;
            if tag.is_hostile() && !area.contains(t.x, t.y) {
                let speed = world.store().get::<Velocity>(id).map_or(0.0, |v| v.magnitude());
                margin += speed * lookahead;
            }
            if !area.contains_with_margin(t.x, t.y, margin) {
                world.destroy(id);
                culled += 1;
            }
        }
        if culled > 0 {
            trace!(culled, "boundary cull");
        }
    }
}
