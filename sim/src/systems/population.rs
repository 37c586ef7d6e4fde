//! Population cap - bounds live enemies, projectiles and particles.

use crate::components::Tag;
use crate::entity::{ComponentKind, EntityId, KindSet};
use crate::systems::System;
use crate::world::World;
use tracing::debug;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::Tag]);

/// A capped population: the tags that count toward it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Enemies,
    Projectiles,
    Particles,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Enemies, Category::Projectiles, Category::Particles];

    pub fn includes(self, tag: Tag) -> bool {
        match self {
            Category::Enemies => tag == Tag::Enemy,
            Category::Projectiles => tag.is_projectile_like(),
            Category::Particles => tag == Tag::Particle,
        }
    }
}

/// Evicts the oldest members (lowest ids) of any category over its cap.
/// Bosses are never evicted.
pub struct PopulationCapSystem;

impl PopulationCapSystem {
    fn cap(world: &World, category: Category) -> usize {
        let caps = world.config().caps;
        match category {
            Category::Enemies => caps.enemies,
            Category::Projectiles => caps.projectiles,
            Category::Particles => caps.particles,
        }
    }

    fn members(world: &World, category: Category) -> Vec<EntityId> {
        world
            .query(REQUIRES)
            .into_iter()
            .filter(|id| world.store().get::<Tag>(*id).is_some_and(|t| category.includes(*t)))
            .collect()
    }
}

impl System for PopulationCapSystem {
    fn name(&self) -> &'static str {
        "population_cap"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, _dt: f32) {
        for category in Category::ALL {
            let cap = Self::cap(world, category);
            let mut members = Self::members(world, category);
            if members.len() <= cap {
                continue;
            }
            members.sort_unstable();
            let excess = members.len() - cap;
            for id in members.into_iter().take(excess) {
                world.destroy(id);
            }
            debug!(?category, evicted = excess, cap, "population cap enforced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentDb, SimConfig};

    #[test]
    fn test_oldest_enemies_are_evicted() {
        let mut config = SimConfig::default();
        config.caps.enemies = 30;
        let mut world = World::new(config, ContentDb::default());
        let ids: Vec<_> = (0..35)
            .map(|_| {
                let id = world.store_mut().create();
                world.store_mut().attach(id, Tag::Enemy);
                id
            })
            .collect();

        PopulationCapSystem.update(&mut world, 0.1);

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(world.store().is_active(*id), i >= 5, "entity {i}");
        }
    }

    #[test]
    fn test_bosses_do_not_count() {
        let mut config = SimConfig::default();
        config.caps.enemies = 0;
        let mut world = World::new(config, ContentDb::default());
        let boss = world.store_mut().create();
        world.store_mut().attach(boss, Tag::Boss);

        PopulationCapSystem.update(&mut world, 0.1);
        assert!(world.store().is_active(boss));
    }
}
