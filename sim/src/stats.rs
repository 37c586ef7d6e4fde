//! Stat aggregation.
//!
//! An entity's effective stat is folded from an append-only modifier list:
//! all additive terms are summed first, then all multipliers are applied,
//! `(base + Σadd) × Πmul`. Within each class the operations commute, so the
//! result does not depend on the order upgrades were picked in.

use crate::components::BaseStats;
use crate::entity::{ComponentKind, EntityId, EntityStore, SimComponent};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Well-known stat names.
pub mod stat {
    pub const DAMAGE: &str = "damage";
    pub const FIRE_RATE: &str = "fireRate";
    pub const SPEED: &str = "speed";
    pub const MAX_HEALTH: &str = "maxHealth";
    pub const PICKUP_RADIUS: &str = "pickupRadius";
    pub const PIERCE: &str = "pierce";
    pub const PROJECTILE_SPEED: &str = "projectileSpeed";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatOp {
    Add,
    Multiply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: String,
    pub op: StatOp,
    pub value: f32,
}

impl StatModifier {
    pub fn add(stat: &str, value: f32) -> Self {
        Self {
            stat: stat.to_string(),
            op: StatOp::Add,
            value,
        }
    }

    pub fn multiply(stat: &str, value: f32) -> Self {
        Self {
            stat: stat.to_string(),
            op: StatOp::Multiply,
            value,
        }
    }
}

/// Ordered, append-only list of modifiers. Entries are never removed.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatModifiers {
    entries: Vec<StatModifier>,
}

impl SimComponent for StatModifiers {
    const KIND: ComponentKind = ComponentKind::StatModifiers;
}

impl StatModifiers {
    /// Create an empty modifier list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one modifier.
    pub fn push(&mut self, modifier: StatModifier) {
        self.entries.push(modifier);
    }

    /// Append every modifier in `modifiers`.
    pub fn extend<I: IntoIterator<Item = StatModifier>>(&mut self, modifiers: I) {
        self.entries.extend(modifiers);
    }

    pub fn entries(&self) -> &[StatModifier] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Effective value of `stat` starting from `base`.
    pub fn effective(&self, stat: &str, base: f32) -> f32 {
        aggregate(base, self.entries.iter().filter(|m| m.stat == stat))
    }
}

/// Fold modifiers into `base`: adds first, then multipliers.
pub fn aggregate<'a, I>(base: f32, modifiers: I) -> f32
where
    I: IntoIterator<Item = &'a StatModifier>,
{
    let mut delta = 0.0;
    let mut factor = 1.0;
    for modifier in modifiers {
        match modifier.op {
            StatOp::Add => delta += modifier.value,
            StatOp::Multiply => factor *= modifier.value,
        }
    }
    (base + delta) * factor
}

/// Effective `stat` for an entity: its `BaseStats` value (or `fallback` when
/// it has none) folded with its modifiers.
pub fn resolve(store: &EntityStore, id: EntityId, stat: &str, fallback: f32) -> f32 {
    let base = store
        .get::<BaseStats>(id)
        .and_then(|b| b.get(stat))
        .unwrap_or(fallback);
    match store.get::<StatModifiers>(id) {
        Some(modifiers) => modifiers.effective(stat, base),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_adds_then_multiplies() {
        let mut mods = StatModifiers::new();
        mods.push(StatModifier::add(stat::DAMAGE, 10.0));
        mods.push(StatModifier::multiply(stat::DAMAGE, 1.1));
        mods.push(StatModifier::add(stat::DAMAGE, 5.0));
        assert!(approx(mods.effective(stat::DAMAGE, 100.0), 126.5));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let forward = [
            StatModifier::add(stat::DAMAGE, 10.0),
            StatModifier::multiply(stat::DAMAGE, 1.1),
            StatModifier::add(stat::DAMAGE, 5.0),
            StatModifier::multiply(stat::DAMAGE, 2.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert!(approx(aggregate(100.0, &forward), aggregate(100.0, &reversed)));
        assert!(approx(aggregate(100.0, &forward), 253.0));
    }

    #[test]
    fn test_other_stats_are_ignored() {
        let mut mods = StatModifiers::new();
        mods.push(StatModifier::multiply(stat::SPEED, 3.0));
        mods.push(StatModifier::add(stat::MAX_HEALTH, 20.0));
        assert_eq!(mods.effective(stat::DAMAGE, 7.0), 7.0);
        assert_eq!(mods.effective(stat::MAX_HEALTH, 100.0), 120.0);
    }

    #[test]
    fn test_modifier_json_shape() {
        let json = r#"{"stat":"fireRate","op":"multiply","value":1.25}"#;
        let m: StatModifier = serde_json::from_str(json).unwrap();
        assert_eq!(m, StatModifier::multiply(stat::FIRE_RATE, 1.25));
    }
}
