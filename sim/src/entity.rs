//! Entity store: identity, activity and component ownership.
//!
//! Component data lives in a `bevy_ecs` world used as a typed container.
//! Everything the simulation relies on for determinism is owned here instead:
//!
//! - ids are monotonic and never reused, even across [`EntityStore::clear`]
//! - queries return ids in insertion order, stable within a frame
//! - `destroy` is a logical delete; physical removal happens in [`EntityStore::sweep`]
//! - eligibility is an explicit [`KindSet`] bitmask check, never a type probe

use crate::components::Renderable;
use bevy_ecs::prelude::*;
use bevy_ecs::world::World as ComponentWorld;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable, process-unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every component kind the store knows how to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    Transform,
    Velocity,
    Collider,
    Health,
    Tag,
    Projectile,
    StatModifiers,
    Ai,
    Lifetime,
    Particle,
    Pickup,
    Weapon,
    PlayerControl,
    OwnerLink,
    Renderable,
    Bounty,
    BaseStats,
    Invulnerable,
}

impl ComponentKind {
    #[inline]
    const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// A set of component kinds, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u32);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    /// Set holding exactly `kinds`.
    pub const fn of(kinds: &[ComponentKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Copy of the set with `kind` added.
    pub const fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | kind.bit())
    }

    #[inline]
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True when every kind in `required` is also in `self`.
    #[inline]
    pub fn contains_all(&self, required: KindSet) -> bool {
        self.0 & required.0 == required.0
    }

    /// Add `kind` to the set.
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    /// Remove `kind` from the set.
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    /// True when no kind is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Implemented by every component type the store accepts.
pub trait SimComponent: Component {
    const KIND: ComponentKind;
}

#[derive(Debug, Clone, Copy)]
struct Record {
    handle: Entity,
    kinds: KindSet,
    active: bool,
}

/// Owns all entities and their components.
pub struct EntityStore {
    components: ComponentWorld,
    records: HashMap<EntityId, Record>,
    /// Live collection in insertion order; inactive ids linger until `sweep`.
    order: Vec<EntityId>,
    next_id: u64,
    /// Presentation slots whose `Renderable` was dropped here, waiting for the
    /// owning world to return them to its pool.
    orphaned_slots: Vec<u32>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            components: ComponentWorld::new(),
            records: HashMap::new(),
            order: Vec::new(),
            next_id: 1,
            orphaned_slots: Vec::new(),
        }
    }

    /// Create a fresh, active entity with no components.
    pub fn create(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let handle = self.components.spawn_empty().id();
        self.records.insert(
            id,
            Record {
                handle,
                kinds: KindSet::EMPTY,
                active: true,
            },
        );
        self.order.push(id);
        id
    }

    fn live(&self, id: EntityId) -> Option<&Record> {
        self.records.get(&id).filter(|r| r.active)
    }

    fn slot_of(&self, handle: Entity) -> Option<u32> {
        self.components.get::<Renderable>(handle).and_then(|r| r.slot)
    }

    /// Attach a component, replacing any previous one of the same kind.
    /// Returns false when the entity is missing or already destroyed.
    pub fn attach<C: SimComponent>(&mut self, id: EntityId, component: C) -> bool {
        let Some(record) = self.records.get_mut(&id).filter(|r| r.active) else {
            return false;
        };
        record.kinds.insert(C::KIND);
        let handle = record.handle;
        let replaced = if C::KIND == ComponentKind::Renderable {
            self.slot_of(handle)
        } else {
            None
        };
        self.components.entity_mut(handle).insert(component);
        if let Some(slot) = replaced.filter(|s| self.slot_of(handle) != Some(*s)) {
            self.orphaned_slots.push(slot);
        }
        true
    }

    /// Borrow a component of an active entity.
    pub fn get<C: SimComponent>(&self, id: EntityId) -> Option<&C> {
        let record = self.live(id)?;
        self.components.get::<C>(record.handle)
    }

    /// Mutably borrow a component of an active entity.
    pub fn get_mut<C: SimComponent>(&mut self, id: EntityId) -> Option<&mut C> {
        let handle = self.live(id)?.handle;
        self.components.get_mut::<C>(handle).map(|c| c.into_inner())
    }

    /// Whether an active entity holds a component of `kind`.
    pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.live(id).is_some_and(|r| r.kinds.contains(kind))
    }

    /// Kinds held by an active entity; empty for dead or unknown ids.
    pub fn kinds(&self, id: EntityId) -> KindSet {
        self.live(id).map(|r| r.kinds).unwrap_or_default()
    }

    /// Remove a component. No-op when absent.
    pub fn detach<C: SimComponent>(&mut self, id: EntityId) {
        let slot = match self.live(id) {
            Some(r) if C::KIND == ComponentKind::Renderable => self.slot_of(r.handle),
            _ => None,
        };
        if self.take::<C>(id).is_some() {
            self.orphaned_slots.extend(slot);
        }
    }

    /// Move a component out of the entity. A taken `Renderable` keeps its slot.
    pub fn take<C: SimComponent>(&mut self, id: EntityId) -> Option<C> {
        let record = self.records.get_mut(&id).filter(|r| r.active)?;
        if !record.kinds.contains(C::KIND) {
            return None;
        }
        record.kinds.remove(C::KIND);
        self.components.entity_mut(record.handle).take::<C>()
    }

    /// Mark an entity destroyed and drop its components. A presentation slot
    /// it held is queued for the owning world to reclaim.
    ///
    /// Returns true only for the call that actually deactivated it, so callers
    /// can attach one-shot side effects to the transition.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(handle) = self.live(id).map(|r| r.handle) else {
            return false;
        };
        if let Some(slot) = self.slot_of(handle) {
            self.orphaned_slots.push(slot);
        }
        if let Some(record) = self.records.get_mut(&id) {
            record.active = false;
            record.kinds = KindSet::EMPTY;
        }
        self.components.despawn(handle);
        true
    }

    /// Whether `id` exists and has not been destroyed.
    pub fn is_active(&self, id: EntityId) -> bool {
        self.live(id).is_some()
    }

    /// Active entities holding every kind in `required`, in insertion order.
    pub fn query(&self, required: KindSet) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.matches(*id, required))
            .collect()
    }

    /// Number of active entities holding every kind in `required`.
    pub fn count(&self, required: KindSet) -> usize {
        self.order
            .iter()
            .filter(|id| self.matches(**id, required))
            .count()
    }

    /// Whether any active entity holds every kind in `required`.
    pub fn any(&self, required: KindSet) -> bool {
        self.order.iter().any(|id| self.matches(*id, required))
    }

    fn matches(&self, id: EntityId, required: KindSet) -> bool {
        self.live(id).is_some_and(|r| r.kinds.contains_all(required))
    }

    /// Physically drop destroyed entities from the live collection.
    pub fn sweep(&mut self) -> usize {
        let before = self.order.len();
        let records = &mut self.records;
        self.order.retain(|id| match records.get(id) {
            Some(r) if r.active => true,
            _ => {
                records.remove(id);
                false
            }
        });
        before - self.order.len()
    }

    /// Destroy and remove everything. The id counter keeps running.
    pub fn clear(&mut self) {
        let slots: Vec<u32> = self
            .records
            .values()
            .filter(|r| r.active)
            .filter_map(|r| self.slot_of(r.handle))
            .collect();
        self.orphaned_slots.extend(slots);
        self.components.clear_entities();
        self.records.clear();
        self.order.clear();
    }

    /// Hand back presentation slots released by store-level removals.
    pub fn drain_orphaned_slots(&mut self) -> impl Iterator<Item = u32> + '_ {
        self.orphaned_slots.drain(..)
    }

    /// Number of entities in the live collection, including ones awaiting sweep.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the live collection holds nothing, not even entities awaiting sweep.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of entities that have not been destroyed.
    pub fn active_count(&self) -> usize {
        self.records.values().filter(|r| r.active).count()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Health, Renderable, Transform, Velocity};

    fn drawn(store: &mut EntityStore, slot: u32) -> EntityId {
        let e = store.create();
        let mut r = Renderable::new("ship", 0);
        r.slot = Some(slot);
        store.attach(e, r);
        e
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut store = EntityStore::new();
        let a = store.create();
        let b = store.create();
        assert!(b > a);

        store.destroy(a);
        store.sweep();
        store.clear();
        let c = store.create();
        assert!(c > b);
    }

    #[test]
    fn test_attach_is_last_write_wins() {
        let mut store = EntityStore::new();
        let e = store.create();
        store.attach(e, Health::new(10.0));
        store.attach(e, Health::new(50.0));
        assert_eq!(store.get::<Health>(e).unwrap().max, 50.0);
        assert!(store.has(e, ComponentKind::Health));
    }

    #[test]
    fn test_detach_and_absent_lookups() {
        let mut store = EntityStore::new();
        let e = store.create();
        assert!(store.get::<Transform>(e).is_none());
        store.attach(e, Transform::at(1.0, 2.0));
        store.detach::<Transform>(e);
        assert!(!store.has(e, ComponentKind::Transform));
        assert!(store.get::<Transform>(e).is_none());
        // Detaching twice is fine.
        store.detach::<Transform>(e);
    }

    #[test]
    fn test_destroy_is_logical_until_sweep() {
        let mut store = EntityStore::new();
        let e = store.create();
        store.attach(e, Transform::at(0.0, 0.0));

        assert!(store.destroy(e));
        assert!(!store.destroy(e), "second destroy is a no-op");
        assert!(store.get::<Transform>(e).is_none());
        assert!(store.query(KindSet::of(&[ComponentKind::Transform])).is_empty());
        assert_eq!(store.len(), 1);

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 0);
        assert!(!store.attach(e, Transform::at(0.0, 0.0)));
    }

    #[test]
    fn test_query_filters_and_keeps_insertion_order() {
        let mut store = EntityStore::new();
        let mut moving = Vec::new();
        for i in 0..6 {
            let e = store.create();
            store.attach(e, Transform::at(i as f32, 0.0));
            if i % 2 == 0 {
                store.attach(e, Velocity::new(1.0, 0.0));
                moving.push(e);
            }
        }
        let required = KindSet::of(&[ComponentKind::Transform, ComponentKind::Velocity]);
        assert_eq!(store.query(required), moving);
        assert_eq!(store.count(required), 3);
    }

    #[test]
    fn test_kindset_contains_all() {
        let set = KindSet::of(&[ComponentKind::Transform, ComponentKind::Tag]);
        assert!(set.contains_all(KindSet::of(&[ComponentKind::Tag])));
        assert!(!set.contains_all(KindSet::of(&[ComponentKind::Tag, ComponentKind::Velocity])));
        assert!(set.contains_all(KindSet::EMPTY));
    }

    #[test]
    fn test_store_level_removals_hand_back_slots() {
        let mut store = EntityStore::new();
        let a = drawn(&mut store, 3);
        let b = drawn(&mut store, 4);
        let c = drawn(&mut store, 5);
        let d = drawn(&mut store, 6);

        store.destroy(a);
        store.detach::<Renderable>(b);
        let mut replacement = Renderable::new("other", 0);
        replacement.slot = Some(9);
        store.attach(c, replacement);
        let kept = store.take::<Renderable>(d);

        let slots: Vec<u32> = store.drain_orphaned_slots().collect();
        assert_eq!(slots, vec![3, 4, 5]);
        assert_eq!(kept.and_then(|r| r.slot), Some(6));

        store.clear();
        assert_eq!(store.drain_orphaned_slots().collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn test_any_matches_only_active() {
        let mut store = EntityStore::new();
        let required = KindSet::of(&[ComponentKind::Health]);
        let e = store.create();
        assert!(!store.any(required));
        store.attach(e, Health::new(1.0));
        assert!(store.any(required));
        store.destroy(e);
        assert!(!store.any(required));
    }
}
