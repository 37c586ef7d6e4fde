//! The scheduler: owns the entity store, the event channel and the ordered
//! system list, and advances the simulation one frame at a time.
//!
//! ## Frame
//!
//! 1. Sweep entities destroyed during the previous frame.
//! 2. Run every system in registration order with the frame's `dt`, skipping
//!    systems that have not opted in to running while paused, and systems
//!    whose required component set matches no active entity.
//!
//! Systems see each other's writes immediately; there is no double buffering.
//! A system may destroy entities mid-frame: they turn inactive and drop out of
//! later queries, but stay in storage until the next sweep.
//!
//! ## Reset
//!
//! `reset` destroys every entity, drops every subscription and system, and
//! leaves a reusable empty kernel. Entity ids keep counting up.

use crate::components::Renderable;
use crate::config::{ContentDb, SimConfig};
use crate::entity::{EntityId, EntityStore, KindSet};
use crate::events::{EventChannel, EventContext, GameEvent, Handler, SubscriptionId, Topic};
use crate::pool::ResourcePool;
use crate::profiler::Profiler;
use crate::session::Session;
use crate::systems::System;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, trace};

pub struct World {
    store: EntityStore,
    events: EventChannel<World>,
    systems: Vec<Box<dyn System>>,
    paused: bool,
    /// Bumped by `reset` so an in-flight `update` knows its system list is stale.
    generation: u64,
    frame: u64,
    time: f32,
    session: Session,
    config: SimConfig,
    content: Rc<ContentDb>,
    slots: ResourcePool<u32>,
    profiler: Option<Profiler>,
}

impl World {
    /// Create an empty world with the given tuning and content tables.
    pub fn new(config: SimConfig, content: ContentDb) -> Self {
        let mut next_slot = 0u32;
        let mut slots = ResourcePool::new(config.caps.enemies + config.caps.projectiles + config.caps.particles, move || {
            let slot = next_slot;
            next_slot += 1;
            slot
        });
        slots.prewarm(config.slot_prewarm);

        Self {
            store: EntityStore::new(),
            events: EventChannel::new(),
            systems: Vec::new(),
            paused: false,
            generation: 0,
            frame: 0,
            time: 0.0,
            session: Session::default(),
            config,
            content: Rc::new(content),
            slots,
            profiler: None,
        }
    }

    // ------------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------------

    /// Append a system to the execution order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        debug!(system = system.name(), "system registered");
        self.systems.push(Box::new(system));
    }

    /// Names of the registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Advance one frame.
    pub fn update(&mut self, dt: f32) {
        let swept = self.store.sweep();
        if swept > 0 {
            trace!(swept, frame = self.frame, "swept destroyed entities");
        }
        self.reclaim_slots();

        let generation = self.generation;
        let mut systems = std::mem::take(&mut self.systems);
        for system in systems.iter_mut() {
            if self.generation != generation {
                break;
            }
            if self.paused && !system.runs_while_paused() {
                continue;
            }
            let required = system.requires();
            if !required.is_empty() && !self.store.any(required) {
                continue;
            }
            if self.profiler.is_some() {
                let start = Instant::now();
                system.update(self, dt);
                let elapsed = start.elapsed();
                if let Some(profiler) = self.profiler.as_mut() {
                    profiler.record(system.name(), elapsed);
                }
            } else {
                system.update(self, dt);
            }
        }

        if self.generation == generation {
            // Systems registered during this frame were pushed onto the empty list.
            systems.append(&mut self.systems);
            self.systems = systems;
        }

        if let Some(profiler) = self.profiler.as_mut() {
            profiler.frame();
        }
        self.frame += 1;
        if !self.paused {
            self.time += dt;
        }
    }

    /// Freeze every system that does not run while paused.
    pub fn pause(&mut self) {
        if !self.paused {
            debug!(frame = self.frame, "world paused");
        }
        self.paused = true;
    }

    /// Resume normal scheduling.
    pub fn resume(&mut self) {
        if self.paused {
            debug!(frame = self.frame, "world resumed");
        }
        self.paused = false;
    }

    /// Check if the world is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Return to the initial empty state.
    pub fn reset(&mut self) {
        let entities = self.store.active_count();
        self.store.clear();
        self.reclaim_slots();
        self.events.clear();
        self.systems.clear();
        self.paused = false;
        self.generation += 1;
        self.frame = 0;
        self.time = 0.0;
        self.session = Session::default();
        info!(entities, "world reset");
    }

    /// Frames run since the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Unpaused simulated seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    /// Get a reference to the entity store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Get a mutable reference to the entity store.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Active entities holding every kind in `required`, oldest first.
    pub fn query(&self, required: KindSet) -> Vec<EntityId> {
        self.store.query(required)
    }

    /// Destroy an entity and hand its presentation slot back to the pool.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let destroyed = self.store.destroy(id);
        self.reclaim_slots();
        destroyed
    }

    /// Attach a visual aspect, leasing a presentation slot for it.
    pub fn attach_renderable(&mut self, id: EntityId, mut renderable: Renderable) -> bool {
        if !self.store.is_active(id) {
            return false;
        }
        renderable.slot = Some(self.slots.acquire());
        let attached = self.store.attach(id, renderable);
        self.reclaim_slots();
        attached
    }

    /// Return slots of renderables dropped at the store level to the pool.
    fn reclaim_slots(&mut self) {
        for slot in self.store.drain_orphaned_slots() {
            self.slots.release(slot);
        }
    }

    /// Get the presentation slot pool.
    pub fn slot_pool(&self) -> &ResourcePool<u32> {
        &self.slots
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Subscribe `handler` to `topic`; it runs after earlier subscribers.
    pub fn subscribe(&mut self, topic: Topic, handler: Handler<World>) -> SubscriptionId {
        self.events.subscribe(topic, handler)
    }

    /// Remove one subscription.
    pub fn unsubscribe(&mut self, topic: Topic, id: SubscriptionId) -> bool {
        self.events.unsubscribe(topic, id)
    }

    /// Deliver `event` synchronously to every subscriber of its topic.
    pub fn publish(&mut self, event: GameEvent) {
        EventChannel::publish(self, event);
    }

    // ------------------------------------------------------------------------
    // Session, tuning, content
    // ------------------------------------------------------------------------

    /// Get the current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get a mutable reference to the current session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Replace the session, as on level start.
    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    /// Get the simulation tuning.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Get the content tables.
    pub fn content(&self) -> &ContentDb {
        &self.content
    }

    /// Shared handle to the content tables, for holding across mutations.
    pub fn content_handle(&self) -> Rc<ContentDb> {
        Rc::clone(&self.content)
    }

    /// Start timing every system from the next frame on.
    pub fn enable_profiling(&mut self) {
        self.profiler.get_or_insert_with(Profiler::new);
    }

    /// Get the profiler, if profiling is enabled.
    pub fn profiler(&self) -> Option<&Profiler> {
        self.profiler.as_ref()
    }
}

impl EventContext for World {
    fn events(&mut self) -> &mut EventChannel<Self> {
        &mut self.events
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimConfig::default(), ContentDb::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use crate::entity::ComponentKind;
    use crate::events::Subscriber;
    use std::cell::RefCell;

    /// Records every update it receives into a shared log.
    struct Probe {
        name: &'static str,
        while_paused: bool,
        log: Rc<RefCell<Vec<(&'static str, f32)>>>,
    }

    impl System for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn runs_while_paused(&self) -> bool {
            self.while_paused
        }

        fn update(&mut self, _world: &mut World, dt: f32) {
            self.log.borrow_mut().push((self.name, dt));
        }
    }

    fn probe(name: &'static str, while_paused: bool, log: &Rc<RefCell<Vec<(&'static str, f32)>>>) -> Probe {
        Probe {
            name,
            while_paused,
            log: Rc::clone(log),
        }
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::default();
        world.add_system(probe("b", false, &log));
        world.add_system(probe("a", false, &log));
        world.update(0.5);
        assert_eq!(*log.borrow(), vec![("b", 0.5), ("a", 0.5)]);
    }

    #[test]
    fn test_pause_only_runs_opted_in_systems() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::default();
        world.add_system(probe("sim", false, &log));
        world.add_system(probe("exit", true, &log));

        world.pause();
        world.update(0.1);
        world.update(0.1);
        assert_eq!(*log.borrow(), vec![("exit", 0.1), ("exit", 0.1)]);

        world.resume();
        log.borrow_mut().clear();
        world.update(0.1);
        assert_eq!(*log.borrow(), vec![("sim", 0.1), ("exit", 0.1)]);
    }

    /// Destroys the entity it was built with on its first update.
    struct Destroyer(EntityId);

    impl System for Destroyer {
        fn name(&self) -> &'static str {
            "destroyer"
        }

        fn update(&mut self, world: &mut World, _dt: f32) {
            world.destroy(self.0);
        }
    }

    #[test]
    fn test_destroy_is_swept_on_next_frame() {
        let mut world = World::default();
        let e = world.store_mut().create();
        world.store_mut().attach(e, Transform::at(0.0, 0.0));
        world.add_system(Destroyer(e));

        world.update(0.1);
        assert!(!world.store().is_active(e));
        assert_eq!(world.store().len(), 1);

        world.update(0.1);
        assert_eq!(world.store().len(), 0);
    }

    struct Counter(Rc<RefCell<u32>>);

    impl Subscriber<World> for Counter {
        fn on_event(&self, _event: &GameEvent, _world: &mut World) {
            *self.0.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let hits = Rc::new(RefCell::new(0));
        let mut world = World::default();
        let e = world.store_mut().create();
        world.store_mut().attach(e, Transform::at(0.0, 0.0));
        world.attach_renderable(e, Renderable::new("ship", 1));
        world.add_system(probe("sim", false, &log));
        world.subscribe(Topic::LevelUp, Rc::new(Counter(Rc::clone(&hits))));
        world.pause();

        world.reset();

        assert!(world.query(KindSet::of(&[ComponentKind::Transform])).is_empty());
        assert!(world.system_names().is_empty());
        assert!(!world.is_paused());
        world.publish(GameEvent::LevelUp { level: 2 });
        assert_eq!(*hits.borrow(), 0);
        world.update(0.1);
        assert!(log.borrow().is_empty());
        assert_eq!(world.slot_pool().stats().released, 1);
    }

    /// Resets the world from inside a frame.
    struct Resetter;

    impl System for Resetter {
        fn name(&self) -> &'static str {
            "resetter"
        }

        fn update(&mut self, world: &mut World, _dt: f32) {
            world.reset();
        }
    }

    #[test]
    fn test_reset_during_update_drops_running_systems() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::default();
        world.add_system(Resetter);
        world.add_system(probe("after", false, &log));
        world.update(0.1);
        assert!(log.borrow().is_empty());
        assert!(world.system_names().is_empty());
    }

    /// Registers a probe the first time it runs.
    struct Registrar(Option<Probe>);

    impl System for Registrar {
        fn name(&self) -> &'static str {
            "registrar"
        }

        fn update(&mut self, world: &mut World, _dt: f32) {
            if let Some(p) = self.0.take() {
                world.add_system(p);
            }
        }
    }

    #[test]
    fn test_system_added_mid_frame_runs_next_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::default();
        world.add_system(Registrar(Some(probe("late", false, &log))));
        world.update(0.1);
        assert!(log.borrow().is_empty());
        assert_eq!(world.system_names(), vec!["registrar", "late"]);
        world.update(0.1);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_renderable_slots_are_recycled() {
        let mut world = World::default();
        let a = world.store_mut().create();
        world.attach_renderable(a, Renderable::new("a", 0));
        let slot = world.store().get::<Renderable>(a).unwrap().slot;
        world.destroy(a);

        let b = world.store_mut().create();
        world.attach_renderable(b, Renderable::new("b", 0));
        assert_eq!(world.store().get::<Renderable>(b).unwrap().slot, slot);
    }

    /// Logs its updates and only asks for entities with health.
    struct NeedsHealth(Rc<RefCell<Vec<(&'static str, f32)>>>);

    impl System for NeedsHealth {
        fn name(&self) -> &'static str {
            "needs_health"
        }

        fn requires(&self) -> KindSet {
            KindSet::of(&[ComponentKind::Health])
        }

        fn update(&mut self, _world: &mut World, dt: f32) {
            self.0.borrow_mut().push((self.name(), dt));
        }
    }

    #[test]
    fn test_system_without_matching_entities_is_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::default();
        world.add_system(NeedsHealth(Rc::clone(&log)));
        world.update(0.1);
        assert!(log.borrow().is_empty());

        let e = world.store_mut().create();
        world.store_mut().attach(e, crate::components::Health::new(5.0));
        world.update(0.1);
        assert_eq!(*log.borrow(), vec![("needs_health", 0.1)]);

        world.destroy(e);
        world.update(0.1);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_store_level_destroy_returns_slot_on_next_frame() {
        let mut world = World::default();
        let a = world.store_mut().create();
        world.attach_renderable(a, Renderable::new("a", 0));
        let slot = world.store().get::<Renderable>(a).unwrap().slot;
        world.store_mut().destroy(a);
        world.update(0.1);
        assert_eq!(world.slot_pool().stats().released, 1);

        let b = world.store_mut().create();
        world.attach_renderable(b, Renderable::new("b", 0));
        assert_eq!(world.store().get::<Renderable>(b).unwrap().slot, slot);
    }

    #[test]
    fn test_profiling_records_each_system() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::default();
        world.enable_profiling();
        world.add_system(probe("sim", false, &log));
        world.update(0.1);
        world.update(0.1);
        let profiler = world.profiler().unwrap();
        assert_eq!(profiler.frame_count(), 2);
        assert_eq!(profiler.get_section("sim").unwrap().call_count, 2);
    }
}
