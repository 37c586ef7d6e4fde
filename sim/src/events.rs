//! Synchronous publish/subscribe channel.
//!
//! Delivery is ordered and immediate: every subscriber of a topic runs, in
//! subscription order, before `publish` returns. Publishing from inside a
//! handler is processed depth-first. There is no queue, and an event nobody
//! listens to is dropped.
//!
//! Subscribers are explicit objects that receive the event plus a mutable
//! context (normally the [`World`](crate::world::World)); they do not capture
//! shared state. Handlers take `&self`, so a subscriber that is still running
//! further up the stack receives nested events like any other; the few that
//! keep state use interior mutability. The subscriber list of a topic is
//! snapshotted at publish time, so (un)subscribing during delivery only
//! affects later publishes.

use crate::components::{PickupKind, Tag};
use crate::entity::EntityId;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Damage,
    Death,
    Pickup,
    LevelUp,
    Shoot,
    Action,
}

/// Discrete actions delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Shoot,
}

/// What the entity looked like when it died; the entity itself is gone by
/// the time most listeners run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathInfo {
    pub tag: Option<Tag>,
    pub x: f32,
    pub y: f32,
    pub bounty: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Damage {
        target: EntityId,
        source: EntityId,
        amount: f32,
    },
    Death {
        entity: EntityId,
        info: DeathInfo,
    },
    Pickup {
        kind: PickupKind,
        amount: f32,
    },
    LevelUp {
        level: u32,
    },
    Shoot {
        x: f32,
        y: f32,
        rotation: f32,
        owner: EntityId,
        weapon_id: String,
    },
    Action {
        action: InputAction,
        pressed: bool,
    },
}

impl GameEvent {
    /// Topic this event is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::Damage { .. } => Topic::Damage,
            GameEvent::Death { .. } => Topic::Death,
            GameEvent::Pickup { .. } => Topic::Pickup,
            GameEvent::LevelUp { .. } => Topic::LevelUp,
            GameEvent::Shoot { .. } => Topic::Shoot,
            GameEvent::Action { .. } => Topic::Action,
        }
    }
}

/// Handles events for a context type `C`.
///
/// `on_event` may be entered again, through a nested publish, before an
/// earlier call returns.
pub trait Subscriber<C> {
    fn on_event(&self, event: &GameEvent, ctx: &mut C);
}

/// Shared handle to a registered subscriber.
pub type Handler<C> = Rc<dyn Subscriber<C>>;

/// A context that owns the channel its subscribers are registered on.
pub trait EventContext: Sized {
    fn events(&mut self) -> &mut EventChannel<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct EventChannel<C> {
    topics: HashMap<Topic, Vec<(SubscriptionId, Handler<C>)>>,
    next_id: u64,
}

impl<C> EventChannel<C> {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
            next_id: 0,
        }
    }

    /// Append `handler` to the delivery order of `topic`.
    pub fn subscribe(&mut self, topic: Topic, handler: Handler<C>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.topics.entry(topic).or_default().push((id, handler));
        id
    }

    /// Remove one subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, topic: Topic, id: SubscriptionId) -> bool {
        let Some(handlers) = self.topics.get_mut(&topic) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(sid, _)| *sid != id);
        handlers.len() != before
    }

    /// Remove every subscription of `handler` on `topic`.
    pub fn unsubscribe_handler(&mut self, topic: Topic, handler: &Handler<C>) -> bool {
        let Some(handlers) = self.topics.get_mut(&topic) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(_, h)| !Rc::ptr_eq(h, handler));
        handlers.len() != before
    }

    /// Number of subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.get(&topic).map_or(0, Vec::len)
    }

    /// Drop every subscription on every topic.
    pub fn clear(&mut self) {
        self.topics.clear();
    }

    fn snapshot(&self, topic: Topic) -> Vec<Handler<C>> {
        self.topics
            .get(&topic)
            .map(|handlers| handlers.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }
}

impl<C: EventContext> EventChannel<C> {
    /// Deliver `event` to every current subscriber of its topic.
    pub fn publish(ctx: &mut C, event: GameEvent) {
        let topic = event.topic();
        let handlers = ctx.events().snapshot(topic);
        if handlers.is_empty() {
            trace!(?topic, "event dropped, no subscribers");
            return;
        }
        for handler in handlers {
            handler.on_event(&event, ctx);
        }
    }
}

impl<C> Default for EventChannel<C> {
    fn default() -> Self {
        Self::new()
    }
}
