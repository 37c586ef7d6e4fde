//! Session bookkeeping driven by events: kills, defeat, experience, coins.

use crate::components::{PickupKind, Tag};
use crate::events::{GameEvent, Subscriber};
use crate::session::Phase;
use crate::world::World;
use tracing::info;

/// Subscribed to `Death` and `Pickup`.
pub struct SessionTracker;

impl Subscriber<World> for SessionTracker {
    fn on_event(&self, event: &GameEvent, world: &mut World) {
        match event {
            GameEvent::Death { info, .. } => match info.tag {
                Some(t) if t.is_hostile() => world.session_mut().kills += 1,
                Some(Tag::Player) => {
                    let session = world.session_mut();
                    if session.is_playing() {
                        session.phase = Phase::Defeat;
                        session.player = None;
                        info!(kills = session.kills, level = session.level, "player defeated");
                    }
                }
                _ => {}
            },
            GameEvent::Pickup { kind, amount } => match kind {
                PickupKind::Coin => world.session_mut().coins += amount,
                PickupKind::Experience => {
                    let config = world.config().clone();
                    let reached = world.session_mut().add_xp(*amount, &config);
                    for level in reached {
                        info!(level, "level up");
                        world.publish(GameEvent::LevelUp { level });
                    }
                }
            },
            _ => {}
        }
    }
}
