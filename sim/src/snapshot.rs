//! Serializable view of the simulation for the external renderer.
//!
//! The snapshot is transport only: the renderer mirrors it onto its own scene
//! graph and never writes anything back.

use crate::components::{Health, Renderable, Transform};
use crate::entity::{ComponentKind, KindSet};
use crate::session::Phase;
use crate::world::World;
use serde::{Deserialize, Serialize};

const VISIBLE: KindSet = KindSet::of(&[ComponentKind::Renderable, ComponentKind::Transform]);

/// One drawable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSnapshot {
    pub id: u64,
    /// Presentation slot; stable for the entity's lifetime, recycled after.
    pub slot: u32,
    pub sprite: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
    pub z_order: i32,
}

/// Session state the HUD needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub level_id: Option<String>,
    pub phase: Phase,
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: f32,
    pub coins: f32,
    pub kills: u32,
    pub player_health: Option<f32>,
    pub player_health_max: Option<f32>,
}

/// Complete presentation snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frames run since the last reset.
    pub frame: u64,
    /// Unpaused simulated seconds.
    pub time: f32,
    pub paused: bool,
    pub session: SessionSnapshot,
    /// Drawables sorted back to front.
    pub sprites: Vec<SpriteSnapshot>,
}

impl Snapshot {
    /// Capture the drawable state of `world`.
    pub fn from_world(world: &World) -> Self {
        let store = world.store();
        let mut sprites: Vec<SpriteSnapshot> = world
            .query(VISIBLE)
            .into_iter()
            .filter_map(|id| {
                let r = store.get::<Renderable>(id)?;
                let t = store.get::<Transform>(id)?;
                Some(SpriteSnapshot {
                    id: id.0,
                    slot: r.slot?,
                    sprite: r.sprite.clone(),
                    x: t.x,
                    y: t.y,
                    rotation: t.rotation,
                    scale: t.scale,
                    z_order: r.z_order,
                })
            })
            .collect();
        // Stable: equal z keeps spawn order.
        sprites.sort_by_key(|s| s.z_order);

        let session = world.session();
        let player_health = session.player.and_then(|p| store.get::<Health>(p));
        Self {
            frame: world.frame(),
            time: world.time(),
            paused: world.is_paused(),
            session: SessionSnapshot {
                level_id: session.level_id.clone(),
                phase: session.phase,
                level: session.level,
                xp: session.xp,
                xp_to_next: world.config().xp_to_next(session.level),
                coins: session.coins,
                kills: session.kills,
                player_health: player_health.map(|h| h.current),
                player_health_max: player_health.map(|h| h.max),
            },
            sprites,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
