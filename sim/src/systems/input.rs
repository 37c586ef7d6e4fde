//! Player input - turns movement intent into velocity and tracks fire state.

use crate::components::{PlayerControl, Velocity};
use crate::entity::{ComponentKind, KindSet};
use crate::events::{GameEvent, InputAction, Subscriber};
use crate::stats::{self, stat};
use crate::systems::System;
use crate::world::World;

const REQUIRES: KindSet = KindSet::of(&[ComponentKind::PlayerControl, ComponentKind::Velocity]);

/// Fallback when a controlled entity has no base speed.
const DEFAULT_SPEED: f32 = 200.0;

pub struct PlayerInputSystem;

impl System for PlayerInputSystem {
    fn name(&self) -> &'static str {
        "player_input"
    }

    fn requires(&self) -> KindSet {
        REQUIRES
    }

    fn update(&mut self, world: &mut World, _dt: f32) {
        for id in world.query(REQUIRES) {
            let Some(control) = world.store().get::<PlayerControl>(id).copied() else {
                continue;
            };
            let speed = stats::resolve(world.store(), id, stat::SPEED, DEFAULT_SPEED);

            // Diagonal input is clamped to unit length.
            let (mut mx, mut my) = (control.move_x, control.move_y);
            let len = (mx * mx + my * my).sqrt();
            if len > 1.0 {
                mx /= len;
                my /= len;
            }

            if let Some(vel) = world.store_mut().get_mut::<Velocity>(id) {
                vel.vx = mx * speed;
                vel.vy = my * speed;
            }
        }
    }
}

/// Mirrors `Action` events onto every controlled entity.
pub struct InputActionHandler;

impl Subscriber<World> for InputActionHandler {
    fn on_event(&self, event: &GameEvent, world: &mut World) {
        let GameEvent::Action { action, pressed } = event else {
            return;
        };
        match action {
            InputAction::Shoot => {
                for id in world.query(KindSet::of(&[ComponentKind::PlayerControl])) {
                    if let Some(control) = world.store_mut().get_mut::<PlayerControl>(id) {
                        control.firing = *pressed;
                    }
                }
            }
        }
    }
}
