//! Damage, death and collision behavior through the public API.

use shmup_sim::systems::{self, CollisionSystem};
use shmup_sim::{
    Collider, ComponentKind, EntityId, GameEvent, Health, KindSet, Projectile, Subscriber, System, Tag, Topic,
    Transform, Velocity, World,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Deaths(RefCell<Vec<EntityId>>);

impl Subscriber<World> for Deaths {
    fn on_event(&self, event: &GameEvent, _world: &mut World) {
        if let GameEvent::Death { entity, .. } = event {
            self.0.borrow_mut().push(*entity);
        }
    }
}

fn world_with_deaths() -> (World, Rc<Deaths>) {
    let mut world = World::default();
    systems::install_default_subscribers(&mut world);
    let deaths = Rc::new(Deaths::default());
    world.subscribe(Topic::Death, deaths.clone());
    (world, deaths)
}

fn enemy(world: &mut World, x: f32, y: f32, hp: f32) -> EntityId {
    let id = world.store_mut().create();
    world.store_mut().attach(id, Transform::at(x, y));
    world.store_mut().attach(id, Collider::new(5.0));
    world.store_mut().attach(id, Health::new(hp));
    world.store_mut().attach(id, Tag::Enemy);
    id
}

fn bullet(world: &mut World, x: f32, y: f32, damage: f32, max_pierce: u32) -> EntityId {
    let id = world.store_mut().create();
    world.store_mut().attach(id, Transform::at(x, y));
    world.store_mut().attach(id, Velocity::new(0.0, 0.0));
    world.store_mut().attach(id, Collider::new(5.0));
    world.store_mut().attach(id, Tag::Bullet);
    world.store_mut().attach(id, Projectile::new(damage, max_pierce));
    id
}

fn damage(world: &mut World, target: EntityId, amount: f32) {
    world.publish(GameEvent::Damage {
        target,
        source: EntityId(0),
        amount,
    });
}

#[test]
fn test_lethal_threshold_fires_one_death() {
    let (mut world, deaths) = world_with_deaths();
    let e = enemy(&mut world, 0.0, 0.0, 60.0);

    for _ in 0..4 {
        damage(&mut world, e, 12.0);
    }
    assert_eq!(world.store().get::<Health>(e).unwrap().current, 12.0);
    assert!(deaths.0.borrow().is_empty());

    damage(&mut world, e, 12.0);
    assert_eq!(*deaths.0.borrow(), vec![e]);
    assert!(!world.store().is_active(e));

    damage(&mut world, e, 12.0);
    assert_eq!(deaths.0.borrow().len(), 1);
}

#[test]
fn test_damage_never_raises_health() {
    let (mut world, _) = world_with_deaths();
    let e = enemy(&mut world, 0.0, 0.0, 50.0);
    let mut last = 50.0;
    for amount in [3.0, 0.0, -10.0, 7.5, 100.0, 1.0] {
        damage(&mut world, e, amount);
        let current = world.store().get::<Health>(e).map_or(0.0, |h| h.current);
        assert!(current <= last, "{current} > {last}");
        assert!(current >= 0.0);
        last = current;
    }
}

#[test]
fn test_pierce_one_hits_two_targets() {
    let (mut world, _) = world_with_deaths();
    let b = bullet(&mut world, 0.0, 0.0, 1.0, 1);
    let e1 = enemy(&mut world, 2.0, 0.0, 10.0);
    let e2 = enemy(&mut world, -2.0, 0.0, 10.0);

    let mut collision = CollisionSystem::default();
    collision.update(&mut world, 1.0 / 60.0);

    assert_eq!(world.store().get::<Health>(e1).unwrap().current, 9.0);
    assert_eq!(world.store().get::<Health>(e2).unwrap().current, 9.0);
    assert!(!world.store().is_active(b));
}

#[test]
fn test_pierce_one_survives_first_hit() {
    let (mut world, _) = world_with_deaths();
    let b = bullet(&mut world, 0.0, 0.0, 1.0, 1);
    enemy(&mut world, 2.0, 0.0, 10.0);

    CollisionSystem::default().update(&mut world, 1.0 / 60.0);

    assert!(world.store().is_active(b));
    let p = world.store().get::<Projectile>(b).unwrap();
    assert_eq!(p.pierce, 0);
    assert_eq!(p.hit_set.len(), 1);
}

#[test]
fn test_pierce_zero_dies_on_first_hit() {
    let (mut world, _) = world_with_deaths();
    let b = bullet(&mut world, 0.0, 0.0, 1.0, 0);
    let e1 = enemy(&mut world, 2.0, 0.0, 10.0);
    let e2 = enemy(&mut world, -2.0, 0.0, 10.0);

    CollisionSystem::default().update(&mut world, 1.0 / 60.0);

    assert_eq!(world.store().get::<Health>(e1).unwrap().current, 9.0);
    assert_eq!(world.store().get::<Health>(e2).unwrap().current, 10.0);
    assert!(!world.store().is_active(b));
}

#[test]
fn test_collision_boundary_is_strict() {
    let (mut world, _) = world_with_deaths();
    let far = bullet(&mut world, 0.0, 0.0, 1.0, 0);
    let target = enemy(&mut world, 10.0, 0.0, 10.0);

    CollisionSystem::default().update(&mut world, 1.0 / 60.0);
    assert!(world.store().is_active(far));
    assert_eq!(world.store().get::<Health>(target).unwrap().current, 10.0);

    world.store_mut().get_mut::<Transform>(far).unwrap().x = 0.001;
    CollisionSystem::default().update(&mut world, 1.0 / 60.0);
    assert!(!world.store().is_active(far));
    assert_eq!(world.store().get::<Health>(target).unwrap().current, 9.0);
}

#[test]
fn test_killed_enemy_drops_xp_and_counts_kill() {
    let (mut world, _) = world_with_deaths();
    world.set_session(shmup_sim::Session::start("test"));
    let e = enemy(&mut world, 40.0, 50.0, 5.0);
    world.store_mut().attach(e, shmup_sim::Bounty { xp: 4.0 });

    damage(&mut world, e, 5.0);

    assert_eq!(world.session().kills, 1);
    let pickups = world.query(KindSet::of(&[ComponentKind::Pickup]));
    assert_eq!(pickups.len(), 1);
    let t = world.store().get::<Transform>(pickups[0]).unwrap();
    assert_eq!((t.x, t.y), (40.0, 50.0));
}

/// Damages a fixed neighbour whenever anything dies.
struct Blast {
    neighbour: EntityId,
    amount: f32,
}

impl Subscriber<World> for Blast {
    fn on_event(&self, event: &GameEvent, world: &mut World) {
        if let GameEvent::Death { entity, .. } = event {
            if *entity != self.neighbour {
                damage(world, self.neighbour, self.amount);
            }
        }
    }
}

#[test]
fn test_death_blast_damages_neighbour() {
    let (mut world, deaths) = world_with_deaths();
    let a = enemy(&mut world, 0.0, 0.0, 10.0);
    let b = enemy(&mut world, 20.0, 0.0, 20.0);
    world.subscribe(Topic::Death, Rc::new(Blast { neighbour: b, amount: 5.0 }));

    damage(&mut world, a, 10.0);

    assert_eq!(*deaths.0.borrow(), vec![a]);
    assert_eq!(world.store().get::<Health>(b).unwrap().current, 15.0);
}

#[test]
fn test_death_blast_can_kill_neighbour() {
    let (mut world, deaths) = world_with_deaths();
    let a = enemy(&mut world, 0.0, 0.0, 10.0);
    let b = enemy(&mut world, 20.0, 0.0, 5.0);
    world.subscribe(Topic::Death, Rc::new(Blast { neighbour: b, amount: 5.0 }));

    damage(&mut world, a, 10.0);

    // The neighbour dies while the first death is still being delivered.
    assert_eq!(*deaths.0.borrow(), vec![a, b]);
    assert!(!world.store().is_active(a));
    assert!(!world.store().is_active(b));
}

#[test]
fn test_weapon_pierce_one_without_chain_spent_on_second_hit() {
    let mut content = shmup_sim::ContentDb::builtin();
    content.weapons.insert(
        "lance".into(),
        shmup_sim::config::WeaponDef {
            pierce: 1,
            ..Default::default()
        },
    );
    let mut world = World::new(shmup_sim::SimConfig::default(), content);
    systems::install_default_subscribers(&mut world);
    let player = shmup_sim::spawn::spawn_player(&mut world, 500.0, 500.0);
    world.publish(GameEvent::Shoot {
        x: 100.0,
        y: 100.0,
        rotation: 0.0,
        owner: player,
        weapon_id: "lance".into(),
    });
    let shots = world.query(KindSet::of(&[ComponentKind::Projectile]));
    assert_eq!(shots.len(), 1);
    let shot = shots[0];
    let p = world.store().get::<Projectile>(shot).unwrap();
    assert_eq!((p.pierce, p.chain), (1, 0));

    let e1 = enemy(&mut world, 102.0, 100.0, 100.0);
    let e2 = enemy(&mut world, 98.0, 100.0, 100.0);
    let e3 = enemy(&mut world, 100.0, 102.0, 100.0);
    CollisionSystem::default().update(&mut world, 1.0 / 60.0);

    assert!(!world.store().is_active(shot));
    assert!(world.store().get::<Health>(e1).unwrap().current < 100.0);
    assert!(world.store().get::<Health>(e2).unwrap().current < 100.0);
    assert_eq!(world.store().get::<Health>(e3).unwrap().current, 100.0);
}
