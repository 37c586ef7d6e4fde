//! Basic demonstration of the arcade shooter simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set `RUST_LOG=shmup_sim=debug` for lifecycle logging.

use shmup_sim::{InputAction, Phase, SimWorld};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shmup_sim=info")))
        .init();

    println!("=== Arcade Shooter - Simulation Demo ===\n");

    let mut sim = SimWorld::new();
    sim.world_mut().enable_profiling();
    if !sim.start_level("level_1") {
        eprintln!("level_1 missing from the built-in content");
        return;
    }
    sim.add_companion(40.0, 3.0, Some("blaster"));

    println!("Initial state:");
    print_snapshot(&sim);

    sim.press(InputAction::Shoot);

    // 30 seconds of play at 60 render frames per second, weaving up and down.
    for frame in 0..1800u32 {
        let weave = ((frame as f32) / 90.0).sin();
        sim.set_movement(0.0, weave);
        sim.step(1.0 / 60.0);

        if frame == 600 {
            println!("\n--- Applying upgrade 'overclock' ---\n");
            sim.apply_upgrade("overclock");
        }
        if (frame + 1) % 300 == 0 {
            println!("--- Frame {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&sim);
        }
        if matches!(sim.session().phase, Phase::Complete | Phase::Defeat) {
            break;
        }
    }
    sim.release(InputAction::Shoot);

    if let Some(profiler) = sim.world().profiler() {
        println!("\n{}", profiler.summary());
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot serialization failed: {err}"),
    }
}

fn print_snapshot(sim: &SimWorld) {
    let snapshot = sim.snapshot();
    let session = &snapshot.session;
    println!(
        "  phase={:?} level={} xp={:.1}/{:.1} kills={} hp={:?} sprites={} paused={}",
        session.phase,
        session.level,
        session.xp,
        session.xp_to_next,
        session.kills,
        session.player_health,
        snapshot.sprites.len(),
        snapshot.paused,
    );
}
