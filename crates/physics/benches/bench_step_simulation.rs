use std::hint::black_box;
use std::time::Instant;

use glam::{Quat, Vec3};
use tumble_physics::{PhysicsWorld, RigidBody, WorldConfig};

fn make_world(body_count: usize, spacing: f32) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(WorldConfig::default()).expect("default config is valid");
    let ground = RigidBody::create_box(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::new(400.0, 1.0, 400.0))
        .expect("ground");
    world.add_rigid_body(ground);

    let side = (body_count as f32).sqrt().ceil() as usize;
    for i in 0..body_count {
        let x = (i % side) as f32 * spacing - side as f32 * spacing * 0.5;
        let z = (i / side) as f32 * spacing - side as f32 * spacing * 0.5;
        let body = if i % 2 == 0 {
            RigidBody::create_sphere(1.0, Vec3::new(x, 40.0, z), 2.0)
        } else {
            RigidBody::create_box(1.0, Vec3::new(x, 40.0, z), Quat::IDENTITY, Vec3::splat(3.0))
        };
        world.add_rigid_body(body.expect("body"));
    }
    world
}

fn bench_frames(body_count: usize, frames: usize) {
    let mut world = make_world(body_count, 6.0);

    let start = Instant::now();
    for _ in 0..frames {
        let _ = black_box(world.step_simulation(black_box(1.0 / 60.0), 10));
    }
    let elapsed = start.elapsed();
    let per_frame = elapsed / frames as u32;
    println!(
        "  60Hz frames ({body_count} bodies, {frames} frames): {per_frame:?}/frame, total {elapsed:?}"
    );
}

fn bench_spike(body_count: usize, delta: f32) {
    let mut world = make_world(body_count, 6.0);

    let start = Instant::now();
    let report = world.step_simulation(black_box(delta), 10);
    let elapsed = start.elapsed();
    println!("  spike ({body_count} bodies, delta={delta}s): {elapsed:?}, {report:?}");
}

fn main() {
    println!("=== Step Simulation Benchmarks ===\n");

    println!("Steady frames:");
    bench_frames(16, 600);
    bench_frames(64, 600);
    bench_frames(256, 120);

    println!("\nDelta spikes (capped at 10 sub-steps):");
    bench_spike(64, 0.5);
    bench_spike(64, 5.0);
    bench_spike(256, 5.0);

    println!("\n=== Done ===");
}
