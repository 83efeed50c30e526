use std::hint::black_box;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use sandscape_input::{InputEvent, InputState, Intent};
use sandscape_kernel::{Scene, SceneConfig, SceneHandles};

fn bench_update(iterations: usize) {
    let mut scene = Scene::new(SceneConfig::desert());
    let mut rng = StdRng::seed_from_u64(1);
    let mut input = InputState::new();
    input.apply(InputEvent::pressed(Intent::MoveForward));
    input.apply(InputEvent::pressed(Intent::LookLeft));

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(scene.update(black_box(&input), 1.0 / 60.0, &mut rng));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  update ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_compose(iterations: usize) {
    let scene = Scene::new(SceneConfig::desert());
    let handles = SceneHandles::placeholder();

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(scene.compose(black_box(&handles), 16.0 / 9.0));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  compose ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Scene Benchmarks ===\n");

    println!("Update (camera, rug, flicker):");
    bench_update(100_000);

    println!("\nCompose (full desert frame):");
    bench_compose(2_000);

    println!("\n=== Done ===");
}
