use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tribal_mind::core::config::SimulationConfig;
use tribal_mind::core::types::Vec2;
use tribal_mind::ecs::{Scenario, World};
use tribal_mind::entity::EntityKind;
use tribal_mind::simulation::Simulation;

fn populated(tribes: u32) -> Simulation {
    let mut world = World::new(SimulationConfig::default());
    Scenario {
        tribes,
        tribe_size: 8,
        boars: tribes * 3,
        bushes: tribes * 10,
        player_leader: false,
    }
    .populate(&mut world);
    Simulation::new(world)
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");
    for tribes in [2u32, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(tribes), &tribes, |b, &tribes| {
            let mut sim = populated(tribes);
            b.iter(|| black_box(sim.step().len()))
        });
    }
    group.finish();
}

fn bench_spatial_rebuild(c: &mut Criterion) {
    let mut world = World::new(SimulationConfig::default());
    for i in 0..2000 {
        let pos = Vec2::new((i % 50) as f32 * 8.0, (i / 50) as f32 * 7.5);
        world.spawn_bush(pos);
    }

    c.bench_function("spatial_rebuild_2000", |b| {
        b.iter(|| {
            world.spatial.rebuild(&world.entities);
            black_box(world.spatial.count(EntityKind::ResourceSource))
        })
    });

    world.spatial.rebuild(&world.entities);
    c.bench_function("spatial_by_radius_40", |b| {
        b.iter(|| {
            black_box(
                world
                    .spatial
                    .by_radius(EntityKind::ResourceSource, Vec2::new(200.0, 150.0), 40.0)
                    .len(),
            )
        })
    });
}

criterion_group!(benches, bench_step, bench_spatial_rebuild);
criterion_main!(benches);
