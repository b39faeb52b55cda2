use proptest::prelude::*;
use tribal_mind::core::config::SimulationConfig;
use tribal_mind::core::types::{EntityId, Vec2};
use tribal_mind::ecs::World;
use tribal_mind::entity::EntityKind;

prop_compose! {
    fn arb_position()(
        x in 0.0f32..400.0,
        y in 0.0f32..300.0
    ) -> Vec2 {
        Vec2::new(x, y)
    }
}

fn populated(toroidal: bool, cell: f32, bushes: &[Vec2], boars: &[Vec2]) -> World {
    let config = SimulationConfig {
        world_width: 400.0,
        world_height: 300.0,
        toroidal,
        grid_cell_size: cell,
        ..SimulationConfig::default()
    };
    let mut world = World::new(config);
    for &pos in bushes {
        world.spawn_bush(pos);
    }
    for &pos in boars {
        world.spawn_boar(pos);
    }
    world.spatial.rebuild(&world.entities);
    world
}

fn brute_force(world: &World, kind: EntityKind, point: Vec2, radius: f32) -> Vec<EntityId> {
    let metric = world.metric();
    let mut ids: Vec<EntityId> = world
        .entities
        .iter()
        .filter(|e| e.kind() == kind)
        .filter(|e| metric.distance(point, e.position) <= radius)
        .map(|e| e.id)
        .collect();
    ids.sort_unstable();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_by_radius_matches_brute_force(
        toroidal in any::<bool>(),
        cell in 5.0f32..80.0,
        bushes in prop::collection::vec(arb_position(), 0..40),
        boars in prop::collection::vec(arb_position(), 0..10),
        point in arb_position(),
        radius in 0.0f32..250.0
    ) {
        let world = populated(toroidal, cell, &bushes, &boars);

        for kind in [EntityKind::ResourceSource, EntityKind::Actor] {
            let indexed = world.spatial.by_radius(kind, point, radius);
            let expected = brute_force(&world, kind, point, radius);
            prop_assert_eq!(indexed, expected, "kind {:?}, toroidal {}", kind, toroidal);
        }
    }

    #[test]
    fn test_counts_match_store(
        bushes in prop::collection::vec(arb_position(), 0..30),
        boars in prop::collection::vec(arb_position(), 0..30)
    ) {
        let world = populated(true, 20.0, &bushes, &boars);
        prop_assert_eq!(world.spatial.count(EntityKind::ResourceSource), bushes.len());
        prop_assert_eq!(world.spatial.count(EntityKind::Actor), boars.len());
        prop_assert_eq!(world.spatial.all(EntityKind::Actor).len(), boars.len());
    }

    #[test]
    fn test_wrapped_distance_is_symmetric_and_bounded(a in arb_position(), b in arb_position()) {
        let world = populated(true, 20.0, &[], &[]);
        let metric = world.metric();
        let ab = metric.distance(a, b);
        prop_assert!((ab - metric.distance(b, a)).abs() < 1e-3);
        // Never farther than half the diagonal
        prop_assert!(ab <= (200.0f32 * 200.0 + 150.0 * 150.0).sqrt() + 1e-3);
    }
}
