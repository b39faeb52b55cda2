//! Starting population for a world

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::types::{EntityId, Vec2};
use crate::ecs::world::World;
use crate::entity::MarkerKind;

/// Distance from a camp's centre to its storage and bonfire
const CAMP_SPREAD: f32 = 8.0;
/// Radius members are scattered in around their camp
const MEMBER_SPREAD: f32 = 20.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub tribes: u32,
    /// Members per tribe, the leader included
    pub tribe_size: u32,
    pub boars: u32,
    pub bushes: u32,
    /// The first tribe's leader is driven by the host
    pub player_leader: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            tribes: 2,
            tribe_size: 5,
            boars: 6,
            bushes: 20,
            player_leader: false,
        }
    }
}

impl Scenario {
    /// Spawn every camp, animal and bush; returns the tribe leaders
    pub fn populate(&self, world: &mut World) -> Vec<EntityId> {
        let mut leaders = Vec::with_capacity(self.tribes as usize);
        for _ in 0..self.tribes {
            let camp = world.random_point();
            let leader = found_camp(world, camp, self.tribe_size);
            leaders.push(leader);
        }

        for _ in 0..self.bushes {
            let pos = world.random_point();
            world.spawn_bush(pos);
        }
        for _ in 0..self.boars {
            let pos = world.random_point();
            world.spawn_boar(pos);
        }

        if self.player_leader {
            if let Some(&leader) = leaders.first() {
                if let Err(err) = world.set_player(leader) {
                    warn!(%leader, %err, "could not hand the leader to the player");
                }
            }
        }

        info!(
            tribes = self.tribes,
            humans = self.tribes * self.tribe_size,
            boars = self.boars,
            bushes = self.bushes,
            "scenario populated"
        );
        leaders
    }
}

fn found_camp(world: &mut World, camp: Vec2, size: u32) -> EntityId {
    let leader = world.found_tribe(camp);
    let metric = world.metric();
    world.spawn_storage(metric.wrap_position(camp + Vec2::new(CAMP_SPREAD, 0.0)), leader);
    world.spawn_bonfire(metric.wrap_position(camp + Vec2::new(0.0, CAMP_SPREAD)), leader);
    world.spawn_marker(MarkerKind::Waypoint, camp, Some(leader), None);

    for _ in 1..size {
        let pos = world.random_point_near(camp, MEMBER_SPREAD);
        world.spawn_human(pos, Some(leader));
    }
    leader
}
