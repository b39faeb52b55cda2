//! Human behavior tree
//!
//! One shared tree, evaluated for every non-player human each step. The
//! root is a priority selector; the first branch that does not fail wins:
//!
//! | # | Branch   | Runs when                                   |
//! |---|----------|---------------------------------------------|
//! | 1 | defend   | struck recently by someone still close      |
//! | 2 | eat      | hungry and carrying food                    |
//! | 3 | get food | hungry with empty hands                     |
//! | 4 | deliver  | carrying food and a tribe member asked      |
//! | 5 | hunt     | tribe stores are low                        |
//! | 6 | gather   | hands not full                              |
//! | 7 | store    | carrying enough to be worth a trip          |
//! | 8 | wander   | always (never fails)                        |

mod survival;
mod wander;
mod work;

use serde::{Deserialize, Serialize};

use crate::ai::bt::{
    ActionNode, BehaviorContext, BoxedNode, CachingNode, CapacityLimiter, ConditionNode, Inverter,
    Selector, Sequence, Succeeder, TimeoutNode,
};
use crate::ai::keys;
use crate::coordination::TaskKind;
use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, ResourceType};
use crate::entity::{ActorData, Intent};

/// Progress of a gather job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatherPhase {
    Approaching,
    Harvesting,
}

/// Build the shared human tree
///
/// Capacities and timeouts are read from `config` once, here.
pub fn human_tree(config: &SimulationConfig) -> BoxedNode {
    let defend = Sequence::new(
        "defend",
        vec![
            Box::new(ConditionNode::new("under attack", survival::under_attack)),
            Box::new(ActionNode::new("fight back", survival::fight_back)),
        ],
    );

    let eat = Sequence::new(
        "eat",
        vec![
            Box::new(ConditionNode::new("hungry with food", survival::hungry_with_food)),
            Box::new(ActionNode::new("eat", survival::eat)),
        ],
    );

    let get_food = Sequence::new(
        "get food",
        vec![
            Box::new(ConditionNode::new("hungry, empty hands", survival::hungry_empty_handed)),
            Box::new(Selector::new(
                "find a meal",
                vec![
                    Box::new(ActionNode::new("withdraw from storage", survival::withdraw_food)),
                    Box::new(ActionNode::new("ask the tribe", survival::request_food)),
                ],
            )),
        ],
    );

    let deliver = Sequence::new(
        "deliver",
        vec![
            Box::new(ConditionNode::new("someone is waiting", work::someone_waiting)),
            Box::new(
                TimeoutNode::new(
                    "delivery timeout",
                    config.delivery_timeout_hours,
                    keys::DELIVERY_STARTED,
                    Box::new(ActionNode::new("hand over food", work::deliver_food)),
                )
                .with_cleanup(work::abandon_delivery),
            ),
        ],
    );

    let hunt = Sequence::new(
        "hunt",
        vec![
            Box::new(ConditionNode::new("stores low", work::stores_low)),
            Box::new(CachingNode::new(
                "find prey",
                config.prey_search_cooldown_hours,
                keys::PREY_SEARCH,
                Box::new(ActionNode::new("search prey", work::find_prey)),
            )),
            Box::new(CapacityLimiter::new(
                "hunting party",
                TaskKind::Hunt,
                keys::PREY_TARGET,
                config.max_hunters_per_prey,
                Box::new(
                    TimeoutNode::new(
                        "hunt timeout",
                        config.hunt_timeout_hours,
                        keys::HUNT_STARTED,
                        Box::new(ActionNode::new("chase prey", work::hunt)),
                    )
                    .with_cleanup(work::forget_prey),
                ),
            )),
        ],
    );

    let gather = Sequence::new(
        "gather",
        vec![
            Box::new(Inverter::new(Box::new(ConditionNode::new("hands full", hands_full)))),
            Box::new(CachingNode::new(
                "find bush",
                config.food_search_cooldown_hours,
                keys::FOOD_SEARCH,
                Box::new(ActionNode::new("search bush", work::find_bush)),
            )),
            Box::new(CapacityLimiter::new(
                "gather slot",
                TaskKind::Gather,
                keys::FOOD_TARGET,
                config.max_gatherers_per_source,
                Box::new(
                    TimeoutNode::new(
                        "gather timeout",
                        config.gather_timeout_hours,
                        keys::GATHER_STARTED,
                        Box::new(ActionNode::new("pick berries", work::gather)),
                    )
                    .with_cleanup(work::forget_bush),
                ),
            )),
        ],
    );

    let store = Sequence::new(
        "store",
        vec![
            Box::new(ConditionNode::new("worth a trip", work::worth_storing)),
            Box::new(ActionNode::new("pick storage", work::find_storage)),
            Box::new(CapacityLimiter::new(
                "storage access",
                TaskKind::Storage,
                keys::STORE_TARGET,
                config.max_storage_users,
                Box::new(ActionNode::new("deposit", work::deposit)),
            )),
        ],
    );

    let wander = Succeeder::new(Box::new(ActionNode::new("wander", wander::wander)));

    Box::new(Selector::new(
        "human",
        vec![
            Box::new(defend),
            Box::new(eat),
            Box::new(get_food),
            Box::new(deliver),
            Box::new(hunt),
            Box::new(gather),
            Box::new(store),
            Box::new(wander),
        ],
    ))
}

fn hands_full(ctx: &BehaviorContext<'_>) -> (bool, String) {
    match actor(ctx) {
        Some(a) => (a.inventory.is_full(), format!("carrying {}", a.inventory.total())),
        None => (true, "not an actor".into()),
    }
}

pub(crate) fn actor<'c>(ctx: &'c BehaviorContext<'_>) -> Option<&'c ActorData> {
    ctx.me().and_then(|e| e.actor())
}

pub(crate) fn carried_food(ctx: &BehaviorContext<'_>) -> u32 {
    actor(ctx).map_or(0, |a| a.inventory.count(ResourceType::Food))
}

pub(crate) fn set_intent(ctx: &mut BehaviorContext<'_>, intent: Intent) {
    if let Some(me) = ctx.me_mut() {
        me.intent = intent;
    }
}

pub(crate) fn distance_to(ctx: &BehaviorContext<'_>, target: EntityId) -> Option<f32> {
    ctx.world.distance_between(ctx.entity, target)
}
