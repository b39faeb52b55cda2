//! Fallback branch: drift around the tribe's anchor

use crate::actions::catalog::ActionId;
use crate::ai::behaviors::{actor, set_intent};
use crate::ai::bt::{BehaviorContext, Status};
use crate::ai::keys;
use crate::core::types::Vec2;
use crate::entity::{EntityKind, Intent, MarkerKind, StructureKind};
use crate::spatial::Property;

/// Point idle members stay close to
///
/// Waypoint marker of the tribe, else its bonfire, else the leader, else
/// wherever the actor stands.
fn anchor(ctx: &BehaviorContext<'_>, own: Vec2) -> Vec2 {
    let world = &*ctx.world;
    let Some(tribe) = actor(ctx).and_then(|a| a.tribe) else {
        return own;
    };

    let waypoint = world
        .spatial
        .by_property(EntityKind::Marker, Property::Owner(tribe))
        .iter()
        .filter_map(|id| world.entities.get(*id))
        .find(|e| e.marker().is_some_and(|m| m.kind == MarkerKind::Waypoint));
    if let Some(marker) = waypoint {
        return marker.position;
    }

    let bonfire = world
        .spatial
        .by_property(EntityKind::Structure, Property::Tribe(tribe))
        .iter()
        .filter_map(|id| world.entities.get(*id))
        .find(|e| e.structure().is_some_and(|s| s.kind == StructureKind::Bonfire));
    if let Some(fire) = bonfire {
        return fire.position;
    }

    if world.entities.is_live(tribe) {
        if let Some(pos) = world.entities.position(tribe) {
            return pos;
        }
    }
    own
}

pub(super) fn wander(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(pos) = ctx.me().map(|e| e.position) else {
        return (Status::Failure, "gone".into());
    };
    let center = anchor(ctx, pos);
    let metric = ctx.world.metric();
    let (arrival, radius) = (ctx.config().arrival_range, ctx.config().wander_radius);

    let keep = ctx.blackboard.get(keys::WANDER_TARGET).copied().filter(|target| {
        metric.distance(pos, *target) > arrival && metric.distance(center, *target) <= radius * 1.5
    });
    let target = match keep {
        Some(target) => target,
        None => {
            let fresh = ctx.world.random_point_near(center, radius);
            ctx.blackboard.set(keys::WANDER_TARGET, fresh);
            fresh
        }
    };

    set_intent(ctx, Intent::new(ActionId::Wander).with_position(target));
    (
        Status::Running,
        format!("strolling to ({:.0}, {:.0})", target.x, target.y),
    )
}
