//! Scale and bone sampling
//!
//! Offsets come back in physics units: game-unit positions multiplied by
//! the configured world scale.

use super::Actor;
use crate::config::AdjustmentSettings;
use crate::foundation::math::Vec3;

/// Local scale of the loaded model root, third person first
pub fn model_scale(actor: &dyn Actor) -> f32 {
    actor
        .skeleton(false)
        .or_else(|| actor.skeleton(true))
        .and_then(|skeleton| skeleton.root_node().map(|root| root.local_scale))
        .unwrap_or(1.0)
}

/// Local scale of a named node, third person first
pub fn node_scale(actor: &dyn Actor, name: &str, budget: usize) -> f32 {
    [false, true]
        .into_iter()
        .find_map(|first_person| {
            let skeleton = actor.skeleton(first_person)?;
            skeleton.find_node(name, budget).map(|node| node.local_scale)
        })
        .unwrap_or(1.0)
}

/// Effective actor scale: model scale times every configured scale node,
/// clamped to the configured bounds.
///
/// # Panics
///
/// If `scale_min > scale_max`, which validated settings rule out.
pub fn compute_scale(actor: &dyn Actor, settings: &AdjustmentSettings) -> f32 {
    let scale = settings
        .bones
        .scale_nodes
        .iter()
        .fold(model_scale(actor), |scale, name| {
            scale * node_scale(actor, name, settings.traversal_budget)
        });
    scale.clamp(settings.scale_min, settings.scale_max)
}

/// Sample a bone.
///
/// With `world` set this is the bone's world position relative to the actor,
/// negated if `invert` is set. Otherwise it is the bone's local translation.
/// A missing bone samples as zero.
pub fn bone_offset(actor: &dyn Actor, bone: &str, invert: bool, world: bool, settings: &AdjustmentSettings) -> Vec3 {
    let sample = [false, true].into_iter().find_map(|first_person| {
        let skeleton = actor.skeleton(first_person)?;
        let node = skeleton.find_node(bone, settings.traversal_budget)?;
        Some(if world {
            node.world_translate - actor.position()
        } else {
            node.local_translate
        })
    });

    match sample {
        Some(offset) if world && invert => -offset * settings.world_scale,
        Some(offset) => offset * settings.world_scale,
        None => Vec3::zeros(),
    }
}

/// Head position relative to the actor with the linear vertical correction
/// for `correction_scale` applied
pub fn head_offset(actor: &dyn Actor, correction_scale: f32, settings: &AdjustmentSettings) -> Vec3 {
    let head = bone_offset(actor, &settings.bones.head, false, true, settings);
    head + Vec3::new(0.0, 0.0, settings.calibration.correction(correction_scale))
}

/// Actor position relative to the skeleton root
pub fn root_offset(actor: &dyn Actor, settings: &AdjustmentSettings) -> Vec3 {
    bone_offset(actor, &settings.bones.root, true, true, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::skeleton::{Skeleton, SkeletonNode};
    use crate::test_support::{humanoid_skeleton, TestActor};
    use approx::assert_relative_eq;

    #[test]
    fn test_scale_multiplies_sources() {
        let settings = AdjustmentSettings::default();
        let mut skeleton = humanoid_skeleton(100.0);
        let npc = skeleton.find("NPC", 64).unwrap();
        skeleton.node_mut(npc).unwrap().local_scale = 1.5;
        let root = skeleton.find("NPC Root [Root]", 64).unwrap();
        skeleton.node_mut(root).unwrap().local_scale = 2.0;

        let actor = TestActor::npc().with_skeleton(skeleton).build();
        assert_relative_eq!(compute_scale(&*actor, &settings), 3.0);
    }

    #[test]
    fn test_scale_clamped() {
        let settings = AdjustmentSettings::default();
        let tiny = TestActor::npc()
            .with_skeleton(Skeleton::new(SkeletonNode::new("model").with_scale(0.01)))
            .build();
        assert_relative_eq!(compute_scale(&*tiny, &settings), 0.15);

        let huge = TestActor::npc()
            .with_skeleton(Skeleton::new(SkeletonNode::new("model").with_scale(50.0)))
            .build();
        assert_relative_eq!(compute_scale(&*huge, &settings), 20.0);
    }

    #[test]
    fn test_unloaded_actor_has_unit_scale() {
        let settings = AdjustmentSettings::default();
        let actor = TestActor::npc().build();
        assert_relative_eq!(compute_scale(&*actor, &settings), 1.0);
        assert_eq!(bone_offset(&*actor, "NPC Head [Head]", false, true, &settings), Vec3::zeros());
    }

    #[test]
    fn test_first_person_fallback() {
        let settings = AdjustmentSettings::default();
        let mut first_person = Skeleton::new(SkeletonNode::new("model"));
        first_person.add_child(first_person.root(), SkeletonNode::new("NPC").with_scale(1.25));

        let actor = TestActor::npc()
            .with_skeleton(Skeleton::new(SkeletonNode::new("model")))
            .with_first_person_skeleton(first_person)
            .build();
        assert_relative_eq!(node_scale(&*actor, "NPC", 64), 1.25);
    }

    #[test]
    fn test_bone_offset_modes() {
        let settings = AdjustmentSettings::default();
        let actor = TestActor::npc()
            .with_position(Vec3::new(100.0, 0.0, 50.0))
            .with_skeleton(humanoid_skeleton(100.0))
            .build();
        let head = actor.skeleton(false).unwrap().find_node("NPC Head [Head]", 64).unwrap().clone();

        let world = bone_offset(&*actor, "NPC Head [Head]", false, true, &settings);
        let expected = (head.world_translate - Vec3::new(100.0, 0.0, 50.0)) * settings.world_scale;
        assert_relative_eq!(world, expected);

        let inverted = bone_offset(&*actor, "NPC Head [Head]", true, true, &settings);
        assert_relative_eq!(inverted, -expected);

        let local = bone_offset(&*actor, "NPC Head [Head]", true, false, &settings);
        assert_relative_eq!(local, head.local_translate * settings.world_scale);
    }

    #[test]
    fn test_head_offset_correction() {
        let settings = AdjustmentSettings::default();
        let actor = TestActor::npc().with_skeleton(humanoid_skeleton(100.0)).build();
        let head = bone_offset(&*actor, "NPC Head [Head]", false, true, &settings);

        let corrected = head_offset(&*actor, 1.45, &settings);
        assert_relative_eq!(corrected.z, head.z + 1.45 * 0.32 - 1.0, epsilon = 1e-6);
        assert_relative_eq!(corrected.x, head.x);
    }

    #[test]
    fn test_root_offset_is_inverted() {
        let settings = AdjustmentSettings::default();
        let actor = TestActor::npc()
            .with_position(Vec3::new(0.0, 0.0, 10.0))
            .with_skeleton(humanoid_skeleton(100.0))
            .build();
        let root = actor.skeleton(false).unwrap().find_node("NPC Root [Root]", 64).unwrap().world_translate;
        assert_relative_eq!(
            root_offset(&*actor, &settings),
            (Vec3::new(0.0, 0.0, 10.0) - root) * settings.world_scale
        );
    }
}
