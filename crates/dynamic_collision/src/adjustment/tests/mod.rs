//! Scenario tests running records and the handler against a live world


use std::sync::Arc;

use crate::actor::Skeleton;
use crate::physics::PhysicsWorld;
use crate::test_support::{humanoid_skeleton, ControllerFixture, Spawned, TestActor, TestActorBuilder};

/// A world with one spawned controller and the actor driving it
struct Scene {
    world: Arc<PhysicsWorld>,
    spawned: Spawned,
    actor: Arc<TestActor>,
}

fn scene(fixture: ControllerFixture, actor: TestActorBuilder) -> Scene {
    let world = Arc::new(PhysicsWorld::new());
    scene_in(&world, fixture, actor)
}

fn scene_in(world: &Arc<PhysicsWorld>, fixture: ControllerFixture, actor: TestActorBuilder) -> Scene {
    let spawned = fixture.spawn(world);
    let actor = actor
        .with_world(Arc::clone(world))
        .with_controller(spawned.id)
        .build();
    Scene {
        world: Arc::clone(world),
        spawned,
        actor,
    }
}

/// Humanoid skeleton with its `NPC` node scaled
fn scaled_humanoid(scale: f32) -> Skeleton {
    let mut skeleton = humanoid_skeleton(100.0);
    let npc = skeleton.find("NPC", 64).unwrap();
    skeleton.node_mut(npc).unwrap().local_scale = scale;
    skeleton.update_world_transforms();
    skeleton
}
