//! End-to-end behaviour of spatial partitions: placement, culling,
//! occlusion, batching and group lifetime.

use std::sync::Arc;

use meridian_shared::{Aabb, Vec3};
use meridian_spatial::{
    Camera, CameraSlot, DrawInfoRaw, Face, Frustum, GroupId, GroupState, Intersection, MatrixId,
    ObjectId, OcclusionMode, OcclusionState, PartitionType, RenderType, SceneObject,
    ScriptedOcclusion, SpatialConfig, SpatialPartition, TextureId,
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn cube(id: u32, center: Vec3, half: f32) -> SceneObject {
    SceneObject::new(ObjectId(id), Aabb::from_center_half_extents(center, Vec3::splat(half)))
}

fn textured(id: u32, center: Vec3) -> SceneObject {
    cube(id, center, 0.5)
        .with_face(Face::new(Some(TextureId(id % 4)), 4, 6))
        .with_face(Face::new(Some(TextureId(1)), 8, 12).with_model_matrix(MatrixId(id % 2)))
}

fn volume(config: &SpatialConfig) -> SpatialPartition {
    SpatialPartition::new(PartitionType::Volume, config)
}

/// Box camera whose eye sits outside `bounds` so occlusion queries run.
fn outside_camera(bounds: &Aabb) -> Camera {
    Camera::new(CameraSlot::World, bounds.min - Vec3::splat(50.0), Frustum::from_box(bounds))
}

fn raw_batches(partition: &SpatialPartition, group: GroupId) -> Vec<DrawInfoRaw> {
    partition
        .group(group)
        .map(|g| g.draw_infos().map(|d| d.to_raw()).collect())
        .unwrap_or_default()
}

fn assert_containment(partition: &SpatialPartition) {
    for group in partition.octree().groups() {
        for child in group.children() {
            let child = partition.group(child).expect("child is live");
            assert!(
                group.bounds().contains(child.bounds()),
                "{:?} does not contain child {:?}",
                group.bounds(),
                child.bounds()
            );
        }
        for id in group.elements() {
            let object = partition.object(*id).expect("element is live");
            assert!(group.bounds().contains(&object.extents));
        }
    }
}

#[test]
fn test_thousand_objects_one_octant_camera() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let mut partition = volume(&SpatialConfig::default());
    for id in 0..1000 {
        let center = Vec3::new(
            rng.gen_range(0.5..255.5),
            rng.gen_range(0.5..255.5),
            rng.gen_range(0.5..255.5),
        );
        partition.put(textured(id, center)).expect("insert");
    }
    assert_eq!(partition.object_count(), 1000);

    let octant = Aabb::new(Vec3::ZERO, Vec3::splat(128.0));
    let camera = Camera::from_box(CameraSlot::World, &octant);
    let mut backend = ScriptedOcclusion::new(4096);
    let result = partition.cull(&camera, &mut backend);

    for gid in &result.visible_groups {
        let group = partition.group(*gid).expect("visible group is live");
        assert!(group.bounds().intersects(&octant), "group {gid} lies outside the octant");
    }

    let in_frustum = partition
        .octree()
        .objects()
        .filter(|o| camera.frustum.test_aabb(&o.extents, false) != Intersection::Outside)
        .count();
    let seen = result.visible_objects.len();
    assert!(seen <= 1000);
    assert!(seen >= in_frustum, "saw {seen}, frustum holds {in_frustum}");
    assert!(result.stats.frustum_culled > 0);
}

#[test]
fn test_rebuild_is_idempotent() {
    let mut partition = volume(&SpatialConfig::default());
    for id in 0..6 {
        partition.put(textured(id, Vec3::splat(id as f32 * 2.0))).expect("insert");
    }
    partition.put(
        cube(10, Vec3::splat(3.0), 1.0)
            .with_face(Face::new(Some(TextureId(7)), 4, 6).with_alpha())
            .with_face(Face::new(None, 4, 6).with_fullbright()),
    )
    .expect("insert");

    let root = partition.root();
    partition.rebuild_geom(root).expect("rebuild");
    let first = raw_batches(&partition, root);
    let first_ref = partition.group(root).and_then(|g| g.draw_infos().next().cloned()).expect("batch");

    partition.rebuild_geom(root).expect("rebuild");
    let second = raw_batches(&partition, root);
    let second_ref = partition.group(root).and_then(|g| g.draw_infos().next().cloned()).expect("batch");

    assert!(!first.is_empty());
    assert_eq!(
        bytemuck::cast_slice::<DrawInfoRaw, u8>(first.as_slice()),
        bytemuck::cast_slice::<DrawInfoRaw, u8>(second.as_slice())
    );
    // Replaced, never patched.
    assert!(!Arc::ptr_eq(&first_ref, &second_ref));
}

#[test]
fn test_query_answers_arrive_next_frame() {
    let mut partition = volume(&SpatialConfig::default());
    partition.put(textured(1, Vec3::splat(5.0))).expect("insert");
    partition.put(textured(2, Vec3::splat(6.0))).expect("insert");
    let camera = outside_camera(&Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0)));
    let mut backend = ScriptedOcclusion::new(16);
    let root = partition.root();

    let first = partition.cull(&camera, &mut backend);
    assert_eq!(first.visible_groups, vec![root]);
    assert_eq!(first.occlusion_groups, vec![root]);

    backend.occlude(root);
    backend.end_frame();
    let second = partition.cull(&camera, &mut backend);
    assert!(second.visible_groups.is_empty());
    assert_eq!(second.occluded_groups, vec![root]);
    // Still refreshed while hidden.
    assert_eq!(second.occlusion_groups, vec![root]);

    // Answer not back yet: stays hidden.
    let third = partition.cull(&camera, &mut backend);
    assert_eq!(third.occluded_groups, vec![root]);

    backend.reveal(root);
    backend.end_frame();
    let fourth = partition.cull(&camera, &mut backend);
    assert_eq!(fourth.visible_groups, vec![root]);
    assert!(!partition.group(root).expect("root").is_occluded(CameraSlot::World));
}

#[test]
fn test_query_exhaustion_draws_group() {
    let mut partition = volume(&SpatialConfig::default());
    partition.put(textured(1, Vec3::splat(5.0))).expect("insert");
    let camera = outside_camera(&Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0)));
    let mut backend = ScriptedOcclusion::new(0);
    let root = partition.root();

    partition
        .set_occlusion_state(root, OcclusionState::OCCLUDED, OcclusionMode::Single, CameraSlot::World)
        .expect("set");
    let result = partition.cull(&camera, &mut backend);

    assert_eq!(result.visible_groups, vec![root]);
    assert_eq!(result.stats.queries_failed, 1);
    let state = partition.group(root).expect("root").occlusion(CameraSlot::World).state;
    assert!(state.contains(OcclusionState::EARLY_FAIL));
    assert!(!state.contains(OcclusionState::OCCLUDED));
}

#[test]
fn test_camera_inside_group_skips_query() {
    let mut partition = volume(&SpatialConfig::default());
    partition.put(cube(1, Vec3::splat(5.0), 4.0).with_face(Face::new(None, 4, 6))).expect("insert");
    let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
    let mut backend = ScriptedOcclusion::new(16);

    let result = partition.cull(&camera, &mut backend);
    assert!(result.occlusion_groups.is_empty());
    assert_eq!(backend.in_flight(), 0);
}

#[test]
fn test_occlusion_is_per_camera() {
    let mut partition = volume(&SpatialConfig::default());
    partition.put(textured(1, Vec3::splat(5.0))).expect("insert");
    let root = partition.root();
    partition
        .set_occlusion_state(root, OcclusionState::OCCLUDED, OcclusionMode::Single, CameraSlot::Shadow0)
        .expect("set");

    let bounds = Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0));
    let mut backend = ScriptedOcclusion::new(16);
    let world = partition.cull(&outside_camera(&bounds), &mut backend);
    let shadow = Camera { slot: CameraSlot::Shadow0, ..outside_camera(&bounds) };
    let shadowed = partition.cull(&shadow, &mut backend);

    assert_eq!(world.visible_groups, vec![root]);
    assert_eq!(shadowed.occluded_groups, vec![root]);
    assert!(partition.is_group_visible(root, CameraSlot::World));
    assert!(!partition.is_group_visible(root, CameraSlot::Shadow0));
}

#[test]
fn test_batches_sorted_and_alpha_back_to_front() {
    let mut partition = volume(&SpatialConfig::default());
    for id in 0..8 {
        partition.put(textured(id, Vec3::new(id as f32 * 4.0, 0.0, 0.0))).expect("insert");
        partition
            .put(
                cube(100 + id, Vec3::new(id as f32 * 4.0, 2.0, 0.0), 0.5)
                    .with_face(Face::new(Some(TextureId(5)), 4, 6).with_alpha()),
            )
            .expect("insert");
    }
    let camera = Camera::new(
        CameraSlot::World,
        Vec3::new(-10.0, 0.0, 0.0),
        Frustum::from_box(&Aabb::new(Vec3::splat(-50.0), Vec3::splat(50.0))),
    );
    let result = partition.cull(&camera, &mut ScriptedOcclusion::new(64));

    let simple = result.batches(RenderType::Simple);
    assert!(!simple.is_empty());
    assert!(simple.windows(2).all(|w| w[0].state_key() <= w[1].state_key()));
    assert!(result.batches(RenderType::Alpha).is_empty());

    assert_eq!(result.alpha_batches.len(), 8);
    assert!(result.alpha_batches.windows(2).all(|w| w[0].distance >= w[1].distance));
    assert!(!result.alpha_groups.is_empty());
    assert_eq!(result.batch_count(), result.draw_order().count());
}

#[test]
fn test_render_pass_pins_groups() {
    let config = SpatialConfig { octree_max_elements: 1, ..SpatialConfig::default() };
    let mut partition = volume(&config);
    partition.put(textured(1, Vec3::splat(10.0))).expect("insert");
    let child = partition.put(textured(2, Vec3::splat(12.0))).expect("insert");
    assert_ne!(child, partition.root());

    let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(20.0)));
    let result = partition.cull(&camera, &mut ScriptedOcclusion::new(16));
    assert!(result.drawable_groups.contains(&child));

    partition.begin_render(&result);
    partition.remove(ObjectId(2)).expect("remove");
    assert!(partition.group(child).is_some(), "pinned group was pruned");

    partition.end_render();
    assert!(partition.group(child).is_none());
}

#[test]
fn test_shift_rebuilds_on_next_cull() {
    let mut partition = volume(&SpatialConfig::default());
    partition.put(textured(1, Vec3::splat(5.0))).expect("insert");
    let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
    let mut backend = ScriptedOcclusion::new(16);
    partition.cull(&camera, &mut backend);

    let offset = Vec3::new(256.0, 0.0, 0.0);
    partition.shift(offset);
    let root = partition.root();
    assert!(partition.group(root).expect("root").state().contains(GroupState::GEOM_DIRTY));

    let moved = Camera::from_box(
        CameraSlot::World,
        &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)).translated(offset),
    );
    let result = partition.cull(&moved, &mut backend);
    assert_eq!(result.rebuilt_groups, vec![root]);
    let extents = result.batch_extents().expect("batches");
    assert_eq!(extents.center(), Vec3::new(261.0, 5.0, 5.0));
}

#[test]
fn test_moved_object_leaves_old_region() {
    let mut partition = volume(&SpatialConfig::default());
    partition.put(textured(1, Vec3::splat(5.0))).expect("insert");
    partition
        .move_object(ObjectId(1), Aabb::from_center_half_extents(Vec3::splat(-60.0), Vec3::splat(0.5)))
        .expect("move");

    let near = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
    assert!(partition.visible_objects_in_frustum(&near).is_empty());
    assert_containment(&partition);
}

#[derive(Debug, Clone)]
enum Op {
    Put(u32, Vec3, f32),
    Remove(u32),
    Move(u32, Vec3),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let coord = -300.0_f32..300.0;
    let point = (coord.clone(), coord.clone(), coord).prop_map(|(x, y, z)| Vec3::new(x, y, z));
    prop_oneof![
        (0_u32..48, point.clone(), 0.1_f32..20.0).prop_map(|(id, p, h)| Op::Put(id, p, h)),
        (0_u32..48).prop_map(Op::Remove),
        (0_u32..48, point).prop_map(|(id, p)| Op::Move(id, p)),
    ]
}

proptest! {
    #[test]
    fn test_rebound_contains_children_and_objects(ops in prop::collection::vec(op_strategy(), 1..120)) {
        let config = SpatialConfig { octree_max_elements: 2, ..SpatialConfig::default() };
        let mut partition = volume(&config);

        for op in ops {
            match op {
                Op::Put(id, center, half) => {
                    if partition.object(ObjectId(id)).is_none() {
                        partition.put(cube(id, center, half)).expect("insert");
                    }
                }
                Op::Remove(id) => {
                    if partition.object(ObjectId(id)).is_some() {
                        partition.remove(ObjectId(id)).expect("remove");
                    }
                }
                Op::Move(id, center) => {
                    if let Some(half) = partition.object(ObjectId(id)).map(|o| o.extents.half_extents()) {
                        partition
                            .move_object(ObjectId(id), Aabb::from_center_half_extents(center, half))
                            .expect("move");
                    }
                }
            }
        }

        partition.rebound();
        prop_assert!(partition
            .octree()
            .groups()
            .all(|g| !g.state().contains(GroupState::DIRTY)));
        assert_containment(&partition);
    }
}
