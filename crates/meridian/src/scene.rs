//! # Scene Registry
//!
//! One [`SpatialPartition`] per [`PartitionType`], owned in one place and
//! handed to whoever needs it. Objects are routed to their partition on
//! insert and found again by id.

use std::collections::{BTreeMap, HashMap};

use meridian_shared::{Aabb, Vec3};
use meridian_spatial::{
    Camera, CullResult, GroupId, ObjectId, OcclusionBackend, PartitionType, SceneObject,
    SegmentHit, SpatialConfig, SpatialError, SpatialPartition, SpatialResult,
};
use tracing::debug;

/// Cull results of every partition for one camera.
#[derive(Debug, Default)]
pub struct SceneCull {
    /// Per-partition results, in partition order.
    pub results: Vec<(PartitionType, CullResult)>,
}

impl SceneCull {
    /// Result for one partition.
    #[must_use]
    pub fn get(&self, partition_type: PartitionType) -> Option<&CullResult> {
        self.results.iter().find(|(t, _)| *t == partition_type).map(|(_, r)| r)
    }

    /// Visible groups across partitions.
    #[must_use]
    pub fn visible_groups(&self) -> usize {
        self.results.iter().map(|(_, r)| r.visible_groups.len()).sum()
    }

    /// Batches across partitions.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.results.iter().map(|(_, r)| r.batch_count()).sum()
    }

    /// Groups rebuilt across partitions.
    #[must_use]
    pub fn rebuilt(&self) -> u32 {
        self.results.iter().map(|(_, r)| r.stats.rebuilt).sum()
    }

    /// Groups skipped as occluded across partitions.
    #[must_use]
    pub fn occluded(&self) -> u32 {
        self.results.iter().map(|(_, r)| r.stats.occlusion_culled).sum()
    }
}

/// Every spatial partition of the scene.
#[derive(Debug)]
pub struct SceneRegistry {
    partitions: BTreeMap<PartitionType, SpatialPartition>,
    placement: HashMap<ObjectId, PartitionType>,
}

impl SceneRegistry {
    /// Creates one empty partition of every kind.
    #[must_use]
    pub fn new(config: &SpatialConfig) -> Self {
        let partitions = PartitionType::ALL
            .into_iter()
            .map(|t| (t, SpatialPartition::new(t, config)))
            .collect();
        Self { partitions, placement: HashMap::new() }
    }

    /// Partition of one kind.
    #[must_use]
    pub fn partition(&self, partition_type: PartitionType) -> Option<&SpatialPartition> {
        self.partitions.get(&partition_type)
    }

    /// Mutable partition of one kind.
    pub fn partition_mut(&mut self, partition_type: PartitionType) -> Option<&mut SpatialPartition> {
        self.partitions.get_mut(&partition_type)
    }

    /// All partitions in kind order.
    pub fn partitions(&self) -> impl Iterator<Item = &SpatialPartition> {
        self.partitions.values()
    }

    /// Kind of partition holding `id`.
    #[must_use]
    pub fn partition_of(&self, id: ObjectId) -> Option<PartitionType> {
        self.placement.get(&id).copied()
    }

    /// Objects across partitions.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.placement.len()
    }

    /// Adds an object to the partition of `partition_type`.
    ///
    /// # Errors
    ///
    /// [`SpatialError::DuplicateObject`] if the id is already placed in any
    /// partition, otherwise as for [`SpatialPartition::put`].
    pub fn put(&mut self, partition_type: PartitionType, object: SceneObject) -> SpatialResult<GroupId> {
        let id = object.id;
        if self.placement.contains_key(&id) {
            return Err(SpatialError::DuplicateObject(id));
        }
        let group = self.partition_entry(partition_type).put(object)?;
        self.placement.insert(id, partition_type);
        Ok(group)
    }

    /// Removes an object from whichever partition holds it.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownObject`] if no partition holds it.
    pub fn remove(&mut self, id: ObjectId) -> SpatialResult<SceneObject> {
        let partition_type = self.placement.remove(&id).ok_or(SpatialError::UnknownObject(id))?;
        self.partition_entry(partition_type).remove(id)
    }

    /// Moves an object within its partition.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownObject`] if no partition holds it, otherwise as
    /// for [`SpatialPartition::move_object`].
    pub fn move_object(&mut self, id: ObjectId, extents: Aabb) -> SpatialResult<GroupId> {
        let partition_type = self.partition_of(id).ok_or(SpatialError::UnknownObject(id))?;
        self.partition_entry(partition_type).move_object(id, extents)
    }

    /// Rebases every partition.
    pub fn shift(&mut self, offset: Vec3) {
        debug!(?offset, "Shifting scene");
        for partition in self.partitions.values_mut() {
            partition.shift(offset);
        }
    }

    /// Nearest object crossed by a segment, across partitions.
    pub fn line_segment_intersect(&mut self, start: Vec3, end: Vec3) -> Option<(PartitionType, SegmentHit)> {
        self.partitions
            .iter_mut()
            .filter_map(|(t, p)| p.line_segment_intersect(start, end).map(|hit| (*t, hit)))
            .min_by(|a, b| a.1.t.total_cmp(&b.1.t))
    }

    /// Culls every partition for `camera`.
    pub fn cull_all(&mut self, camera: &Camera, occlusion: &mut dyn OcclusionBackend) -> SceneCull {
        let results = self
            .partitions
            .iter_mut()
            .map(|(t, p)| (*t, p.cull(camera, occlusion)))
            .collect();
        SceneCull { results }
    }

    /// Pins the drawable groups of a cull until [`Self::end_render`].
    pub fn begin_render(&mut self, cull: &SceneCull) {
        for (t, result) in &cull.results {
            if let Some(partition) = self.partitions.get_mut(t) {
                partition.begin_render(result);
            }
        }
    }

    /// Releases the pins taken by [`Self::begin_render`].
    pub fn end_render(&mut self) {
        for partition in self.partitions.values_mut() {
            partition.end_render();
        }
    }

    fn partition_entry(&mut self, partition_type: PartitionType) -> &mut SpatialPartition {
        self.partitions
            .entry(partition_type)
            .or_insert_with(|| SpatialPartition::new(partition_type, &SpatialConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_spatial::{CameraSlot, Face, ScriptedOcclusion, TextureId};

    fn cube(id: u32, at: Vec3) -> SceneObject {
        SceneObject::new(ObjectId(id), Aabb::from_center_half_extents(at, Vec3::splat(0.5)))
            .with_face(Face::new(Some(TextureId(1)), 24, 36))
    }

    #[test]
    fn test_every_kind_has_a_partition() {
        let scene = SceneRegistry::new(&SpatialConfig::default());
        for t in PartitionType::ALL {
            assert_eq!(scene.partition(t).map(SpatialPartition::partition_type), Some(t));
        }
    }

    #[test]
    fn test_objects_are_routed_by_kind() {
        let mut scene = SceneRegistry::new(&SpatialConfig::default());
        scene.put(PartitionType::Volume, cube(1, Vec3::splat(4.0))).unwrap();
        scene.put(PartitionType::Terrain, cube(2, Vec3::splat(8.0))).unwrap();

        assert_eq!(scene.partition_of(ObjectId(2)), Some(PartitionType::Terrain));
        assert_eq!(scene.partition(PartitionType::Volume).unwrap().object_count(), 1);
        assert_eq!(scene.object_count(), 2);

        let err = scene.put(PartitionType::Tree, cube(1, Vec3::ZERO)).unwrap_err();
        assert_eq!(err, SpatialError::DuplicateObject(ObjectId(1)));

        scene.remove(ObjectId(2)).unwrap();
        assert_eq!(scene.partition_of(ObjectId(2)), None);
        assert_eq!(scene.remove(ObjectId(2)).unwrap_err(), SpatialError::UnknownObject(ObjectId(2)));
    }

    #[test]
    fn test_cull_all_covers_every_partition() {
        let mut scene = SceneRegistry::new(&SpatialConfig::default());
        scene.put(PartitionType::Volume, cube(1, Vec3::splat(4.0))).unwrap();
        scene.put(PartitionType::Grass, cube(2, Vec3::splat(6.0))).unwrap();

        let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(16.0)));
        let mut backend = ScriptedOcclusion::new(64);
        let cull = scene.cull_all(&camera, &mut backend);

        assert_eq!(cull.results.len(), PartitionType::ALL.len());
        assert!(cull.get(PartitionType::Volume).is_some_and(|r| r.batch_count() == 1));
        assert!(cull.get(PartitionType::Grass).is_some_and(|r| r.batch_count() == 1));
        assert_eq!(cull.batch_count(), 2);
    }

    #[test]
    fn test_segment_picks_nearest_across_partitions() {
        let mut scene = SceneRegistry::new(&SpatialConfig::default());
        scene.put(PartitionType::Volume, cube(1, Vec3::new(10.0, 0.5, 0.5))).unwrap();
        scene.put(PartitionType::Tree, cube(2, Vec3::new(5.0, 0.5, 0.5))).unwrap();

        let (kind, hit) = scene
            .line_segment_intersect(Vec3::new(0.0, 0.5, 0.5), Vec3::new(20.0, 0.5, 0.5))
            .unwrap();
        assert_eq!(kind, PartitionType::Tree);
        assert_eq!(hit.object, ObjectId(2));
    }
}
