//! # MERIDIAN Viewer Loop
//!
//! One cooperative tick on the main thread:
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. ASSETS                                                           │
//! │    ├─ Drain inbound completions, fire callbacks                     │
//! │    ├─ Fail requests past their timeout                              │
//! │    └─ Flush stale toxic entries (on its own cadence)                │
//! │                                                                     │
//! │ 2. CULL (per camera)                                                │
//! │    ├─ Every partition: frustum, occlusion, rebuild dirty groups     │
//! │    └─ Render map + alpha list per partition                         │
//! │                                                                     │
//! │ 3. SUBMIT                                                           │
//! │    ├─ Pin drawable groups                                           │
//! │    ├─ Hand the cull to the renderer                                 │
//! │    └─ Unpin                                                         │
//! │                                                                     │
//! │ 4. END FRAME                                                        │
//! │    ├─ Occlusion backend end of frame                                │
//! │    └─ Record timing, warn when over budget                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use meridian_assets::{AssetStorage, TickReport};
use meridian_spatial::{Camera, OcclusionBackend};
use tracing::warn;

use crate::config::{FrameConfig, ViewerConfig};
use crate::scene::{SceneCull, SceneRegistry};

/// Frame time at 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Frame timing and work counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Asset tick time in microseconds.
    pub assets_us: u64,
    /// Cull time in microseconds, all cameras.
    pub cull_us: u64,
    /// Submit time in microseconds.
    pub submit_us: u64,
    /// Frame number.
    pub frame: u64,
    /// What the asset tick did.
    pub assets: TickReport,
    /// Visible groups, all cameras and partitions.
    pub visible_groups: u32,
    /// Groups rebuilt.
    pub rebuilt_groups: u32,
    /// Groups skipped as occluded.
    pub occluded_groups: u32,
    /// Draw batches emitted.
    pub draw_batches: u32,
}

/// The main-thread loop over the asset coordinator and the scene.
pub struct ViewerLoop<B: OcclusionBackend> {
    config: FrameConfig,
    assets: AssetStorage,
    scene: SceneRegistry,
    occlusion: B,
    frame_count: u64,
    stats_accumulator: FrameStatsAccumulator,
}

impl<B: OcclusionBackend> ViewerLoop<B> {
    /// Creates a loop with an empty scene.
    #[must_use]
    pub fn new(config: &ViewerConfig, assets: AssetStorage, occlusion: B) -> Self {
        Self {
            stats_accumulator: FrameStatsAccumulator::with_budget(config.frame.frame_budget()),
            config: config.frame.clone(),
            assets,
            scene: SceneRegistry::new(&config.spatial),
            occlusion,
            frame_count: 0,
        }
    }

    /// Runs one frame. `submit` is called once per camera with that
    /// camera's cull while its drawable groups are pinned.
    pub fn tick<F>(&mut self, cameras: &[Camera], mut submit: F) -> FrameStats
    where
        F: FnMut(&Camera, &SceneCull),
    {
        let frame_start = Instant::now();
        let mut stats = FrameStats { frame: self.frame_count, ..FrameStats::default() };

        stats.assets = self.assets.tick();
        let assets_done = Instant::now();
        stats.assets_us = micros(assets_done - frame_start);

        let culls: Vec<SceneCull> = cameras
            .iter()
            .map(|camera| self.scene.cull_all(camera, &mut self.occlusion))
            .collect();
        let cull_done = Instant::now();
        stats.cull_us = micros(cull_done - assets_done);

        for (camera, cull) in cameras.iter().zip(&culls) {
            stats.visible_groups += cull.visible_groups() as u32;
            stats.rebuilt_groups += cull.rebuilt();
            stats.occluded_groups += cull.occluded();
            stats.draw_batches += cull.batch_count() as u32;

            self.scene.begin_render(cull);
            submit(camera, cull);
            self.scene.end_render();
        }
        stats.submit_us = micros(cull_done.elapsed());

        self.occlusion.end_frame();
        stats.total_us = micros(frame_start.elapsed());
        self.end_frame(stats);
        stats
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        let budget = self.config.frame_budget();
        if self.config.enable_timing_logs && stats.total_us > micros(budget) {
            warn!(
                frame = stats.frame,
                total_ms = stats.total_us as f64 / 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "Frame exceeded budget"
            );
        }
    }

    /// Frames completed.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The asset coordinator.
    #[must_use]
    pub const fn assets(&self) -> &AssetStorage {
        &self.assets
    }

    /// The scene.
    #[must_use]
    pub const fn scene(&self) -> &SceneRegistry {
        &self.scene
    }

    /// Mutable scene, for inserting and moving objects between ticks.
    pub fn scene_mut(&mut self) -> &mut SceneRegistry {
        &mut self.scene
    }

    /// The occlusion backend.
    #[must_use]
    pub const fn occlusion(&self) -> &B {
        &self.occlusion
    }

    /// Mutable occlusion backend.
    pub fn occlusion_mut(&mut self) -> &mut B {
        &mut self.occlusion
    }

    /// Accumulated frame statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Frame budget in microseconds.
    pub budget_us: u64,
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of asset tick times.
    pub assets_us_sum: u64,
    /// Sum of cull times.
    pub cull_us_sum: u64,
    /// Sum of submit times.
    pub submit_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Inbound asset messages processed.
    pub asset_messages: u64,
    /// Asset requests timed out.
    pub asset_timeouts: u64,
    /// Groups rebuilt.
    pub groups_rebuilt: u64,
    /// Draw batches emitted.
    pub draw_batches: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator against the 60 FPS budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_budget(TARGET_FRAME_TIME)
    }

    /// Creates an accumulator against `budget`.
    #[must_use]
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            budget_us: micros(budget),
            frames_recorded: 0,
            total_us_sum: 0,
            assets_us_sum: 0,
            cull_us_sum: 0,
            submit_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            asset_messages: 0,
            asset_timeouts: 0,
            groups_rebuilt: 0,
            draw_batches: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.assets_us_sum += stats.assets_us;
        self.cull_us_sum += stats.cull_us;
        self.submit_us_sum += stats.submit_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.asset_messages += stats.assets.messages as u64;
        self.asset_timeouts += stats.assets.timed_out as u64;
        self.groups_rebuilt += u64::from(stats.rebuilt_groups);
        self.draw_batches += u64::from(stats.draw_batches);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        self.avg_ms(self.total_us_sum)
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    fn avg_ms(&self, sum_us: u64) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (sum_us as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Prints a summary of the statistics.
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                    FRAME STATISTICS SUMMARY                      ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ TIMING ───────────────────────────────────────────────────────┐");
        println!("│ Frames Recorded:    {}", self.frames_recorded);
        println!("│ Average Frame:      {:.3} ms ({:.1} FPS)", self.avg_frame_ms(), self.avg_fps());
        if self.frames_recorded > 0 {
            println!("│ Min Frame:          {:.3} ms", self.min_frame_us as f64 / 1000.0);
            println!("│ Max Frame:          {:.3} ms", self.max_frame_us as f64 / 1000.0);
        }
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ BUDGET ───────────────────────────────────────────────────────┐");
        println!("│ Target:             {:.3} ms", self.budget_us as f64 / 1000.0);
        println!(
            "│ Over Budget:        {} frames ({:.1}%)",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        );
        println!("└──────────────────────────────────────────────────────────────────┘");

        if self.frames_recorded > 0 {
            println!();
            println!("┌─ BREAKDOWN ─────────────────────────────────────────────────────┐");
            println!("│ Assets:             {:.3} ms", self.avg_ms(self.assets_us_sum));
            println!("│ Cull:               {:.3} ms", self.avg_ms(self.cull_us_sum));
            println!("│ Submit:             {:.3} ms", self.avg_ms(self.submit_us_sum));
            println!("│ Asset Messages:     {}", self.asset_messages);
            println!("│ Asset Timeouts:     {}", self.asset_timeouts);
            println!("│ Groups Rebuilt:     {}", self.groups_rebuilt);
            println!("│ Draw Batches:       {}", self.draw_batches);
            println!("└──────────────────────────────────────────────────────────────────┘");
        }
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_assets::{MemoryCache, RecordingTransport};
    use meridian_shared::{Aabb, Vec3};
    use meridian_spatial::{
        CameraSlot, Face, ObjectId, PartitionType, SceneObject, ScriptedOcclusion, TextureId,
    };

    fn viewer() -> ViewerLoop<ScriptedOcclusion> {
        let config = ViewerConfig::default();
        let assets =
            AssetStorage::new(config.assets.clone(), MemoryCache::new(), RecordingTransport::new());
        ViewerLoop::new(&config, assets, ScriptedOcclusion::new(64))
    }

    fn camera() -> Camera {
        Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(32.0)))
    }

    #[test]
    fn test_empty_tick_counts_frames() {
        let mut viewer = viewer();
        let stats = viewer.tick(&[camera()], |_, _| {});
        assert_eq!(stats.frame, 0);
        assert_eq!(viewer.frame_count(), 1);
        assert_eq!(viewer.stats().frames_recorded, 1);
        assert_eq!(stats.draw_batches, 0);
    }

    #[test]
    fn test_submit_sees_pinned_groups() {
        let mut viewer = viewer();
        let object = SceneObject::new(ObjectId(7), Aabb::from_center_half_extents(Vec3::splat(4.0), Vec3::ONE))
            .with_face(Face::new(Some(TextureId(2)), 24, 36));
        viewer.scene_mut().put(PartitionType::Volume, object).unwrap();

        let mut submitted = 0;
        let stats = viewer.tick(&[camera()], |_, cull| {
            submitted += cull.batch_count();
        });

        assert_eq!(submitted, 1);
        assert_eq!(stats.draw_batches, 1);
        assert_eq!(stats.rebuilt_groups, 1);

        // Pins are released once submit returns.
        let volume = viewer.scene().partition(PartitionType::Volume).unwrap();
        assert_eq!(volume.group(volume.root()).unwrap().pin_count(), 0);
    }

    #[test]
    fn test_second_frame_reuses_geometry() {
        let mut viewer = viewer();
        let object = SceneObject::new(ObjectId(1), Aabb::from_center_half_extents(Vec3::splat(4.0), Vec3::ONE))
            .with_face(Face::new(Some(TextureId(1)), 24, 36));
        viewer.scene_mut().put(PartitionType::Volume, object).unwrap();

        viewer.tick(&[camera()], |_, _| {});
        let stats = viewer.tick(&[camera()], |_, _| {});
        assert_eq!(stats.rebuilt_groups, 0);
        assert_eq!(stats.draw_batches, 1);
    }

    #[test]
    fn test_accumulator_budget() {
        let mut acc = FrameStatsAccumulator::with_budget(Duration::from_millis(10));
        acc.record(FrameStats { total_us: 5_000, ..FrameStats::default() });
        acc.record(FrameStats { total_us: 15_000, ..FrameStats::default() });

        assert_eq!(acc.frames_over_budget, 1);
        assert!((acc.avg_frame_ms() - 10.0).abs() < 1e-9);
        assert!((acc.over_budget_ratio() - 0.5).abs() < 1e-9);
        assert_eq!(acc.min_frame_us, 5_000);
        assert_eq!(acc.max_frame_us, 15_000);
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = FrameStatsAccumulator::default();
        assert_eq!(acc.avg_fps(), 0.0);
        assert_eq!(acc.over_budget_ratio(), 0.0);
    }
}
