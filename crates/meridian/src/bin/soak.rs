//! # MERIDIAN Soak Run
//!
//! Headless run of the full frame loop against a lossy simulated upstream.
//! A request that vanishes must still complete. A scene that keeps moving
//! must still cull.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use meridian::assets::{
    AssetError, AssetStorage, ManualClock, MemoryCache, NetworkConditions, RequestKind,
    SimulatedUpstream, StoreOptions,
};
use meridian::shared::{Aabb, AssetId, AssetType, Vec3};
use meridian::spatial::{
    Camera, CameraSlot, Face, ObjectId, PartitionType, Perspective, SceneObject, ScriptedOcclusion,
    TextureId,
};
use meridian::{logging, ViewerConfig, ViewerLoop};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};

/// Simulated frame length on the asset clock.
const SIM_FRAME: Duration = Duration::from_micros(16_666);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Network {
    Perfect,
    Average,
    Poor,
}

impl Network {
    const fn conditions(self) -> NetworkConditions {
        match self {
            Self::Perfect => NetworkConditions::PERFECT,
            Self::Average => NetworkConditions::AVERAGE,
            Self::Poor => NetworkConditions::POOR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Soak the MERIDIAN frame loop against a simulated upstream")]
struct Args {
    /// Viewer config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to run
    #[arg(long, default_value_t = 3_600)]
    frames: u64,

    /// Scene objects
    #[arg(long, default_value_t = 5_000)]
    objects: u32,

    /// Distinct assets held by the upstream
    #[arg(long, default_value_t = 2_000)]
    assets: u32,

    /// Asset requests per frame
    #[arg(long, default_value_t = 4)]
    requests_per_frame: u32,

    /// Network quality
    #[arg(long, value_enum, default_value_t = Network::Poor)]
    network: Network,

    /// Request timeout in seconds of simulated time
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Default)]
struct Tally {
    issued: u64,
    completed: u64,
    ok: u64,
    failures: BTreeMap<&'static str, u64>,
}

impl Tally {
    fn record(&mut self, result: Result<(), &AssetError>) {
        self.completed += 1;
        match result {
            Ok(()) => self.ok += 1,
            Err(err) => *self.failures.entry(AssetError::code_string(err.code())).or_default() += 1,
        }
    }
}

fn main() -> ExitCode {
    logging::init("warn");
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match ViewerConfig::from_path(path) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, "Failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => ViewerConfig::default(),
    };
    config.assets.request_timeout_secs = args.timeout_secs.max(1);
    if config.assets.upstream.is_none() {
        config.assets.upstream = "127.0.0.1:12043".parse().ok();
    }

    print_header(&args);

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let clock = Rc::new(ManualClock::new());
    let upstream = SimulatedUpstream::new(args.network.conditions(), args.seed, clock.clone());
    let assets = AssetStorage::new(config.assets.clone(), MemoryCache::new(), upstream.clone())
        .with_clock(clock.clone());
    upstream.connect(assets.inbound_sender());

    let catalog: Vec<(AssetId, AssetType)> = (0..args.assets.max(1))
        .map(|i| {
            let asset_type = if i % 4 == 0 { AssetType::Mesh } else { AssetType::Texture };
            (AssetId::from_u128(u128::from(i) + 1), asset_type)
        })
        .collect();
    for &(id, asset_type) in &catalog {
        let size = rng.gen_range(16..4096);
        upstream.insert(id, asset_type, &vec![0xA5; size]);
    }

    let mut viewer = ViewerLoop::new(
        &config,
        assets,
        ScriptedOcclusion::new(config.spatial.max_occlusion_queries),
    );
    populate(&mut viewer, &mut rng, args.objects);

    let tally = Rc::new(RefCell::new(Tally::default()));
    let start = Instant::now();
    let mut last_progress = 0;

    for frame in 0..args.frames {
        issue_requests(&viewer, &mut rng, &catalog, &tally, args.requests_per_frame);
        churn(&mut viewer, &mut rng, args.objects);

        clock.advance(SIM_FRAME);
        upstream.pump();

        let camera = orbit_camera(frame);
        viewer.tick(&[camera], |_, _| {});

        let progress = frame * 100 / args.frames.max(1);
        if progress > last_progress && progress % 10 == 0 {
            info!(progress, frame, "Soak progress");
            last_progress = progress;
        }
    }

    // Let every lost reply run into its timeout.
    let drain_frames = config.assets.request_timeout_secs * 60 + 60;
    let camera = orbit_camera(args.frames);
    for _ in 0..drain_frames {
        clock.advance(SIM_FRAME);
        upstream.pump();
        viewer.tick(&[camera], |_, _| {});
    }

    let elapsed = start.elapsed();
    let tally = tally.borrow();
    print_report(&viewer, &upstream, &tally, elapsed);

    let exactly_once = tally.completed == tally.issued
        && RequestKind::ALL.iter().all(|&kind| viewer.assets().pending_count(kind) == 0);
    print_verdict(exactly_once);

    if exactly_once {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn populate(viewer: &mut ViewerLoop<ScriptedOcclusion>, rng: &mut ChaCha8Rng, count: u32) {
    for id in 0..count {
        let partition_type = PartitionType::ALL[rng.gen_range(0..PartitionType::ALL.len())];
        let object = random_object(rng, id);
        if let Err(err) = viewer.scene_mut().put(partition_type, object) {
            error!(%err, "Failed to place object");
        }
    }
}

fn random_object(rng: &mut ChaCha8Rng, id: u32) -> SceneObject {
    let center = Vec3::new(rng.gen_range(0.0..512.0), rng.gen_range(0.0..64.0), rng.gen_range(0.0..512.0));
    let half = Vec3::splat(rng.gen_range(0.25..4.0));
    let mut face = Face::new(Some(TextureId(rng.gen_range(0..64))), 24, 36);
    if rng.gen_bool(0.1) {
        face = face.with_alpha();
    } else if rng.gen_bool(0.05) {
        face = face.with_fullbright();
    }
    SceneObject::new(ObjectId(id), Aabb::from_center_half_extents(center, half)).with_face(face)
}

/// Moves a handful of objects each frame.
fn churn(viewer: &mut ViewerLoop<ScriptedOcclusion>, rng: &mut ChaCha8Rng, count: u32) {
    if count == 0 {
        return;
    }
    for _ in 0..8 {
        let id = ObjectId(rng.gen_range(0..count));
        let center = Vec3::new(rng.gen_range(0.0..512.0), rng.gen_range(0.0..64.0), rng.gen_range(0.0..512.0));
        let extents = Aabb::from_center_half_extents(center, Vec3::splat(1.0));
        // Objects that failed to place on startup are simply absent.
        viewer.scene_mut().move_object(id, extents).ok();
    }
}

fn issue_requests(
    viewer: &ViewerLoop<ScriptedOcclusion>,
    rng: &mut ChaCha8Rng,
    catalog: &[(AssetId, AssetType)],
    tally: &Rc<RefCell<Tally>>,
    per_frame: u32,
) {
    let assets = viewer.assets();
    for _ in 0..per_frame {
        tally.borrow_mut().issued += 1;
        let roll = rng.gen_range(0..100u32);

        if roll < 2 {
            // Unknown asset: upstream answers not-in-database.
            let id = AssetId::from_u128(u128::from(rng.gen::<u64>()) << 64);
            let tally = Rc::clone(tally);
            assets.get_asset_data(id, AssetType::Texture, false, move |reply| {
                tally.borrow_mut().record(reply.result.as_ref().map(|_| ()));
            });
        } else if roll < 7 {
            let id = AssetId::from_u128((u128::from(rng.gen::<u64>()) << 64) | 1);
            let data = vec![0x5A; rng.gen_range(1..2048)];
            let tally = Rc::clone(tally);
            assets.store_asset_data(
                id,
                AssetType::Texture,
                &data,
                StoreOptions::default(),
                Some(Box::new(move |reply| {
                    tally.borrow_mut().record(reply.result.as_ref().map(|_| ()));
                })),
            );
        } else {
            let (id, asset_type) = catalog[rng.gen_range(0..catalog.len())];
            if roll == 99 {
                assets.mark_asset_toxic(id);
            }
            let tally = Rc::clone(tally);
            assets.get_asset_data(id, asset_type, roll < 20, move |reply| {
                tally.borrow_mut().record(reply.result.as_ref().map(|_| ()));
            });
        }
    }
}

fn orbit_camera(frame: u64) -> Camera {
    let angle = (frame % 3_600) as f32 / 3_600.0 * std::f32::consts::TAU;
    let center = Vec3::new(256.0, 32.0, 256.0);
    let eye = center + Vec3::new(angle.cos() * 200.0, 40.0, angle.sin() * 200.0);
    Camera::look_at(CameraSlot::World, eye, center, Perspective::default())
}

fn print_header(args: &Args) {
    let conditions = args.network.conditions();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║    MERIDIAN SOAK RUN                                             ║");
    println!("║    Every request completes. Every frame culls.                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Frames:             {}", args.frames);
    println!("│ Scene Objects:      {}", args.objects);
    println!("│ Upstream Assets:    {}", args.assets);
    println!("│ Requests / Frame:   {}", args.requests_per_frame);
    println!(
        "│ Network:            {:?} ({}ms ±{}ms, {}% loss, {}% truncated)",
        args.network,
        conditions.base_latency_ms,
        conditions.jitter_ms,
        conditions.loss_percent,
        conditions.truncate_percent
    );
    println!("│ Request Timeout:    {}s", args.timeout_secs);
    println!("│ Seed:               {}", args.seed);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
}

fn print_report(
    viewer: &ViewerLoop<ScriptedOcclusion>,
    upstream: &SimulatedUpstream,
    tally: &Tally,
    elapsed: Duration,
) {
    let storage = viewer.assets().stats();
    let network = upstream.stats();
    let occlusion = viewer.occlusion().stats();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                       SOAK RUN RESULTS                           ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ REQUESTS ──────────────────────────────────────────────────────┐");
    println!("│ Issued:             {}", tally.issued);
    println!("│ Completed:          {}", tally.completed);
    println!("│ Succeeded:          {}", tally.ok);
    for (label, count) in &tally.failures {
        println!("│ {label:<19} {count}");
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ COORDINATOR ───────────────────────────────────────────────────┐");
    println!("│ Local Hits:         {}", storage.local_hits);
    println!("│ Fetches Sent:       {}", storage.fetches_sent);
    println!("│ Stores Sent:        {}", storage.stores_sent);
    println!("│ Timeouts:           {}", storage.timeouts);
    println!("│ Toxic Rejections:   {}", storage.toxic_rejections);
    println!("│ Corruptions:        {}", storage.corruptions);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ UPSTREAM ──────────────────────────────────────────────────────┐");
    println!("│ Received:           {}", network.received);
    println!("│ Dropped:            {}", network.dropped);
    println!("│ Delivered:          {}", network.delivered);
    println!("│ Truncated:          {}", network.truncated);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ OCCLUSION ─────────────────────────────────────────────────────┐");
    println!("│ Queries Issued:     {}", occlusion.issued);
    println!("│ Exhausted:          {}", occlusion.exhausted);
    println!("│ Answered Visible:   {}", occlusion.answered_visible);
    println!("│ Answered Occluded:  {}", occlusion.answered_occluded);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    viewer.stats().print_summary();
    println!();
    println!("Wall time: {:.2}s", elapsed.as_secs_f64());
    println!();
}

fn print_verdict(exactly_once: bool) {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    if exactly_once {
        println!("║  ✓ EVERY REQUEST COMPLETED EXACTLY ONCE                          ║");
    } else {
        println!("║  ✗ REQUESTS LOST OR COMPLETED TWICE                              ║");
    }
    println!("╚══════════════════════════════════════════════════════════════════╝");
}
