//! # Simulated Upstream
//!
//! In-process stand-in for the remote asset service, used by the soak
//! binary and integration tests.
//!
//! ## Features
//!
//! - Packet loss (the reply never arrives; the request times out)
//! - Latency with jitter
//! - Truncated payloads (exercises cache corruption detection)
//!
//! All randomness comes from a seeded `ChaCha8Rng`, so a run is
//! reproducible from its seed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use meridian_shared::{AssetId, AssetType, Host};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::clock::Clock;
use crate::error::AssetError;
use crate::transport::{AssetMessage, InboundMessage, MessageTransport};

/// Network conditions for simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkConditions {
    /// Base latency in milliseconds.
    pub base_latency_ms: u32,
    /// Jitter (variance) in milliseconds.
    pub jitter_ms: u32,
    /// Reply loss percentage (0-100).
    pub loss_percent: u8,
    /// Truncated payload percentage (0-100).
    pub truncate_percent: u8,
}

impl NetworkConditions {
    /// Perfect network conditions (LAN).
    pub const PERFECT: Self = Self { base_latency_ms: 1, jitter_ms: 0, loss_percent: 0, truncate_percent: 0 };

    /// Average network conditions (cable).
    pub const AVERAGE: Self = Self { base_latency_ms: 50, jitter_ms: 20, loss_percent: 1, truncate_percent: 0 };

    /// Poor network conditions (mobile/wifi) with the odd mangled payload.
    pub const POOR: Self = Self { base_latency_ms: 150, jitter_ms: 80, loss_percent: 5, truncate_percent: 1 };

    fn latency(&self, rng: &mut ChaCha8Rng) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            i64::from(rng.gen_range(0..self.jitter_ms * 2)) - i64::from(self.jitter_ms)
        } else {
            0
        };
        let ms = (i64::from(self.base_latency_ms) + jitter).max(0).unsigned_abs();
        Duration::from_millis(ms)
    }

    fn roll(percent: u8, rng: &mut ChaCha8Rng) -> bool {
        rng.gen_range(0..100u8) < percent
    }
}

impl Default for NetworkConditions {
    fn default() -> Self {
        Self::AVERAGE
    }
}

/// Simulated upstream statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpstreamStats {
    /// Messages received from the coordinator.
    pub received: u64,
    /// Replies dropped by simulated loss.
    pub dropped: u64,
    /// Replies delivered.
    pub delivered: u64,
    /// Payloads truncated in transit.
    pub truncated: u64,
}

#[derive(Debug)]
struct UpstreamState {
    reply_to: Option<Sender<InboundMessage>>,
    database: HashMap<(AssetId, AssetType), Arc<[u8]>>,
    in_flight: Vec<(Instant, InboundMessage)>,
    conditions: NetworkConditions,
    rng: ChaCha8Rng,
    stats: UpstreamStats,
}

/// Simulated asset service. Clones share state: hand one clone to the
/// coordinator as its transport and keep another to [`pump`](Self::pump).
///
/// ```text
/// let sim = SimulatedUpstream::new(conditions, seed, clock);
/// let storage = AssetStorage::new(config, cache, sim.clone());
/// sim.connect(storage.inbound_sender());
/// ```
#[derive(Clone)]
pub struct SimulatedUpstream {
    state: Rc<RefCell<UpstreamState>>,
    clock: Rc<dyn Clock>,
}

impl SimulatedUpstream {
    /// Creates an unconnected upstream.
    #[must_use]
    pub fn new(conditions: NetworkConditions, seed: u64, clock: Rc<dyn Clock>) -> Self {
        Self {
            state: Rc::new(RefCell::new(UpstreamState {
                reply_to: None,
                database: HashMap::new(),
                in_flight: Vec::new(),
                conditions,
                rng: ChaCha8Rng::seed_from_u64(seed),
                stats: UpstreamStats::default(),
            })),
            clock,
        }
    }

    /// Routes replies to a coordinator's inbound channel.
    pub fn connect(&self, reply_to: Sender<InboundMessage>) {
        self.state.borrow_mut().reply_to = Some(reply_to);
    }

    /// Seeds the service database.
    pub fn insert(&self, id: AssetId, asset_type: AssetType, data: &[u8]) {
        self.state.borrow_mut().database.insert((id, asset_type), Arc::from(data));
    }

    /// True if the service holds the asset.
    #[must_use]
    pub fn contains(&self, id: AssetId, asset_type: AssetType) -> bool {
        self.state.borrow().database.contains_key(&(id, asset_type))
    }

    /// Delivers every reply whose latency has elapsed. Returns the count.
    ///
    /// Replies stay in transit while no coordinator is connected.
    pub fn pump(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        let Some(reply_to) = state.reply_to.clone() else {
            return 0;
        };

        let (due, waiting): (Vec<_>, Vec<_>) = state.in_flight.drain(..).partition(|(at, _)| *at <= now);
        state.in_flight = waiting;
        drop(state);

        let mut delivered = 0;
        for (_, message) in due {
            // Coordinator gone: nothing left to deliver to.
            if reply_to.send(message).is_err() {
                break;
            }
            delivered += 1;
        }
        self.state.borrow_mut().stats.delivered += delivered as u64;
        delivered
    }

    /// Replies still in transit.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight.len()
    }

    /// Returns statistics.
    #[must_use]
    pub fn stats(&self) -> UpstreamStats {
        self.state.borrow().stats
    }
}

impl MessageTransport for SimulatedUpstream {
    fn send_reliable(&mut self, host: Host, message: AssetMessage) {
        trace!(%host, id = %message.asset_id(), "Simulated upstream received message");
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state.stats.received += 1;

        if NetworkConditions::roll(state.conditions.loss_percent, &mut state.rng) {
            state.stats.dropped += 1;
            return;
        }

        let reply = match message {
            AssetMessage::Fetch { id, asset_type, .. } => {
                let result = state
                    .database
                    .get(&(id, asset_type))
                    .cloned()
                    .ok_or(AssetError::NotInDatabase);
                let declared_size = result.as_ref().ok().map(|b| b.len());
                let result = match result {
                    Ok(bytes)
                        if bytes.len() > 1
                            && NetworkConditions::roll(state.conditions.truncate_percent, &mut state.rng) =>
                    {
                        state.stats.truncated += 1;
                        Ok(Arc::from(&bytes[..bytes.len() / 2]))
                    }
                    other => other,
                };
                InboundMessage::DownloadComplete { id, asset_type, result, declared_size }
            }
            AssetMessage::Store { id, asset_type, data, temp, .. } => {
                if !temp {
                    state.database.insert((id, asset_type), data);
                }
                InboundMessage::UploadComplete { id, asset_type, result: Ok(()) }
            }
        };

        let deliver_at = now + state.conditions.latency(&mut state.rng);
        state.in_flight.push((deliver_at, reply));
    }
}
