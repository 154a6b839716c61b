//! Threshold evaluators and the per-packet decision dispatcher.
//!
//! One call per inbound frame, safe from any number of threads at once:
//! parse, consult the block table, fold the packet into every enabled signal,
//! evaluate thresholds, and return the verdict. Nothing in here blocks beyond
//! a shard lock and nothing allocates on the packet path.

use log::{debug, warn};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::parser;
use crate::signals::SignalTables;
use crate::table::StateTable;

/// Admission decision for one frame. The hot path has no other return
/// channel; drops are silent toward the traffic source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Drop,
}

impl Verdict {
    pub fn is_drop(&self) -> bool {
        matches!(self, Verdict::Drop)
    }
}

/// The telemetry and mitigation engine. `S` shards of `C` entries size every
/// table; both are fixed at construction (control-plane sizing decision).
///
/// Once a source lands in the block table every later packet from it is
/// dropped before any signal work, until the control plane clears the entry.
/// Blocked traffic is deliberately not folded into the signal tables; byte
/// and count totals cover evaluated packets only.
pub struct Engine<const S: usize = 8, const C: usize = 256> {
    config: EngineConfig,
    signals: SignalTables<S, C>,
    firewall: StateTable<u32, S, C>,
    capacity_errors: AtomicU64,
    min_frame_len: AtomicU64,
    max_frame_len: AtomicU64,
    epoch: Instant,
}

impl<const S: usize, const C: usize> Engine<S, C> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            signals: SignalTables::new(),
            firewall: StateTable::new(),
            capacity_errors: AtomicU64::new(0),
            min_frame_len: AtomicU64::new(u64::MAX),
            max_frame_len: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Nanoseconds since engine construction; the single monotonic time base
    /// every timestamp in the tables uses.
    pub fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Evaluate one frame against the engine clock.
    pub fn process(&self, frame: &[u8]) -> Verdict {
        self.process_at(frame, self.now_ns())
    }

    /// Evaluate one frame with an explicit arrival timestamp. Strict order:
    /// block-table check, signal updates, exfiltration check, rate check.
    /// Both checks are inclusive of the triggering packet: the packet that
    /// reaches the threshold is itself dropped.
    pub fn process_at(&self, frame: &[u8], now_ns: u64) -> Verdict {
        let headers = match parser::parse_frame(frame) {
            Some(headers) => headers,
            // Malformed or foreign input: neutral verdict, no state touched.
            None => return Verdict::Pass,
        };
        let src = headers.src_addr;

        if self.is_blocked(src) {
            self.count_drop(src);
            return Verdict::Drop;
        }

        self.record_frame_len(frame.len() as u64);
        let readings = self
            .signals
            .observe(&headers, frame.len() as u64, now_ns, &self.config);
        if readings.table_misses > 0 {
            self.capacity_errors
                .fetch_add(readings.table_misses as u64, Ordering::Relaxed);
        }

        if let Some(count) = readings.outbound {
            if count >= self.config.exfil_threshold {
                return self.block_and_drop(src, "outbound volume", count);
            }
        }

        if let Some(count) = readings.packet_rate {
            if count >= self.config.dos_threshold {
                return self.block_and_drop(src, "packet rate", count);
            }
        }

        Verdict::Pass
    }

    fn block_and_drop(&self, src: u32, reason: &str, count: u64) -> Verdict {
        match self.firewall.set(src, 1) {
            Ok(()) => {
                warn!(
                    "blocking {}: {} threshold crossed at {}",
                    Ipv4Addr::from(src),
                    reason,
                    count
                );
                self.count_drop(src);
                Verdict::Drop
            }
            // Block table full: fail open, surface the miss.
            Err(_) => {
                self.capacity_errors.fetch_add(1, Ordering::Relaxed);
                Verdict::Pass
            }
        }
    }

    fn count_drop(&self, src: u32) {
        if self.signals.dropped.atomic_add(src, 1).is_err() {
            self.capacity_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_frame_len(&self, len: u64) {
        self.min_frame_len.fetch_min(len, Ordering::Relaxed);
        self.max_frame_len.fetch_max(len, Ordering::Relaxed);
    }

    // ---- control-plane surface ----

    /// Read access to every signal table for draining and reporting.
    pub fn signals(&self) -> &SignalTables<S, C> {
        &self.signals
    }

    pub fn is_blocked(&self, src: u32) -> bool {
        matches!(self.firewall.get(&src), Some(flag) if flag != 0)
    }

    /// Manually block a source, as the control plane would after an external
    /// decision.
    pub fn block(&self, src: u32) -> Result<(), crate::table::CapacityExceeded> {
        self.firewall.set(src, 1)
    }

    /// Clear the block flag for one source; normal evaluation resumes on its
    /// next packet.
    pub fn unblock(&self, src: u32) {
        if self.firewall.remove(&src).is_some() {
            debug!("unblocked {}", Ipv4Addr::from(src));
        }
    }

    pub fn blocked_sources(&self) -> Vec<u32> {
        self.firewall
            .snapshot()
            .into_iter()
            .filter(|(_, flag)| *flag != 0)
            .map(|(src, _)| src)
            .collect()
    }

    pub fn clear_blocks(&self) {
        self.firewall.clear();
    }

    /// Dropped-packet count for one source.
    pub fn dropped_count(&self, src: u32) -> u64 {
        self.signals.dropped.get(&src).unwrap_or(0)
    }

    /// Total packets dropped across all sources.
    pub fn dropped_total(&self) -> u64 {
        self.signals
            .dropped
            .snapshot()
            .into_iter()
            .map(|(_, count)| count)
            .sum()
    }

    /// Monotonic count of signal updates skipped because a table was full.
    /// An early warning of under-sized tables or a high-cardinality attack.
    pub fn capacity_errors(&self) -> u64 {
        self.capacity_errors.load(Ordering::Relaxed)
    }

    /// Smallest and largest frame evaluated so far, if any.
    pub fn frame_size_bounds(&self) -> Option<(u64, u64)> {
        let min = self.min_frame_len.load(Ordering::Relaxed);
        if min == u64::MAX {
            return None;
        }
        Some((min, self.max_frame_len.load(Ordering::Relaxed)))
    }
}

impl<const S: usize, const C: usize> Default for Engine<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
