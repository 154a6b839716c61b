//! Auxiliary telemetry producers.
//!
//! Secondary data sources outside the packet hot path: TCP state-transition
//! counting per destination address, and emit-only trace lines for process
//! executions and outbound connect attempts. None of these feed back into
//! drop decisions or share state with the engine tables.

use log::info;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::table::StateTable;

/// Counts TCP state transitions per destination address, fed by whatever
/// mechanism observes the transitions (a tracing attachment, outside this
/// crate's scope).
pub struct TcpStateTracker<const S: usize = 4, const C: usize = 256> {
    transitions: StateTable<u32, S, C>,
    overflow: AtomicU64,
}

impl<const S: usize, const C: usize> TcpStateTracker<S, C> {
    pub fn new() -> Self {
        Self {
            transitions: StateTable::new(),
            overflow: AtomicU64::new(0),
        }
    }

    /// Record one state transition toward `dst_addr`.
    pub fn record(&self, dst_addr: u32) {
        if self.transitions.atomic_add(dst_addr, 1).is_err() {
            self.overflow.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn count(&self, dst_addr: u32) -> u64 {
        self.transitions.get(&dst_addr).unwrap_or(0)
    }

    pub fn snapshot(&self) -> Vec<(u32, u64)> {
        self.transitions.snapshot()
    }

    /// Transitions not recorded because the table was full.
    pub fn overflow(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }
}

impl<const S: usize, const C: usize> Default for TcpStateTracker<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit one line for a process execution.
pub fn log_process_exec(process: &str) {
    info!("process executed: {process}");
}

/// Emit one line for an outbound connect attempt.
pub fn log_connect_attempt(process: &str, pid: u32, dst_addr: u32, dst_port: u16) {
    info!(
        "process {process} (pid {pid}) connecting to {}:{dst_port}",
        Ipv4Addr::from(dst_addr)
    );
}
