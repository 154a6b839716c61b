//! Per-packet signal updaters.
//!
//! Each signal is one independently computed per-flow aggregate kept in its
//! own table. Updaters are side-effect-only: they read-or-initialize their
//! entry, fold the current packet in, and never produce a verdict. The
//! evaluators in `engine` consume the post-update counts returned from
//! [`SignalTables::observe`].

use log::warn;
use std::net::Ipv4Addr;

use crate::config::EngineConfig;
use crate::parser::ParsedHeaders;
use crate::table::{FlowKey, StateTable};

pub const DNS_PORT: u16 = 53;

/// One recognized signal. The set of enabled signals is an engine
/// configuration option; disabled signals skip their table entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SignalKind {
    Bandwidth,
    Outbound,
    PacketRate,
    Latency,
    Jitter,
    HttpRequests,
    DnsQueries,
    TopTalkers,
    ProtocolMix,
    FlowVolume,
}

impl SignalKind {
    pub const COUNT: u16 = 10;

    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::Bandwidth => "bandwidth",
            SignalKind::Outbound => "outbound",
            SignalKind::PacketRate => "packet_rate",
            SignalKind::Latency => "latency",
            SignalKind::Jitter => "jitter",
            SignalKind::HttpRequests => "http",
            SignalKind::DnsQueries => "dns",
            SignalKind::TopTalkers => "top_talkers",
            SignalKind::ProtocolMix => "protocol_mix",
            SignalKind::FlowVolume => "flow_volume",
        }
    }

    pub fn from_name(name: &str) -> Option<SignalKind> {
        Some(match name {
            "bandwidth" => SignalKind::Bandwidth,
            "outbound" => SignalKind::Outbound,
            "packet_rate" => SignalKind::PacketRate,
            "latency" => SignalKind::Latency,
            "jitter" => SignalKind::Jitter,
            "http" => SignalKind::HttpRequests,
            "dns" => SignalKind::DnsQueries,
            "top_talkers" => SignalKind::TopTalkers,
            "protocol_mix" => SignalKind::ProtocolMix,
            "flow_volume" => SignalKind::FlowVolume,
            _ => return None,
        })
    }
}

/// Bitmask of enabled signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSet(u16);

impl SignalSet {
    pub const EMPTY: SignalSet = SignalSet(0);
    pub const ALL: SignalSet = SignalSet((1 << SignalKind::COUNT) - 1);

    pub const fn with(self, kind: SignalKind) -> SignalSet {
        SignalSet(self.0 | 1 << kind as u16)
    }

    pub const fn without(self, kind: SignalKind) -> SignalSet {
        SignalSet(self.0 & !(1 << kind as u16))
    }

    pub const fn contains(&self, kind: SignalKind) -> bool {
        self.0 & (1 << kind as u16) != 0
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        SignalSet::ALL
    }
}

/// Post-update counts the threshold evaluators consume, plus the number of
/// signals skipped because their table was full.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalReadings {
    pub outbound: Option<u64>,
    pub packet_rate: Option<u64>,
    pub table_misses: u32,
}

/// One table per signal, all source-keyed except `protocol_traffic`
/// (IP protocol number) and `flow_volume` (address+port pair). `dropped` is
/// not a signal of its own; the dispatcher bumps it on every drop path.
pub struct SignalTables<const S: usize, const C: usize> {
    pub bandwidth: StateTable<u32, S, C>,
    pub outbound: StateTable<u32, S, C>,
    pub packet_rate: StateTable<u32, S, C>,
    pub last_seen: StateTable<u32, S, C>,
    pub latency: StateTable<u32, S, C>,
    pub jitter: StateTable<u32, S, C>,
    pub http_requests: StateTable<u32, S, C>,
    pub dns_queries: StateTable<u32, S, C>,
    pub top_talkers: StateTable<u32, S, C>,
    pub protocol_traffic: StateTable<u8, S, C>,
    pub flow_volume: StateTable<FlowKey, S, C>,
    pub dropped: StateTable<u32, S, C>,
}

impl<const S: usize, const C: usize> SignalTables<S, C> {
    pub fn new() -> Self {
        Self {
            bandwidth: StateTable::new(),
            outbound: StateTable::new(),
            packet_rate: StateTable::new(),
            last_seen: StateTable::new(),
            latency: StateTable::new(),
            jitter: StateTable::new(),
            http_requests: StateTable::new(),
            dns_queries: StateTable::new(),
            top_talkers: StateTable::new(),
            protocol_traffic: StateTable::new(),
            flow_volume: StateTable::new(),
            dropped: StateTable::new(),
        }
    }

    /// Fold one parsed packet into every enabled signal, in fixed order.
    ///
    /// A full table skips that one signal for that one packet and bumps
    /// `table_misses`; nothing here aborts packet processing.
    pub fn observe(
        &self,
        headers: &ParsedHeaders,
        frame_len: u64,
        now_ns: u64,
        config: &EngineConfig,
    ) -> SignalReadings {
        let src = headers.src_addr;
        let enabled = config.enabled;
        let mut readings = SignalReadings::default();

        if enabled.contains(SignalKind::Bandwidth)
            && self.bandwidth.atomic_add(src, frame_len).is_err()
        {
            readings.table_misses += 1;
        }

        if enabled.contains(SignalKind::Outbound) {
            // Either general outbound volume, or exfiltration toward one
            // watched destination; the two semantics are an explicit config
            // choice, never merged.
            let counted = match config.watched_dst {
                Some(dst) => headers.dst_addr == dst,
                None => true,
            };
            if counted {
                match self.outbound.atomic_add(src, 1) {
                    Ok(count) => readings.outbound = Some(count),
                    Err(_) => readings.table_misses += 1,
                }
            }
        }

        if enabled.contains(SignalKind::PacketRate) {
            match self.packet_rate.atomic_add(src, 1) {
                Ok(count) => readings.packet_rate = Some(count),
                Err(_) => readings.table_misses += 1,
            }
        }

        if enabled.contains(SignalKind::Latency) {
            self.update_latency(src, now_ns, enabled, &mut readings.table_misses);
        }

        if enabled.contains(SignalKind::HttpRequests)
            && headers.is_tcp()
            && headers
                .dst_port
                .is_some_and(|port| config.watched_ports.contains(&port))
            && self.http_requests.atomic_add(src, 1).is_err()
        {
            readings.table_misses += 1;
        }

        if enabled.contains(SignalKind::DnsQueries)
            && headers.is_udp()
            && headers.dst_port == Some(DNS_PORT)
            && self.dns_queries.atomic_add(src, 1).is_err()
        {
            readings.table_misses += 1;
        }

        if enabled.contains(SignalKind::TopTalkers)
            && self.top_talkers.atomic_add(src, frame_len).is_err()
        {
            readings.table_misses += 1;
        }

        if enabled.contains(SignalKind::ProtocolMix)
            && self
                .protocol_traffic
                .atomic_add(headers.protocol, frame_len)
                .is_err()
        {
            readings.table_misses += 1;
        }

        if enabled.contains(SignalKind::FlowVolume) {
            self.update_flow_volume(headers, config, &mut readings.table_misses);
        }

        readings
    }

    /// Latency is the gap between consecutive packets from a source; jitter
    /// is the magnitude of change between consecutive latencies. The previous
    /// latency must be read before it is overwritten.
    fn update_latency(&self, src: u32, now_ns: u64, enabled: SignalSet, misses: &mut u32) {
        if let Some(t_prev) = self.last_seen.get(&src) {
            let new_latency = now_ns.saturating_sub(t_prev);
            if enabled.contains(SignalKind::Jitter) {
                if let Some(prev_latency) = self.latency.get(&src) {
                    if self
                        .jitter
                        .set(src, new_latency.abs_diff(prev_latency))
                        .is_err()
                    {
                        *misses += 1;
                    }
                }
            }
            if self.latency.set(src, new_latency).is_err() {
                *misses += 1;
            }
        }
        if self.last_seen.set(src, now_ns).is_err() {
            *misses += 1;
        }
    }

    /// Per-flow request counting for TCP/UDP, with a one-shot port-flood
    /// diagnostic when a flow crosses the configured volume. Alert only; the
    /// verdict is unaffected.
    fn update_flow_volume(&self, headers: &ParsedHeaders, config: &EngineConfig, misses: &mut u32) {
        let (Some(src_port), Some(dst_port)) = (headers.src_port, headers.dst_port) else {
            return;
        };
        let key = FlowKey {
            src: headers.src_addr,
            dst: headers.dst_addr,
            src_port,
            dst_port,
        };
        match self.flow_volume.atomic_add(key, 1) {
            Ok(count) => {
                if count == config.port_flood_threshold {
                    warn!(
                        "port flood: {} requests from {}:{} to {}:{}",
                        count,
                        Ipv4Addr::from(key.src),
                        key.src_port,
                        Ipv4Addr::from(key.dst),
                        key.dst_port,
                    );
                }
            }
            Err(_) => *misses += 1,
        }
    }
}

impl<const S: usize, const C: usize> Default for SignalTables<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
