//! flowsentry demo binary
//!
//! Builds an engine from a small text configuration, runs synthetic benign
//! traffic followed by a flood, and prints the verdict summary and table
//! snapshots an external control plane would drain.

use std::net::Ipv4Addr;

use flowsentry::{frame, parse_engine_config, Engine, Verdict};

const DEMO_CONFIG: &str = "\
# demo thresholds, deliberately low so the flood trips quickly
set exfil_threshold 200
set dos_threshold 100
watch ports 80 443
";

fn main() {
    env_logger::init();

    let config = match parse_engine_config(DEMO_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bad demo configuration: {e}");
            return;
        }
    };
    let engine: Engine = Engine::with_config(config);

    let clients: [[u8; 4]; 3] = [[10, 0, 0, 1], [10, 0, 0, 2], [10, 0, 0, 3]];
    let server = [192, 168, 1, 1];

    println!("flowsentry demo");
    println!("===============\n");

    // Benign phase: a few HTTP requests and DNS lookups per client.
    let mut passed = 0u32;
    for client in clients {
        for i in 0..20 {
            let http = frame::tcp_frame(client, server, 40_000 + i, 80, b"GET / HTTP/1.1\r\n");
            if engine.process(&http) == Verdict::Pass {
                passed += 1;
            }
            let dns = frame::udp_frame(client, server, 40_000 + i, 53, b"query");
            if engine.process(&dns) == Verdict::Pass {
                passed += 1;
            }
        }
    }
    println!("benign phase: {passed} packets passed");

    // Flood phase: one attacker hammers the server until blocked.
    let attacker = [203, 0, 113, 7];
    let mut dropped = 0u32;
    for i in 0..300u16 {
        let packet = frame::tcp_frame(attacker, server, 50_000 + i, 80, b"x");
        if engine.process(&packet).is_drop() {
            dropped += 1;
        }
    }
    println!("flood phase: {dropped} of 300 attacker packets dropped\n");

    println!("blocked sources:");
    for src in engine.blocked_sources() {
        println!(
            "  {} ({} drops)",
            Ipv4Addr::from(src),
            engine.dropped_count(src)
        );
    }

    println!("\ntop talkers (bytes):");
    let mut talkers = engine.signals().top_talkers.snapshot();
    talkers.sort_by(|a, b| b.1.cmp(&a.1));
    for (src, bytes) in talkers.iter().take(5) {
        println!("  {:<15} {bytes}", Ipv4Addr::from(*src).to_string());
    }

    println!("\nprotocol mix (bytes):");
    for (protocol, bytes) in engine.signals().protocol_traffic.snapshot() {
        println!("  proto {protocol:<3} {bytes}");
    }

    if let Some((min, max)) = engine.frame_size_bounds() {
        println!("\nframe sizes: min {min}, max {max}");
    }
    println!("dropped total: {}", engine.dropped_total());
    println!("capacity errors: {}", engine.capacity_errors());
}
