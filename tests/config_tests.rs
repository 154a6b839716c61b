//! Configuration text format tests.

use flowsentry::signals::{SignalKind, SignalSet};
use flowsentry::{parse_engine_config, ConfigError, EngineConfig};

#[test]
fn empty_input_yields_defaults() {
    let config = parse_engine_config("").expect("empty input is valid");
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.exfil_threshold, 500);
    assert_eq!(config.dos_threshold, 1000);
    assert_eq!(config.port_flood_threshold, 500);
    assert_eq!(config.watched_ports, vec![80, 443]);
    assert_eq!(config.watched_dst, None);
    assert_eq!(config.enabled, SignalSet::ALL);
}

#[test]
fn full_configuration_parses() {
    let input = "\
# deployment profile: edge node
set exfil_threshold 10
set dos_threshold 2000
set port_flood_threshold 300
watch ports 80 443 8080
watch dst 192.168.0.1
signals bandwidth outbound packet_rate http
";
    let config = parse_engine_config(input).expect("valid configuration");

    assert_eq!(config.exfil_threshold, 10);
    assert_eq!(config.dos_threshold, 2000);
    assert_eq!(config.port_flood_threshold, 300);
    assert_eq!(config.watched_ports, vec![80, 443, 8080]);
    assert_eq!(config.watched_dst, Some(u32::from_be_bytes([192, 168, 0, 1])));

    assert!(config.enabled.contains(SignalKind::Bandwidth));
    assert!(config.enabled.contains(SignalKind::Outbound));
    assert!(config.enabled.contains(SignalKind::PacketRate));
    assert!(config.enabled.contains(SignalKind::HttpRequests));
    assert!(!config.enabled.contains(SignalKind::DnsQueries));
    assert!(!config.enabled.contains(SignalKind::Latency));
    assert!(!config.enabled.contains(SignalKind::TopTalkers));
}

#[test]
fn later_directives_override_earlier_ones() {
    let input = "set dos_threshold 100\nset dos_threshold 900\n";
    let config = parse_engine_config(input).expect("valid configuration");
    assert_eq!(config.dos_threshold, 900);
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let input = "\n# nothing but comments here\n\n# and blank lines\n\nset dos_threshold 42\n";
    let config = parse_engine_config(input).expect("valid configuration");
    assert_eq!(config.dos_threshold, 42);
}

#[test]
fn selecting_jitter_pulls_latency_in() {
    let config = parse_engine_config("signals jitter\n").expect("valid configuration");
    assert!(config.enabled.contains(SignalKind::Jitter));
    assert!(config.enabled.contains(SignalKind::Latency));
    assert!(!config.enabled.contains(SignalKind::Bandwidth));
}

#[test]
fn unknown_directive_is_a_syntax_error() {
    let result = parse_engine_config("set unknown_knob 5\n");
    assert!(matches!(result, Err(ConfigError::Syntax(_))));
}

#[test]
fn unknown_signal_name_is_a_syntax_error() {
    let result = parse_engine_config("signals telepathy\n");
    assert!(matches!(result, Err(ConfigError::Syntax(_))));
}

#[test]
fn port_out_of_range_is_rejected() {
    let result = parse_engine_config("watch ports 80 70000\n");
    assert!(matches!(result, Err(ConfigError::ValueOutOfRange(_))));
}

#[test]
fn address_octet_out_of_range_is_rejected() {
    let result = parse_engine_config("watch dst 300.0.0.1\n");
    assert!(matches!(result, Err(ConfigError::InvalidAddress(_))));
}

#[test]
fn threshold_overflowing_u64_is_rejected() {
    let result = parse_engine_config("set dos_threshold 99999999999999999999999\n");
    assert!(matches!(result, Err(ConfigError::ValueOutOfRange(_))));
}

#[test]
fn signal_set_with_and_without_round_trip() {
    let set = SignalSet::EMPTY
        .with(SignalKind::Bandwidth)
        .with(SignalKind::DnsQueries);
    assert!(set.contains(SignalKind::Bandwidth));
    assert!(set.contains(SignalKind::DnsQueries));
    assert!(!set.contains(SignalKind::Jitter));

    let set = set.without(SignalKind::Bandwidth);
    assert!(!set.contains(SignalKind::Bandwidth));
    assert!(set.contains(SignalKind::DnsQueries));
}
