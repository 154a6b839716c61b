//! Engine configuration and its text format.
//!
//! A single [`EngineConfig`] parameterizes the engine: thresholds, the HTTP
//! port watch list, the optional watched exfiltration destination, and the
//! set of enabled signals. The companion text format is a handful of
//! line-oriented directives parsed with a pest grammar; the control plane
//! feeds it in once at startup.

use pest::Parser;
use pest_derive::Parser;
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::signals::{SignalKind, SignalSet};

pub const DEFAULT_EXFIL_THRESHOLD: u64 = 500;
pub const DEFAULT_DOS_THRESHOLD: u64 = 1000;
pub const DEFAULT_PORT_FLOOD_THRESHOLD: u64 = 500;

#[derive(Parser)]
#[grammar = "config/grammar.pest"]
struct ConfigParser;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("syntax error in configuration: {0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("numeric value out of range: {0}")]
    ValueOutOfRange(String),
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),
}

/// Recognized engine options. One engine, parameterized; threshold variants
/// are configuration, not code copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Outbound packet count at which a source is blocked as exfiltrating.
    pub exfil_threshold: u64,
    /// Packet-rate count at which a source is blocked as flooding.
    pub dos_threshold: u64,
    /// Per-flow request count that triggers the port-flood diagnostic.
    pub port_flood_threshold: u64,
    /// TCP destination ports counted as HTTP requests.
    pub watched_ports: Vec<u16>,
    /// When set, the outbound counter only counts packets toward this
    /// address (exfiltration to one watched host); when unset it counts all
    /// traffic from the source (general outbound volume).
    pub watched_dst: Option<u32>,
    pub enabled: SignalSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exfil_threshold: DEFAULT_EXFIL_THRESHOLD,
            dos_threshold: DEFAULT_DOS_THRESHOLD,
            port_flood_threshold: DEFAULT_PORT_FLOOD_THRESHOLD,
            watched_ports: vec![80, 443],
            watched_dst: None,
            enabled: SignalSet::ALL,
        }
    }
}

/// Parse the directive text into a config, starting from defaults. Later
/// directives override earlier ones; a `signals` line replaces the enabled
/// set wholesale.
pub fn parse_engine_config(input: &str) -> Result<EngineConfig, ConfigError> {
    let pairs = ConfigParser::parse(Rule::config, input)
        .map_err(|e| ConfigError::Syntax(Box::new(e)))?;

    let mut config = EngineConfig::default();

    for pair in pairs.flatten() {
        match pair.as_rule() {
            Rule::set_line => apply_set_line(pair, &mut config)?,
            Rule::watch_ports_line => {
                let mut ports = Vec::new();
                for number in pair.into_inner() {
                    ports.push(parse_number::<u16>(number.as_str())?);
                }
                config.watched_ports = ports;
            }
            Rule::watch_dst_line => {
                let addr = pair
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().to_owned())
                    .unwrap_or_default();
                config.watched_dst = Some(parse_ipv4(&addr)?);
            }
            Rule::signals_line => {
                let mut enabled = SignalSet::EMPTY;
                for name in pair.into_inner() {
                    // Grammar only admits known names; keep jitter usable by
                    // pulling latency in with it.
                    if let Some(kind) = SignalKind::from_name(name.as_str()) {
                        enabled = enabled.with(kind);
                        if kind == SignalKind::Jitter {
                            enabled = enabled.with(SignalKind::Latency);
                        }
                    }
                }
                config.enabled = enabled;
            }
            _ => {}
        }
    }

    Ok(config)
}

fn apply_set_line(
    pair: pest::iterators::Pair<'_, Rule>,
    config: &mut EngineConfig,
) -> Result<(), ConfigError> {
    let mut inner = pair.into_inner();
    let (Some(param), Some(number)) = (inner.next(), inner.next()) else {
        return Ok(());
    };
    let value = parse_number::<u64>(number.as_str())?;
    match param.as_str() {
        "exfil_threshold" => config.exfil_threshold = value,
        "dos_threshold" => config.dos_threshold = value,
        "port_flood_threshold" => config.port_flood_threshold = value,
        _ => {}
    }
    Ok(())
}

fn parse_number<T: core::str::FromStr>(text: &str) -> Result<T, ConfigError> {
    text.parse::<T>()
        .map_err(|_| ConfigError::ValueOutOfRange(text.to_owned()))
}

fn parse_ipv4(text: &str) -> Result<u32, ConfigError> {
    let addr: Ipv4Addr = text
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(text.to_owned()))?;
    Ok(u32::from(addr))
}
