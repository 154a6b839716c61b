//! flowsentry — per-packet network telemetry and anomaly mitigation.
//!
//! For every inbound frame the engine parses L2-L4 headers, folds the packet
//! into per-source and per-flow aggregate tables, evaluates fixed thresholds,
//! and returns an admit/drop verdict. Malformed input fails open; blocked
//! sources stay blocked until the control plane clears them.

pub mod config;
pub mod engine;
pub mod frame;
pub mod parser;
pub mod probes;
pub mod signals;
pub mod table;

pub use config::{parse_engine_config, ConfigError, EngineConfig};
pub use engine::{Engine, Verdict};
pub use parser::{parse_frame, ParsedHeaders};
pub use signals::{SignalKind, SignalSet, SignalTables};
pub use table::{CapacityExceeded, FlowKey, StateTable};
