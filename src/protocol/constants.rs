//! Protocol constants
//!
//! Defaults for the ChronoTrack-style line protocol spoken by timing
//! appliances. All of these are overridable through `ServerConfig`; the
//! values here match what the appliances ship with.

/// Default field separator within a protocol line
pub const FIELD_SEPARATOR: &str = "~";

/// Default line terminator
pub const LINE_TERMINATOR: &str = "\r\n";

/// Format tag expected in field 0 of every data line
pub const FORMAT_ID: &str = "CT01_33";

/// Default TCP port timing appliances connect to
pub const DEFAULT_PORT: u16 = 61611;

/// Maximum accepted line length in bytes
pub const MAX_LINE_LENGTH: usize = 1024;

/// Number of positional fields in a data line
pub const DATA_FIELD_COUNT: usize = 8;

/// Bib sentinel marking a gun-time event with no associated runner
pub const GUNTIME_SENTINEL: &str = "guntime";

/// Identity announced to the appliance during negotiation
pub const SERVER_NAME: &str = "RaceDisplay";

/// Version string announced to the appliance during negotiation
pub const SERVER_VERSION: &str = "Version 1.0 Level 2024.02";

/// Settings declared to the appliance, one line each, in order
pub const NEGOTIATION_SETTINGS: [&str; 6] = [
    "location=multi",
    "guntimes=true",
    "newlocations=true",
    "authentication=none",
    "stream-mode=push",
    "time-format=iso",
];

/// Commands issued after the settings, in order. No reply is awaited.
pub const NEGOTIATION_COMMANDS: [&str; 3] = ["geteventinfo", "getlocations", "start"];

/// Control line an appliance sends to probe liveness
pub const PING: &str = "ping";

/// Control line an appliance sends to end the session
pub const STOP: &str = "stop";

/// Prefix of acknowledgement lines (`ack<SEP><token>`)
pub const ACK: &str = "ack";
