//! Timing line parser
//!
//! A data line has eight positional fields joined by the field separator:
//!
//! ```text
//! FORMAT~SEQUENCE~LOCATION~BIB~TIME~GATOR~TAGCODE~LAP
//! CT01_33~1~start~9478~14:02:15.31~0~0F2A38~1
//! ```
//!
//! Parsing is a pure transformation. A line with fewer than eight fields,
//! or whose format tag does not match, yields no event rather than an
//! error: the appliance interleaves data lines with status chatter, and a
//! malformed line must never take down the session.

use serde::{Deserialize, Serialize};

use super::constants::{DATA_FIELD_COUNT, GUNTIME_SENTINEL};

/// One tag-detection event as reported by the timing appliance
///
/// All fields are kept as received; the timestamp in particular is opaque
/// pass-through (format depends on the appliance's `time-format` setting).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEvent {
    /// Format tag (field 0), always equal to the configured format id
    pub format_id: String,
    /// Appliance-assigned sequence number, kept as text
    pub sequence: String,
    /// Timing point name, e.g. "start" or "finish"
    pub location: String,
    /// Raw bib token; may be the guntime sentinel
    pub bib: String,
    /// Appliance-local timestamp, opaque to this crate
    pub time: String,
    /// Gator (reader channel) field, pass-through
    pub gator: String,
    /// Tag code, pass-through
    pub tagcode: String,
    /// Lap counter, pass-through
    pub lap: String,
}

impl TimingEvent {
    /// Whether this event is a gun-time marker rather than a runner read
    pub fn is_guntime(&self) -> bool {
        self.bib == GUNTIME_SENTINEL
    }
}

/// Parse one protocol line into a timing event
///
/// Returns `None` for anything that is not a well-formed data line with
/// the expected format tag. Never panics.
pub fn parse_line(line: &str, separator: &str, format_id: &str) -> Option<TimingEvent> {
    let fields: Vec<&str> = line.split(separator).collect();

    if fields.len() < DATA_FIELD_COUNT || fields[0] != format_id {
        return None;
    }

    Some(TimingEvent {
        format_id: fields[0].to_owned(),
        sequence: fields[1].to_owned(),
        location: fields[2].to_owned(),
        bib: fields[3].to_owned(),
        time: fields[4].to_owned(),
        gator: fields[5].to_owned(),
        tagcode: fields[6].to_owned(),
        lap: fields[7].to_owned(),
    })
}
