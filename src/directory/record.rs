//! Participant and display record types
//!
//! A `ParticipantRecord` is one row of the roster or results table. The
//! result-specific fields only exist after a results sync, so they live in
//! an optional `ResultsExtension` rather than as empty strings on every
//! roster row.

use serde::{Deserialize, Serialize};

use crate::protocol::TimingEvent;

/// One participant as known to the directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Full display name
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    /// Race-day age, kept as text as delivered by the registration feed
    pub age: String,
    pub gender: String,
    pub city: String,
    pub state: String,
    pub country: String,
    /// Age group / bracket name
    pub division: String,
    pub race_name: String,
    /// Registration choice, e.g. "Marathon"
    pub reg_choice: String,
    pub wave: String,
    pub team_name: String,
    pub entry_status: String,
    pub entry_type: String,
    pub entry_id: String,
    pub athlete_id: String,

    /// Result fields, present only after a results sync
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsExtension>,
}

impl ParticipantRecord {
    /// Minimal record with just a name, useful for tests and demos
    pub fn named(first: impl Into<String>, last: impl Into<String>) -> Self {
        let first = first.into();
        let last = last.into();
        Self {
            name: format!("{} {}", first, last),
            first_name: first,
            last_name: last,
            ..Default::default()
        }
    }
}

/// Result fields attached to a participant after they have a posted result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsExtension {
    pub finish_time: String,
    pub gun_time: String,
    pub pace: String,
    pub gun_pace: String,
    pub pace_unit: String,
    pub overall_rank: String,
    pub division_rank: String,
    pub penalty_time: String,
    pub time_with_penalty: String,
    pub gun_time_with_penalty: String,
    pub start_time: String,
    pub finish_timestamp: String,
}

/// A timing event joined with its participant snapshot
///
/// This is the unit the display queue stores and the live stream
/// publishes. The participant fields are a snapshot taken at enrichment
/// time; a later roster sync does not rewrite records already queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub gender: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub division: String,
    pub race_name: String,
    pub reg_choice: String,
    pub wave: String,
    pub team_name: String,

    /// Rotating encouragement message chosen at enrichment time
    pub message: String,

    /// Appliance timestamp of the read
    pub timestamp: String,
    /// Timing point the read came from
    pub location: String,
    pub lap: String,
    pub bib: String,

    /// Result fields, flattened into the payload in results mode
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsExtension>,
}

impl DisplayRecord {
    /// Join a timing event with a participant snapshot
    pub fn new(event: &TimingEvent, participant: &ParticipantRecord, message: String) -> Self {
        Self {
            name: participant.name.clone(),
            first_name: participant.first_name.clone(),
            last_name: participant.last_name.clone(),
            age: participant.age.clone(),
            gender: participant.gender.clone(),
            city: participant.city.clone(),
            state: participant.state.clone(),
            country: participant.country.clone(),
            division: participant.division.clone(),
            race_name: participant.race_name.clone(),
            reg_choice: participant.reg_choice.clone(),
            wave: participant.wave.clone(),
            team_name: participant.team_name.clone(),
            message,
            timestamp: event.time.clone(),
            location: event.location.clone(),
            lap: event.lap.clone(),
            bib: event.bib.clone(),
            results: participant.results.clone(),
        }
    }
}
