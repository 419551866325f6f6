//! Participant directory
//!
//! Maps bib numbers to participant records. The backing table is replaced
//! wholesale by an external roster/results sync; a mode flag selects which
//! table reads resolve against. In pre-race mode, reads for unknown bibs
//! auto-provision a deterministic synthesized participant so the display
//! never shows a blank card mid-race.

pub mod record;
pub mod store;
pub mod synth;

pub use record::{DisplayRecord, ParticipantRecord, ResultsExtension};
pub use store::{DirectoryMode, ParticipantDirectory};
pub use synth::synthesize_participant;
