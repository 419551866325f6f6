//! Participant directory
//!
//! The directory owns the roster and results tables and the mode flag
//! selecting which table reads resolve against. External sync collaborators
//! replace a table wholesale; sessions only read (and, in pre-race mode,
//! auto-provision).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::RwLock;

use super::record::ParticipantRecord;
use super::synth::synthesize_participant;

/// Which backing table lookups resolve against
///
/// `Results` reads the results table; every other mode reads the roster.
/// Auto-provisioning of unknown bibs happens in `PreRace` mode only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryMode {
    /// No mode selected yet (process start)
    Unset,
    /// Pre-race roster with auto-provisioning of unknown bibs
    PreRace,
    /// Post-finish results table
    Results,
    /// Test mode: roster table, no auto-provisioning
    Test,
}

impl DirectoryMode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => DirectoryMode::PreRace,
            2 => DirectoryMode::Results,
            3 => DirectoryMode::Test,
            _ => DirectoryMode::Unset,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            DirectoryMode::Unset => 0,
            DirectoryMode::PreRace => 1,
            DirectoryMode::Results => 2,
            DirectoryMode::Test => 3,
        }
    }

    /// Mode name as used by the surrounding system's API payloads
    pub fn as_str(self) -> &'static str {
        match self {
            DirectoryMode::Unset => "unset",
            DirectoryMode::PreRace => "pre-race",
            DirectoryMode::Results => "results",
            DirectoryMode::Test => "test",
        }
    }
}

const DEFAULT_RACE_NAME: &str = "ChronoTrack Live Event";

/// Mutable, swappable mapping from bib to participant record
pub struct ParticipantDirectory {
    roster: RwLock<HashMap<String, ParticipantRecord>>,
    results: RwLock<HashMap<String, ParticipantRecord>>,
    mode: AtomicU8,
    /// Event name stamped onto synthesized participants
    race_name: RwLock<Option<String>>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self {
            roster: RwLock::new(HashMap::new()),
            results: RwLock::new(HashMap::new()),
            mode: AtomicU8::new(DirectoryMode::Unset.as_u8()),
            race_name: RwLock::new(None),
        }
    }

    /// Current mode (plain atomic read)
    pub fn mode(&self) -> DirectoryMode {
        DirectoryMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    /// Switch mode (plain atomic write)
    pub fn set_mode(&self, mode: DirectoryMode) {
        self.mode.store(mode.as_u8(), Ordering::Relaxed);
        tracing::info!(mode = mode.as_str(), "Directory mode set");
    }

    /// Set the event name used for synthesized participants
    pub async fn set_race_name(&self, name: impl Into<String>) {
        *self.race_name.write().await = Some(name.into());
    }

    pub async fn race_name(&self) -> Option<String> {
        self.race_name.read().await.clone()
    }

    fn table_for(&self, mode: DirectoryMode) -> &RwLock<HashMap<String, ParticipantRecord>> {
        match mode {
            DirectoryMode::Results => &self.results,
            _ => &self.roster,
        }
    }

    /// Atomically replace the backing table for the given mode
    ///
    /// Concurrent lookups see either the old table or the new one in full,
    /// never a mix: the swap happens in one assignment under the write lock.
    pub async fn replace_all(
        &self,
        mode: DirectoryMode,
        records: HashMap<String, ParticipantRecord>,
    ) {
        let count = records.len();
        *self.table_for(mode).write().await = records;
        tracing::info!(mode = mode.as_str(), entries = count, "Directory table replaced");
    }

    /// Number of entries in the table the given mode resolves against
    pub async fn len(&self, mode: DirectoryMode) -> usize {
        self.table_for(mode).read().await.len()
    }

    /// Pure read: find a participant without provisioning
    ///
    /// Tries the literal key first, then the canonical decimal rendering of
    /// a numeric bib, so "007" still finds an entry keyed "7". Upstream
    /// feeds are not consistent about zero padding.
    pub async fn lookup(&self, bib: &str) -> Option<ParticipantRecord> {
        let table = self.table_for(self.mode()).read().await;

        if let Some(record) = table.get(bib) {
            return Some(record.clone());
        }
        if let Ok(numeric) = bib.parse::<u64>() {
            let canonical = numeric.to_string();
            if canonical != bib {
                return table.get(&canonical).cloned();
            }
        }
        None
    }

    /// Resolve a bib, auto-provisioning in pre-race mode
    ///
    /// In `PreRace` mode an unmatched bib synthesizes a deterministic
    /// participant, inserts it into the roster, and returns it, so
    /// repeated reads of the same bib show the same identity. Every other
    /// mode returns `None` for absent bibs. Never errors to the caller.
    pub async fn resolve_or_provision(&self, bib: &str) -> Option<ParticipantRecord> {
        if let Some(record) = self.lookup(bib).await {
            return Some(record);
        }

        if self.mode() != DirectoryMode::PreRace {
            tracing::debug!(bib = bib, mode = self.mode().as_str(), "Bib not found");
            return None;
        }

        let race_name = self
            .race_name()
            .await
            .unwrap_or_else(|| DEFAULT_RACE_NAME.to_owned());

        let mut roster = self.roster.write().await;
        // Recheck under the write lock; another session may have
        // provisioned the same bib between our read and write.
        if let Some(record) = roster.get(bib) {
            return Some(record.clone());
        }

        let record = synthesize_participant(bib, &race_name);
        tracing::info!(
            bib = bib,
            name = %record.name,
            "Auto-provisioned participant for unknown bib"
        );
        roster.insert(bib.to_owned(), record.clone());
        Some(record)
    }
}

impl Default for ParticipantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_of(entries: &[(&str, &str, &str)]) -> HashMap<String, ParticipantRecord> {
        entries
            .iter()
            .map(|(bib, first, last)| ((*bib).to_owned(), ParticipantRecord::named(*first, *last)))
            .collect()
    }

    #[tokio::test]
    async fn test_lookup_hits_replaced_table() {
        let dir = ParticipantDirectory::new();
        dir.set_mode(DirectoryMode::PreRace);
        dir.replace_all(DirectoryMode::PreRace, roster_of(&[("1234", "Jane", "Doe")]))
            .await;

        let record = dir.lookup("1234").await.unwrap();
        assert_eq!(record.name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_lookup_coerces_numeric_keys() {
        let dir = ParticipantDirectory::new();
        dir.set_mode(DirectoryMode::PreRace);
        dir.replace_all(DirectoryMode::PreRace, roster_of(&[("7", "Ada", "Lovelace")]))
            .await;

        // Zero-padded variant of an existing numeric key still resolves
        let record = dir.lookup("007").await.unwrap();
        assert_eq!(record.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_pre_race_provisioning_is_idempotent() {
        let dir = ParticipantDirectory::new();
        dir.set_mode(DirectoryMode::PreRace);

        let first = dir.resolve_or_provision("7777").await.unwrap();
        let second = dir.resolve_or_provision("7777").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.entry_type, "auto-created");
        // The synthesized record was inserted as a side effect
        assert_eq!(dir.len(DirectoryMode::PreRace).await, 1);
        assert_eq!(dir.lookup("7777").await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_results_mode_absence_does_not_mutate() {
        let dir = ParticipantDirectory::new();
        dir.set_mode(DirectoryMode::Results);
        dir.replace_all(DirectoryMode::Results, roster_of(&[("1", "A", "B")]))
            .await;

        assert!(dir.resolve_or_provision("unknown").await.is_none());
        assert_eq!(dir.len(DirectoryMode::Results).await, 1);
    }

    #[tokio::test]
    async fn test_test_mode_does_not_provision() {
        let dir = ParticipantDirectory::new();
        dir.set_mode(DirectoryMode::Test);
        assert!(dir.resolve_or_provision("55").await.is_none());
        assert_eq!(dir.len(DirectoryMode::Test).await, 0);
    }

    #[tokio::test]
    async fn test_mode_selects_table() {
        let dir = ParticipantDirectory::new();
        dir.replace_all(DirectoryMode::PreRace, roster_of(&[("1", "Roster", "Row")]))
            .await;
        dir.replace_all(DirectoryMode::Results, roster_of(&[("1", "Results", "Row")]))
            .await;

        dir.set_mode(DirectoryMode::PreRace);
        assert_eq!(dir.lookup("1").await.unwrap().first_name, "Roster");

        dir.set_mode(DirectoryMode::Results);
        assert_eq!(dir.lookup("1").await.unwrap().first_name, "Results");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_replace_is_atomic_under_concurrent_lookups() {
        use std::sync::Arc;

        let dir = Arc::new(ParticipantDirectory::new());
        dir.set_mode(DirectoryMode::Results);

        // Two full table generations; a lookup must only ever see a record
        // from exactly one of them.
        let old_gen: HashMap<_, _> = (0..50)
            .map(|i| (i.to_string(), ParticipantRecord::named("Old", i.to_string())))
            .collect();
        let new_gen: HashMap<_, _> = (0..50)
            .map(|i| (i.to_string(), ParticipantRecord::named("New", i.to_string())))
            .collect();

        dir.replace_all(DirectoryMode::Results, old_gen).await;

        let reader = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move {
                for _ in 0..200 {
                    for i in 0..50 {
                        if let Some(record) = dir.lookup(&i.to_string()).await {
                            assert!(record.first_name == "Old" || record.first_name == "New");
                            assert_eq!(record.last_name, i.to_string());
                        }
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        let writer = {
            let dir = Arc::clone(&dir);
            let new_gen = new_gen.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    dir.replace_all(DirectoryMode::Results, new_gen.clone()).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        reader.await.unwrap();
        writer.await.unwrap();
    }
}
