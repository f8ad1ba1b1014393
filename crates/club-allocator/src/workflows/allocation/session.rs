use super::domain::{ParseError, SubmissionRow};
use super::engine::{AllocationEngine, AllocationOutcome};
use super::priority::HistoricalAllocations;
use super::registry::{build_pupil, ClubRegistry, PupilRoster};
use super::report::{AllocationSnapshot, AllocationSummary};
use crate::workflows::storage::CapacityConfig;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Working set for one allocation session: every club and pupil, and their allocation state.
///
/// Callers sequence load, capacity configuration, [`allocate`](Self::allocate),
/// manual adjustment, and export; none of these may interleave.
#[derive(Debug, Clone, Default)]
pub struct AllocationSession {
    pub(super) clubs: ClubRegistry,
    pub(super) pupils: PupilRoster,
}

impl AllocationSession {
    pub fn new(default_capacity: u32) -> Self {
        Self {
            clubs: ClubRegistry::new(default_capacity),
            pupils: PupilRoster::new(),
        }
    }

    /// Builds a session from rows, stopping at the first invalid one.
    pub fn from_rows<'a, I>(
        rows: I,
        default_capacity: u32,
        history: &HistoricalAllocations,
    ) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = &'a SubmissionRow>,
    {
        let mut session = Self::new(default_capacity);
        for row in rows {
            session.ingest(row, history)?;
        }
        Ok(session)
    }

    /// Adds one submission. A repeated pupil name replaces the earlier submission.
    pub fn ingest(
        &mut self,
        row: &SubmissionRow,
        history: &HistoricalAllocations,
    ) -> Result<(), ParseError> {
        let pupil = build_pupil(row, &mut self.clubs, history)?;
        if let Some(previous) = self.pupils.insert(pupil) {
            warn!(
                pupil = previous.id(),
                "pupil submitted more than once; keeping the latest submission"
            );
        }
        Ok(())
    }

    pub fn clubs(&self) -> &ClubRegistry {
        &self.clubs
    }

    pub fn pupils(&self) -> &PupilRoster {
        &self.pupils
    }

    pub fn classes(&self) -> BTreeMap<String, Vec<String>> {
        self.pupils.classes()
    }

    /// Overrides club capacities with configured values. Keys with no club in
    /// this session are ignored. Returns how many clubs were updated.
    pub fn apply_capacities(&mut self, config: &CapacityConfig) -> usize {
        let mut applied = 0;
        for (key, maximum) in config.iter() {
            if self.clubs.set_maximum(key, maximum) {
                applied += 1;
            }
        }
        info!(applied, configured = config.len(), "club capacities applied");
        applied
    }

    /// Current capacity of every club in the session.
    pub fn capacities(&self) -> CapacityConfig {
        self.clubs
            .iter()
            .map(|club| (club.key().clone(), club.maximum()))
            .collect()
    }

    pub fn allocate(&mut self, engine: &AllocationEngine) -> AllocationOutcome {
        engine.run(&mut self.clubs, &mut self.pupils)
    }

    /// Clears every allocation and waitlist, returning the session to its ingested state.
    pub fn reset_allocations(&mut self) {
        for club in self.clubs.iter_mut() {
            club.clear();
        }
        for pupil in self.pupils.as_mut_slice() {
            pupil.clear();
        }
    }

    pub fn snapshot(&self) -> AllocationSnapshot {
        AllocationSnapshot::from_session(self)
    }

    pub fn summary(&self) -> AllocationSummary {
        AllocationSummary::from_session(self)
    }
}
