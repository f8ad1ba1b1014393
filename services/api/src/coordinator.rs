use crate::infra::engine_for;
use club_allocator::config::AllocationConfig;
use club_allocator::error::AppError;
use club_allocator::workflows::allocation::report::views::PupilView;
use club_allocator::workflows::allocation::{
    AdjustmentError, AllocationOutcome, AllocationSession, AllocationSnapshot, AllocationSummary,
    ClubKey,
};
use club_allocator::workflows::export::{write_clubs_csv, write_pupils_csv};
use club_allocator::workflows::intake::{load_history, IntakeOptions, SubmissionImporter};
use club_allocator::workflows::storage::{CapacityConfig, CapacityStore};
use serde::Serialize;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Owns the single live allocation session and sequences every operation on it.
///
/// Each operation holds the session lock from start to finish, so callers never
/// observe a partially applied run or adjustment.
pub(crate) struct SessionCoordinator {
    settings: AllocationConfig,
    store: Arc<dyn CapacityStore>,
    session: Mutex<Option<AllocationSession>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AllocationRun {
    pub(crate) outcome: AllocationOutcome,
    pub(crate) summary: AllocationSummary,
    pub(crate) snapshot: AllocationSnapshot,
}

#[derive(Debug, Serialize)]
pub(crate) struct CapacityUpdate {
    pub(crate) applied: usize,
    pub(crate) stored: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdjustmentResult {
    pub(crate) changed: bool,
    pub(crate) pupil: PupilView,
}

impl SessionCoordinator {
    pub(crate) fn new(settings: AllocationConfig, store: Arc<dyn CapacityStore>) -> Self {
        Self {
            settings,
            store,
            session: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<AllocationSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the current session with one built from `submissions_csv`.
    ///
    /// Stored capacities are applied before the session becomes visible.
    pub(crate) fn load(
        &self,
        submissions_csv: &str,
        history_csv: Option<&str>,
    ) -> Result<AllocationSnapshot, AppError> {
        let history = match history_csv {
            Some(csv) => load_history(Cursor::new(csv.as_bytes()))?,
            None => Default::default(),
        };
        let options = IntakeOptions {
            default_capacity: self.settings.default_capacity,
            history,
        };

        let mut session =
            SubmissionImporter::from_reader(Cursor::new(submissions_csv.as_bytes()), &options)?;
        let stored = self.store.load()?;
        session.apply_capacities(&stored);

        let snapshot = session.snapshot();
        *self.lock() = Some(session);
        info!(
            pupils = snapshot.pupils.len(),
            clubs = snapshot.clubs.len(),
            "session loaded"
        );
        Ok(snapshot)
    }

    pub(crate) fn snapshot(&self) -> Result<AllocationSnapshot, AppError> {
        let guard = self.lock();
        let session = guard.as_ref().ok_or(AppError::NoSession)?;
        Ok(session.snapshot())
    }

    /// Applies capacities to the session and persists them over the stored set.
    ///
    /// The session only changes once the store has accepted the new set.
    pub(crate) fn update_capacities(
        &self,
        requested: &CapacityConfig,
    ) -> Result<CapacityUpdate, AppError> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(AppError::NoSession)?;

        let mut updated = session.clone();
        let applied = updated.apply_capacities(requested);

        let mut stored = self.store.load()?;
        stored.merge(&updated.capacities());
        self.store.save(&stored)?;

        *session = updated;
        Ok(CapacityUpdate {
            applied,
            stored: stored.len(),
        })
    }

    /// Clears earlier results and runs the engine from the unallocated state.
    pub(crate) fn allocate(&self) -> Result<AllocationRun, AppError> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(AppError::NoSession)?;

        session.reset_allocations();
        let outcome = session.allocate(&engine_for(&self.settings));

        Ok(AllocationRun {
            outcome,
            summary: session.summary(),
            snapshot: session.snapshot(),
        })
    }

    pub(crate) fn add_allocation(
        &self,
        pupil: &str,
        club: &ClubKey,
    ) -> Result<AdjustmentResult, AppError> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(AppError::NoSession)?;
        let changed = session.add_allocation(pupil, club)?;
        adjustment_result(session, pupil, changed)
    }

    pub(crate) fn remove_allocation(
        &self,
        pupil: &str,
        club: &ClubKey,
    ) -> Result<AdjustmentResult, AppError> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(AppError::NoSession)?;
        let changed = session.remove_allocation(pupil, club)?;
        adjustment_result(session, pupil, changed)
    }

    pub(crate) fn export_pupils(&self) -> Result<Vec<u8>, AppError> {
        let guard = self.lock();
        let session = guard.as_ref().ok_or(AppError::NoSession)?;
        let mut buffer = Vec::new();
        write_pupils_csv(session, &mut buffer)?;
        Ok(buffer)
    }

    pub(crate) fn export_clubs(&self) -> Result<Vec<u8>, AppError> {
        let guard = self.lock();
        let session = guard.as_ref().ok_or(AppError::NoSession)?;
        let mut buffer = Vec::new();
        write_clubs_csv(session, &mut buffer)?;
        Ok(buffer)
    }
}

fn adjustment_result(
    session: &AllocationSession,
    pupil_id: &str,
    changed: bool,
) -> Result<AdjustmentResult, AppError> {
    let pupil = session
        .pupils()
        .get(pupil_id)
        .map(PupilView::from)
        .ok_or_else(|| AdjustmentError::UnknownPupil(pupil_id.to_string()))?;
    Ok(AdjustmentResult { changed, pupil })
}
