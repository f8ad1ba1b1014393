mod adjustment;
pub mod domain;
mod engine;
pub(crate) mod normalizer;
pub mod parse;
mod priority;
mod registry;
pub mod report;
mod session;

pub use adjustment::AdjustmentError;
pub use domain::{
    term_band_for_rank, Club, ClubKey, ParseError, Pupil, SubmissionRow, DEFAULT_CLUB_CAPACITY,
    PREFERENCES_PER_TERM,
};
pub use engine::{service_order, AllocationEngine, AllocationOutcome};
pub use normalizer::title_case;
pub use priority::{priority_index, HistoricalAllocations, MS_PER_YEAR, REPEAT_PENALTY_YEARS};
pub use registry::{build_pupil, ClubRegistry, PupilRoster};
pub use report::{AllocationSnapshot, AllocationSummary};
pub use session::AllocationSession;
