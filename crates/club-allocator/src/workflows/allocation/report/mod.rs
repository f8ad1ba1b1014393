mod summary;
pub mod views;

pub use summary::{AllocationSummary, ClubFillEntry, UnfilledPupilEntry};
pub use views::{AllocationSnapshot, ClubView, PupilView};
