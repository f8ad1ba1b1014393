//! Allocation of pupils to capacity-limited after-school clubs.
//!
//! Submissions are ingested into an [`AllocationSession`], ordered by a
//! priority index derived from submission time, school year, and prior
//! allocations, then matched to clubs by a bounded round-based greedy engine.
//!
//! [`AllocationSession`]: workflows::allocation::AllocationSession

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
