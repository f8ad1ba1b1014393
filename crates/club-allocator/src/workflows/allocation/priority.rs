use super::domain::Pupil;
use super::normalizer::{history_key, normalize_text};
use std::collections::HashMap;

pub const MS_PER_YEAR: i64 = 1000 * 60 * 60 * 24 * 365;

/// Years added to the index of a pupil asking to repeat last session's club.
pub const REPEAT_PENALTY_YEARS: i64 = 5;

/// Clubs each pupil held in the previous session, keyed by lowercased, trimmed name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoricalAllocations {
    entries: HashMap<String, String>,
}

impl HistoricalAllocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, clubs: impl Into<String>) {
        self.entries.insert(history_key(name), clubs.into());
    }

    pub fn clubs_for(&self, name: &str) -> Option<&str> {
        self.entries.get(&history_key(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: AsRef<str>, C: Into<String>> FromIterator<(N, C)> for HistoricalAllocations {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let mut history = Self::new();
        for (name, clubs) in iter {
            history.insert(name.as_ref(), clubs);
        }
        history
    }
}

/// Service-order key for a pupil; lower values are served first.
///
/// Earlier submissions and older year groups sort ahead. A pupil whose first
/// choice names a club they already held last session is pushed back by
/// [`REPEAT_PENALTY_YEARS`].
pub fn priority_index(pupil: &Pupil, history: &HistoricalAllocations) -> i64 {
    let submitted = pupil.submitted_at().and_utc().timestamp_millis();
    let base = submitted - i64::from(pupil.year()) * MS_PER_YEAR;

    if repeats_previous_allocation(pupil, history) {
        base + REPEAT_PENALTY_YEARS * MS_PER_YEAR
    } else {
        base
    }
}

fn repeats_previous_allocation(pupil: &Pupil, history: &HistoricalAllocations) -> bool {
    if history.is_empty() {
        return false;
    }
    let Some(first_choice) = pupil.first_choice() else {
        return false;
    };
    let Some(previous) = history.clubs_for(pupil.id()) else {
        return false;
    };
    normalize_text(previous).contains(&normalize_text(&first_choice.name))
}
