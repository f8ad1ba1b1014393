use super::normalizer::title_case;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preference ranks grouped into one term band.
pub const PREFERENCES_PER_TERM: usize = 3;

/// Capacity assigned to a club until a configured override replaces it.
pub const DEFAULT_CLUB_CAPACITY: u32 = 30;

/// Identity of a club offering: one activity, on one weekday, in one term band.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClubKey {
    pub name: String,
    pub weekday: String,
    pub term_band: u32,
}

impl ClubKey {
    pub fn new(name: impl Into<String>, weekday: impl Into<String>, term_band: u32) -> Self {
        Self {
            name: name.into(),
            weekday: weekday.into(),
            term_band,
        }
    }
}

impl fmt::Display for ClubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) term {}", self.name, self.weekday, self.term_band)
    }
}

/// Maps a 1-based preference rank onto its term band (ranks 1-3 are band 1, 4-6 band 2, ...).
pub fn term_band_for_rank(rank: usize) -> u32 {
    rank.max(1).div_ceil(PREFERENCES_PER_TERM) as u32
}

#[derive(Debug, Clone)]
pub struct Club {
    pub(crate) key: ClubKey,
    pub(crate) staff: String,
    pub(crate) maximum: u32,
    pub(crate) allocated: Vec<String>,
    pub(crate) waitlist: Vec<String>,
}

impl Club {
    pub fn new(key: ClubKey, staff: impl Into<String>, maximum: u32) -> Self {
        Self {
            key,
            staff: staff.into(),
            maximum,
            allocated: Vec::new(),
            waitlist: Vec::new(),
        }
    }

    pub fn key(&self) -> &ClubKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn weekday(&self) -> &str {
        &self.key.weekday
    }

    pub fn term_band(&self) -> u32 {
        self.key.term_band
    }

    pub fn staff(&self) -> &str {
        &self.staff
    }

    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Changes the capacity used by the next allocation run. Existing members are kept.
    pub fn set_maximum(&mut self, maximum: u32) {
        self.maximum = maximum;
    }

    pub fn allocated(&self) -> &[String] {
        &self.allocated
    }

    pub fn waitlist(&self) -> &[String] {
        &self.waitlist
    }

    /// Human readable label, `Name (Weekday)`.
    pub fn description(&self) -> String {
        format!("{} ({})", self.key.name, self.key.weekday)
    }

    pub fn has_space(&self) -> bool {
        self.allocated.len() < self.maximum as usize
    }

    pub fn holds(&self, pupil_id: &str) -> bool {
        self.allocated.iter().any(|id| id == pupil_id)
    }

    /// Records a pupil who found the club full. Returns `false` if already waitlisted.
    pub(crate) fn enqueue_waitlist(&mut self, pupil_id: &str) -> bool {
        if self.waitlist.iter().any(|id| id == pupil_id) {
            return false;
        }
        self.waitlist.push(pupil_id.to_string());
        true
    }

    pub(crate) fn clear(&mut self) {
        self.allocated.clear();
        self.waitlist.clear();
    }
}

#[derive(Debug, Clone)]
pub struct Pupil {
    pub(crate) id: String,
    pub(crate) class_label: String,
    pub(crate) year: u32,
    pub(crate) submitted_at: NaiveDateTime,
    pub(crate) priority_index: i64,
    pub(crate) quota: u32,
    pub(crate) requested: Vec<Option<ClubKey>>,
    pub(crate) allocated: Vec<ClubKey>,
}

impl Pupil {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name as printed on exported rosters.
    pub fn display_name(&self) -> String {
        title_case(&self.id)
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn submitted_at(&self) -> NaiveDateTime {
        self.submitted_at
    }

    pub fn priority_index(&self) -> i64 {
        self.priority_index
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Preference slots in rank order; `None` marks a rank left blank.
    pub fn requested(&self) -> &[Option<ClubKey>] {
        &self.requested
    }

    pub fn allocated(&self) -> &[ClubKey] {
        &self.allocated
    }

    pub fn first_choice(&self) -> Option<&ClubKey> {
        self.requested.iter().flatten().next()
    }

    pub fn has_capacity(&self) -> bool {
        self.allocated.len() < self.quota as usize
    }

    pub fn is_busy_on(&self, weekday: &str) -> bool {
        self.allocated.iter().any(|key| key.weekday == weekday)
    }

    pub fn holds(&self, key: &ClubKey) -> bool {
        self.allocated.contains(key)
    }

    pub(crate) fn clear(&mut self) {
        self.allocated.clear();
    }
}

/// One submission as read from the request sheet, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRow {
    pub time: String,
    pub name: String,
    pub class: String,
    pub preferences: Vec<String>,
    pub count: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("timestamp '{value}' splits into {tokens} tokens, expected 7")]
    TimestampTokens { value: String, tokens: usize },
    #[error("timestamp '{value}' does not describe a calendar time")]
    InvalidTimestamp { value: String },
    #[error("pupil name is empty")]
    EmptyName,
    #[error("class is empty")]
    EmptyClass,
    #[error("class '{class}' has no digit year in its second character")]
    InvalidClassYear { class: String },
    #[error("count '{value}' is not a positive integer")]
    InvalidCount { value: String },
    #[error("club description '{value}' is not of the form 'Name (Weekday) - Staff'")]
    InvalidClubDescription { value: String },
    #[error("expected a positive multiple of 3 preference columns, found {count}")]
    PreferenceColumns { count: usize },
}

/// Links a pupil and a club in both directions. Nothing else extends either allocation list.
pub(crate) fn commit(pupil: &mut Pupil, club: &mut Club) {
    pupil.allocated.push(club.key.clone());
    club.allocated.push(pupil.id.clone());
}

/// Unlinks a pupil and a club in both directions. Returns `true` if either side changed.
pub(crate) fn release(pupil: &mut Pupil, club: &mut Club) -> bool {
    let before = (pupil.allocated.len(), club.allocated.len());
    pupil.allocated.retain(|key| key != &club.key);
    club.allocated.retain(|id| id != &pupil.id);
    before != (pupil.allocated.len(), club.allocated.len())
}
