use super::domain::{
    term_band_for_rank, Club, ClubKey, ParseError, Pupil, SubmissionRow, DEFAULT_CLUB_CAPACITY,
    PREFERENCES_PER_TERM,
};
use super::parse::{parse_class_year, parse_quota, parse_submission_time, ClubDescription};
use super::priority::{priority_index, HistoricalAllocations};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Canonical club records for one session, keyed by [`ClubKey`].
#[derive(Debug, Clone)]
pub struct ClubRegistry {
    clubs: BTreeMap<ClubKey, Club>,
    default_capacity: u32,
}

impl Default for ClubRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CLUB_CAPACITY)
    }
}

impl ClubRegistry {
    pub fn new(default_capacity: u32) -> Self {
        Self {
            clubs: BTreeMap::new(),
            default_capacity,
        }
    }

    /// Returns the club stored under `key`, building it with `factory` on first use.
    ///
    /// The first record stored for a key is never replaced.
    pub fn get_or_insert<F>(&mut self, key: ClubKey, factory: F) -> &mut Club
    where
        F: FnOnce(ClubKey) -> Club,
    {
        match self.clubs.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let club = factory(entry.key().clone());
                entry.insert(club)
            }
        }
    }

    /// Resolves one preference cell at 1-based `rank` to a club key.
    ///
    /// A blank cell yields `None`. A new key creates a club with the default
    /// capacity; a known key keeps its first staff and ignores this one.
    pub fn resolve_club(&mut self, raw: &str, rank: usize) -> Result<Option<ClubKey>, ParseError> {
        let Some(description) = ClubDescription::parse(raw)? else {
            return Ok(None);
        };

        let key = ClubKey::new(
            description.name,
            description.weekday,
            term_band_for_rank(rank),
        );
        let capacity = self.default_capacity;
        let staff = description.staff;
        let club = self.get_or_insert(key.clone(), |key| Club::new(key, staff.clone(), capacity));

        if club.staff() != staff {
            warn!(
                club = %key,
                kept = club.staff(),
                ignored = %staff,
                "duplicate club request with different staff absorbed into first definition"
            );
        }

        Ok(Some(key))
    }

    pub fn lookup(&self, key: &ClubKey) -> Option<&Club> {
        self.clubs.get(key)
    }

    pub(crate) fn lookup_mut(&mut self, key: &ClubKey) -> Option<&mut Club> {
        self.clubs.get_mut(key)
    }

    /// Returns `false` when no club is registered under `key`.
    pub fn set_maximum(&mut self, key: &ClubKey, maximum: u32) -> bool {
        match self.clubs.get_mut(key) {
            Some(club) => {
                club.set_maximum(maximum);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Club> {
        self.clubs.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Club> {
        self.clubs.values_mut()
    }

    pub fn len(&self) -> usize {
        self.clubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }

    pub fn max_term_band(&self) -> u32 {
        self.clubs.keys().map(|key| key.term_band).max().unwrap_or(0)
    }
}

/// Pupils in ingestion order. Ingestion order breaks priority ties.
#[derive(Debug, Clone, Default)]
pub struct PupilRoster {
    pupils: Vec<Pupil>,
    positions: HashMap<String, usize>,
}

impl PupilRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pupil. A pupil whose id is already present replaces the stored
    /// record but keeps its position; the replaced record is returned.
    pub fn insert(&mut self, pupil: Pupil) -> Option<Pupil> {
        match self.positions.get(pupil.id()) {
            Some(&position) => Some(std::mem::replace(&mut self.pupils[position], pupil)),
            None => {
                self.positions.insert(pupil.id().to_string(), self.pupils.len());
                self.pupils.push(pupil);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Pupil> {
        self.positions.get(id).map(|&position| &self.pupils[position])
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Pupil> {
        let position = *self.positions.get(id)?;
        self.pupils.get_mut(position)
    }

    pub fn as_slice(&self) -> &[Pupil] {
        &self.pupils
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Pupil] {
        &mut self.pupils
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pupil> {
        self.pupils.iter()
    }

    pub fn len(&self) -> usize {
        self.pupils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pupils.is_empty()
    }

    pub fn max_quota(&self) -> u32 {
        self.pupils.iter().map(Pupil::quota).max().unwrap_or(0)
    }

    /// Class label to pupil ids, each list in ingestion order without duplicates.
    pub fn classes(&self) -> BTreeMap<String, Vec<String>> {
        let mut classes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pupil in &self.pupils {
            let members = classes.entry(pupil.class_label().to_string()).or_default();
            if !members.iter().any(|id| id == pupil.id()) {
                members.push(pupil.id().to_string());
            }
        }
        classes
    }
}

/// Validates a submission row and resolves its preference cells against `registry`.
pub fn build_pupil(
    row: &SubmissionRow,
    registry: &mut ClubRegistry,
    history: &HistoricalAllocations,
) -> Result<Pupil, ParseError> {
    let submitted_at = parse_submission_time(&row.time)?;

    let id = row.name.trim();
    if id.is_empty() {
        return Err(ParseError::EmptyName);
    }
    let class_label = row.class.trim();
    if class_label.is_empty() {
        return Err(ParseError::EmptyClass);
    }
    let year = parse_class_year(class_label)?;
    let quota = parse_quota(&row.count)?;

    let slots = row.preferences.len();
    if slots == 0 || slots % PREFERENCES_PER_TERM != 0 {
        return Err(ParseError::PreferenceColumns { count: slots });
    }

    let requested = row
        .preferences
        .iter()
        .enumerate()
        .map(|(index, raw)| registry.resolve_club(raw, index + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut pupil = Pupil {
        id: id.to_string(),
        class_label: class_label.to_string(),
        year,
        submitted_at,
        priority_index: 0,
        quota,
        requested,
        allocated: Vec::new(),
    };
    pupil.priority_index = priority_index(&pupil, history);

    Ok(pupil)
}
