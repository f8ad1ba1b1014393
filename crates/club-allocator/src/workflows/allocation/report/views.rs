use super::super::domain::{Club, Pupil};
use super::super::session::AllocationSession;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PupilView {
    pub name: String,
    pub display_name: String,
    pub class: String,
    pub year: u32,
    pub timestamp: NaiveDateTime,
    pub priority_index: i64,
    pub quota: u32,
    pub requests: Vec<Option<String>>,
    pub allocated: Vec<String>,
}

impl From<&Pupil> for PupilView {
    fn from(pupil: &Pupil) -> Self {
        Self {
            name: pupil.id().to_string(),
            display_name: pupil.display_name(),
            class: pupil.class_label().to_string(),
            year: pupil.year(),
            timestamp: pupil.submitted_at(),
            priority_index: pupil.priority_index(),
            quota: pupil.quota(),
            requests: pupil
                .requested()
                .iter()
                .map(|slot| slot.as_ref().map(ToString::to_string))
                .collect(),
            allocated: pupil.allocated().iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubView {
    pub key: String,
    pub name: String,
    pub weekday: String,
    pub staff: String,
    pub term_band: u32,
    pub maximum: u32,
    pub description: String,
    pub allocated: Vec<String>,
    pub waitlist: Vec<String>,
}

impl From<&Club> for ClubView {
    fn from(club: &Club) -> Self {
        Self {
            key: club.key().to_string(),
            name: club.name().to_string(),
            weekday: club.weekday().to_string(),
            staff: club.staff().to_string(),
            term_band: club.term_band(),
            maximum: club.maximum(),
            description: club.description(),
            allocated: club.allocated().to_vec(),
            waitlist: club.waitlist().to_vec(),
        }
    }
}

/// Serializable picture of a session handed to export and persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSnapshot {
    pub pupils: BTreeMap<String, PupilView>,
    pub clubs: BTreeMap<String, ClubView>,
    pub classes: BTreeMap<String, Vec<String>>,
}

impl AllocationSnapshot {
    pub fn from_session(session: &AllocationSession) -> Self {
        let pupils = session
            .pupils()
            .iter()
            .map(|pupil| (pupil.id().to_string(), PupilView::from(pupil)))
            .collect();
        let clubs = session
            .clubs()
            .iter()
            .map(|club| (club.key().to_string(), ClubView::from(club)))
            .collect();

        Self {
            pupils,
            clubs,
            classes: session.classes(),
        }
    }
}
