use super::super::session::AllocationSession;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubFillEntry {
    pub key: String,
    pub description: String,
    pub term_band: u32,
    pub allocated: usize,
    pub maximum: u32,
    pub waitlisted: usize,
    pub full: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfilledPupilEntry {
    pub name: String,
    pub class: String,
    pub quota: u32,
    pub allocated: usize,
}

/// Fill levels per club and the pupils left below their quota.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    pub pupils: usize,
    pub allocations: usize,
    pub clubs: Vec<ClubFillEntry>,
    pub unfilled_pupils: Vec<UnfilledPupilEntry>,
}

impl AllocationSummary {
    pub fn from_session(session: &AllocationSession) -> Self {
        let clubs: Vec<ClubFillEntry> = session
            .clubs()
            .iter()
            .map(|club| ClubFillEntry {
                key: club.key().to_string(),
                description: club.description(),
                term_band: club.term_band(),
                allocated: club.allocated().len(),
                maximum: club.maximum(),
                waitlisted: club.waitlist().len(),
                full: !club.has_space(),
            })
            .collect();

        let unfilled_pupils = session
            .pupils()
            .iter()
            .filter(|pupil| pupil.has_capacity())
            .map(|pupil| UnfilledPupilEntry {
                name: pupil.id().to_string(),
                class: pupil.class_label().to_string(),
                quota: pupil.quota(),
                allocated: pupil.allocated().len(),
            })
            .collect();

        Self {
            pupils: session.pupils().len(),
            allocations: clubs.iter().map(|entry| entry.allocated).sum(),
            clubs,
            unfilled_pupils,
        }
    }

    pub fn full_clubs(&self) -> impl Iterator<Item = &ClubFillEntry> {
        self.clubs.iter().filter(|entry| entry.full)
    }
}
