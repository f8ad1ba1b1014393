use super::domain::{commit, Pupil};
use super::registry::{ClubRegistry, PupilRoster};
use serde::Serialize;
use tracing::{debug, info};

/// Round-based greedy matcher.
///
/// Each round visits pupils in service order and grants each pupil at most one
/// new club: the first requested slot whose weekday is still free for the
/// pupil and which has a seat left. Full clubs met on the way record the pupil
/// on their waitlist and the scan continues.
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    rounds: Option<usize>,
}

/// Counters from one engine run.
///
/// `rounds` counts the rounds actually executed, which stops short of
/// `planned_rounds` once a round commits nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
    pub planned_rounds: usize,
    pub rounds: usize,
    pub commits: usize,
    pub waitlist_entries: usize,
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs exactly `rounds` rounds instead of one per unit of the largest quota.
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn rounds_for(&self, pupils: &PupilRoster) -> usize {
        self.rounds.unwrap_or_else(|| pupils.max_quota() as usize)
    }

    /// Runs rounds until the planned count is reached or a round commits nothing.
    /// Allocations already present are kept and extended.
    ///
    /// A round without commits leaves every pupil and club as it found them
    /// apart from de-duplicated waitlist entries, so later rounds would repeat it.
    pub fn run(&self, clubs: &mut ClubRegistry, pupils: &mut PupilRoster) -> AllocationOutcome {
        let order = service_order(pupils);
        let mut outcome = AllocationOutcome {
            planned_rounds: self.rounds_for(pupils),
            ..AllocationOutcome::default()
        };

        info!(
            pupils = pupils.len(),
            clubs = clubs.len(),
            rounds = outcome.planned_rounds,
            "allocation started"
        );

        for round in 1..=outcome.planned_rounds {
            let committed_before = outcome.commits;
            let slice = pupils.as_mut_slice();
            for &position in &order {
                allocate_pupil(&mut slice[position], clubs, &mut outcome, round);
            }
            outcome.rounds = round;

            let committed = outcome.commits - committed_before;
            debug!(round, commits = committed, "allocation round finished");
            if committed == 0 {
                break;
            }
        }

        info!(
            rounds = outcome.rounds,
            commits = outcome.commits,
            waitlist_entries = outcome.waitlist_entries,
            "allocation finished"
        );
        outcome
    }
}

/// Roster positions in service order: ascending priority index, ingestion order on ties.
pub fn service_order(pupils: &PupilRoster) -> Vec<usize> {
    let slice = pupils.as_slice();
    let mut order: Vec<usize> = (0..slice.len()).collect();
    // sort_by_key is stable, so equal indices keep ingestion order.
    order.sort_by_key(|&position| slice[position].priority_index());
    order
}

fn allocate_pupil(
    pupil: &mut Pupil,
    clubs: &mut ClubRegistry,
    outcome: &mut AllocationOutcome,
    round: usize,
) {
    if !pupil.has_capacity() {
        return;
    }

    for rank in 0..pupil.requested().len() {
        let Some(key) = pupil.requested()[rank].clone() else {
            continue;
        };
        let Some(club) = clubs.lookup_mut(&key) else {
            continue;
        };
        if pupil.is_busy_on(club.weekday()) {
            continue;
        }

        if club.has_space() {
            commit(pupil, club);
            outcome.commits += 1;
            debug!(pupil = pupil.id(), club = %key, rank = rank + 1, round, "allocated");
            return;
        }

        if club.enqueue_waitlist(pupil.id()) {
            outcome.waitlist_entries += 1;
            debug!(pupil = pupil.id(), club = %key, round, "waitlisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::allocation::domain::{Club, ClubKey};
    use chrono::NaiveDate;

    fn pupil(id: &str, priority_index: i64, quota: u32, requested: &[Option<ClubKey>]) -> Pupil {
        Pupil {
            id: id.to_string(),
            class_label: "P5A".to_string(),
            year: 5,
            submitted_at: NaiveDate::from_ymd_opt(2019, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            priority_index,
            quota,
            requested: requested.to_vec(),
            allocated: Vec::new(),
        }
    }

    fn registry(clubs: &[(&ClubKey, u32)]) -> ClubRegistry {
        let mut registry = ClubRegistry::default();
        for (key, maximum) in clubs {
            registry.get_or_insert((*key).clone(), |key| Club::new(key, "Staff", *maximum));
        }
        registry
    }

    fn roster(pupils: Vec<Pupil>) -> PupilRoster {
        let mut roster = PupilRoster::new();
        for pupil in pupils {
            roster.insert(pupil);
        }
        roster
    }

    #[test]
    fn day_conflict_defers_to_next_free_weekday() {
        let club_a = ClubKey::new("Chess", "Monday", 1);
        let club_b = ClubKey::new("Football", "Monday", 1);
        let club_c = ClubKey::new("Art", "Tuesday", 1);
        let mut clubs = registry(&[(&club_a, 1), (&club_b, 5), (&club_c, 5)]);
        let mut pupils = roster(vec![pupil(
            "amy",
            0,
            2,
            &[Some(club_a.clone()), Some(club_b.clone()), Some(club_c.clone())],
        )]);

        let outcome = AllocationEngine::new().with_rounds(3).run(&mut clubs, &mut pupils);

        assert_eq!(outcome.commits, 2);
        assert_eq!(pupils.get("amy").unwrap().allocated(), [club_a, club_c.clone()]);
        assert!(clubs.lookup(&club_b).unwrap().allocated().is_empty());
        assert_eq!(clubs.lookup(&club_c).unwrap().allocated(), ["amy".to_string()]);
    }

    #[test]
    fn full_club_waitlists_lower_priority_pupil() {
        let club_x = ClubKey::new("Drama", "Wednesday", 1);
        let mut clubs = registry(&[(&club_x, 1)]);
        let mut pupils = roster(vec![
            pupil("p2", 20, 1, &[None, Some(club_x.clone()), None]),
            pupil("p1", 10, 1, &[Some(club_x.clone()), None, None]),
        ]);

        AllocationEngine::new().run(&mut clubs, &mut pupils);

        let club = clubs.lookup(&club_x).unwrap();
        assert_eq!(club.allocated(), ["p1".to_string()]);
        assert_eq!(club.waitlist(), ["p2".to_string()]);
    }

    #[test]
    fn waitlist_is_not_duplicated_across_rounds() {
        let full = ClubKey::new("Drama", "Wednesday", 1);
        let mut clubs = registry(&[(&full, 1)]);
        let mut pupils = roster(vec![
            pupil("first", 0, 1, &[Some(full.clone()), None, None]),
            pupil("second", 1, 3, &[Some(full.clone()), None, None]),
        ]);

        let outcome = AllocationEngine::new().run(&mut clubs, &mut pupils);

        assert_eq!(outcome.planned_rounds, 3);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.waitlist_entries, 1);
        assert_eq!(clubs.lookup(&full).unwrap().waitlist(), ["second".to_string()]);
    }

    #[test]
    fn waitlisted_pupil_can_still_commit_later_in_same_scan() {
        let full = ClubKey::new("Drama", "Wednesday", 1);
        let open = ClubKey::new("Chess", "Friday", 1);
        let mut clubs = registry(&[(&full, 1), (&open, 2)]);
        let mut pupils = roster(vec![
            pupil("first", 0, 1, &[Some(full.clone()), None, None]),
            pupil("second", 1, 1, &[Some(full.clone()), Some(open.clone()), None]),
        ]);

        AllocationEngine::new().with_rounds(1).run(&mut clubs, &mut pupils);

        assert_eq!(pupils.get("second").unwrap().allocated(), [open]);
        assert_eq!(clubs.lookup(&full).unwrap().waitlist(), ["second".to_string()]);
    }

    #[test]
    fn equal_indices_are_served_in_ingestion_order() {
        let seat = ClubKey::new("Drama", "Wednesday", 1);
        let mut clubs = registry(&[(&seat, 1)]);
        let mut pupils = roster(vec![
            pupil("zed", 5, 1, &[Some(seat.clone()), None, None]),
            pupil("amy", 5, 1, &[Some(seat.clone()), None, None]),
        ]);

        assert_eq!(service_order(&pupils), vec![0, 1]);
        AllocationEngine::new().run(&mut clubs, &mut pupils);

        assert_eq!(clubs.lookup(&seat).unwrap().allocated(), ["zed".to_string()]);
    }

    #[test]
    fn unknown_club_reference_is_skipped() {
        let known = ClubKey::new("Chess", "Friday", 1);
        let ghost = ClubKey::new("Ghost", "Monday", 1);
        let mut clubs = registry(&[(&known, 1)]);
        let mut pupils = roster(vec![pupil(
            "amy",
            0,
            1,
            &[Some(ghost), Some(known.clone()), None],
        )]);

        AllocationEngine::new().run(&mut clubs, &mut pupils);

        assert_eq!(pupils.get("amy").unwrap().allocated(), [known]);
    }

    #[test]
    fn idle_round_ends_run_with_oversized_quota() {
        let monday = ClubKey::new("Chess", "Monday", 1);
        let tuesday = ClubKey::new("Art", "Tuesday", 1);
        let mut clubs = registry(&[(&monday, 5), (&tuesday, 5)]);
        let mut pupils = roster(vec![pupil(
            "amy",
            0,
            4_000_000_000,
            &[Some(monday.clone()), Some(tuesday.clone()), None],
        )]);

        let outcome = AllocationEngine::new().run(&mut clubs, &mut pupils);

        assert_eq!(outcome.planned_rounds, 4_000_000_000);
        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.commits, 2);
        assert_eq!(pupils.get("amy").unwrap().allocated(), [monday, tuesday]);
    }

    #[test]
    fn at_most_one_commit_per_pupil_per_round() {
        let monday = ClubKey::new("Chess", "Monday", 1);
        let tuesday = ClubKey::new("Art", "Tuesday", 1);
        let mut clubs = registry(&[(&monday, 5), (&tuesday, 5)]);
        let mut pupils = roster(vec![pupil(
            "amy",
            0,
            2,
            &[Some(monday.clone()), Some(tuesday), None],
        )]);

        let outcome = AllocationEngine::new().with_rounds(1).run(&mut clubs, &mut pupils);

        assert_eq!(outcome.commits, 1);
        assert_eq!(pupils.get("amy").unwrap().allocated(), [monday]);
    }
}
