use super::domain::{commit, release, ClubKey};
use super::session::AllocationSession;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdjustmentError {
    #[error("no pupil named '{0}' in this session")]
    UnknownPupil(String),
    #[error("no club '{0}' in this session")]
    UnknownClub(ClubKey),
    #[error("allocation of '{pupil}' to '{club}' is recorded on one side only")]
    MembershipMismatch { pupil: String, club: ClubKey },
}

impl AllocationSession {
    /// Allocates a pupil to a club regardless of capacity or weekday clashes.
    ///
    /// Returns `false` when the pupil already holds the club.
    pub fn add_allocation(
        &mut self,
        pupil_id: &str,
        club_key: &ClubKey,
    ) -> Result<bool, AdjustmentError> {
        let pupil = self
            .pupils
            .get_mut(pupil_id)
            .ok_or_else(|| AdjustmentError::UnknownPupil(pupil_id.to_string()))?;
        let club = self
            .clubs
            .lookup_mut(club_key)
            .ok_or_else(|| AdjustmentError::UnknownClub(club_key.clone()))?;

        let added = if pupil.holds(club_key) || club.holds(pupil_id) {
            false
        } else {
            commit(pupil, club);
            true
        };

        self.verify_pair(pupil_id, club_key)?;
        if added {
            info!(pupil = pupil_id, club = %club_key, "allocation added manually");
        }
        Ok(added)
    }

    /// Removes a pupil from a club. Returns `false` when there was nothing to remove.
    pub fn remove_allocation(
        &mut self,
        pupil_id: &str,
        club_key: &ClubKey,
    ) -> Result<bool, AdjustmentError> {
        let pupil = self
            .pupils
            .get_mut(pupil_id)
            .ok_or_else(|| AdjustmentError::UnknownPupil(pupil_id.to_string()))?;
        let club = self
            .clubs
            .lookup_mut(club_key)
            .ok_or_else(|| AdjustmentError::UnknownClub(club_key.clone()))?;

        let removed = release(pupil, club);

        self.verify_pair(pupil_id, club_key)?;
        if removed {
            info!(pupil = pupil_id, club = %club_key, "allocation removed manually");
        }
        Ok(removed)
    }

    /// Checks that every pupil-to-club link is mirrored by a club-to-pupil link and vice versa.
    pub fn verify_membership(&self) -> Result<(), AdjustmentError> {
        for pupil in self.pupils.iter() {
            for key in pupil.allocated() {
                let mirrored = self
                    .clubs
                    .lookup(key)
                    .is_some_and(|club| club.holds(pupil.id()));
                if !mirrored {
                    return Err(AdjustmentError::MembershipMismatch {
                        pupil: pupil.id().to_string(),
                        club: key.clone(),
                    });
                }
            }
        }

        for club in self.clubs.iter() {
            for pupil_id in club.allocated() {
                let mirrored = self
                    .pupils
                    .get(pupil_id)
                    .is_some_and(|pupil| pupil.holds(club.key()));
                if !mirrored {
                    return Err(AdjustmentError::MembershipMismatch {
                        pupil: pupil_id.clone(),
                        club: club.key().clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn verify_pair(&self, pupil_id: &str, club_key: &ClubKey) -> Result<(), AdjustmentError> {
        let pupil_side = self
            .pupils
            .get(pupil_id)
            .is_some_and(|pupil| pupil.holds(club_key));
        let club_side = self
            .clubs
            .lookup(club_key)
            .is_some_and(|club| club.holds(pupil_id));

        if pupil_side == club_side {
            Ok(())
        } else {
            Err(AdjustmentError::MembershipMismatch {
                pupil: pupil_id.to_string(),
                club: club_key.clone(),
            })
        }
    }
}
