use thiserror::Error;

use crate::data::{Meet, MeetStatus, Pick, Reflection};
use crate::lifecycle::{edit_duration, end_pick, start_pick};
use crate::picker::{pick_next, replay_mismatches};
use crate::reflection::append_reflection;
use crate::summary::{Summary, SummaryConfig, make_summary_with};
use crate::validate::{ValidationReport, validate_meet};

/// Errors raised when a session operation cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("meet {meet_id} is done; no further picks can be drawn")]
    Finished { meet_id: String },
    #[error("no eligible activity for round {round}")]
    NoEligibleActivity { round: usize },
    #[error("pick {0} does not belong to this meet")]
    UnknownPick(String),
}

/// High-level wrapper that owns a meet and threads its own history through
/// the pure picker and lifecycle functions.
#[derive(Debug, Clone)]
pub struct MeetSession {
    meet: Meet,
    summary_cfg: SummaryConfig,
}

impl MeetSession {
    #[must_use]
    pub fn new(meet: Meet) -> Self {
        Self {
            meet,
            summary_cfg: SummaryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_summary_config(mut self, cfg: SummaryConfig) -> Self {
        self.summary_cfg = cfg;
        self
    }

    #[must_use]
    pub const fn meet(&self) -> &Meet {
        &self.meet
    }

    #[must_use]
    pub fn into_meet(self) -> Meet {
        self.meet
    }

    #[must_use]
    pub const fn status(&self) -> MeetStatus {
        self.meet.status
    }

    /// Move a draft meet to live. Already-live meets stay live.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Finished`] if the meet is done.
    pub fn begin_live(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.meet.status = MeetStatus::Live;
        Ok(())
    }

    /// Close the meet. Closing twice is harmless.
    pub fn end_live(&mut self) {
        self.meet.status = MeetStatus::Done;
    }

    /// Draw the next pick and append it to the meet's history.
    ///
    /// # Errors
    ///
    /// Returns an error if the meet is done or nothing is eligible.
    pub fn draw(&mut self, now: i64) -> Result<&Pick, SessionError> {
        self.ensure_open()?;
        let round = self.meet.picks.len();
        let pick = pick_next(&self.meet.seed, &self.meet.activities, &self.meet.picks, now)
            .ok_or(SessionError::NoEligibleActivity { round })?;
        self.meet.picks.push(pick);
        Ok(&self.meet.picks[round])
    }

    /// # Errors
    ///
    /// Returns [`SessionError::UnknownPick`] if no pick has `pick_id`.
    pub fn start(&mut self, pick_id: &str, now: i64) -> Result<&Pick, SessionError> {
        self.update_pick(pick_id, |pick| start_pick(pick, now))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::UnknownPick`] if no pick has `pick_id`.
    pub fn end(&mut self, pick_id: &str, now: i64) -> Result<&Pick, SessionError> {
        self.update_pick(pick_id, |pick| end_pick(pick, now))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::UnknownPick`] if no pick has `pick_id`.
    pub fn edit_duration(&mut self, pick_id: &str, minutes: f64) -> Result<&Pick, SessionError> {
        self.update_pick(pick_id, |pick| edit_duration(pick, minutes))
    }

    pub fn reflect(&mut self, reflection: Reflection) {
        self.meet = append_reflection(&self.meet, reflection);
    }

    #[must_use]
    pub fn summary(&self, now: i64) -> Summary {
        make_summary_with(&self.meet, now, &self.summary_cfg)
    }

    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        validate_meet(&self.meet)
    }

    /// Rounds whose stored pick no longer replays from the seed.
    #[must_use]
    pub fn replay_mismatches(&self) -> Vec<u32> {
        replay_mismatches(&self.meet.seed, &self.meet.activities, &self.meet.picks)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.meet.status == MeetStatus::Done {
            return Err(SessionError::Finished {
                meet_id: self.meet.meet_id.clone(),
            });
        }
        Ok(())
    }

    fn update_pick(
        &mut self,
        pick_id: &str,
        transition: impl FnOnce(Pick) -> Pick,
    ) -> Result<&Pick, SessionError> {
        let index = self
            .meet
            .picks
            .iter()
            .position(|pick| pick.id == pick_id)
            .ok_or_else(|| SessionError::UnknownPick(pick_id.to_string()))?;
        let updated = transition(self.meet.picks[index].clone());
        self.meet.picks[index] = updated;
        Ok(&self.meet.picks[index])
    }
}
