//! Cosmic Connection Engine
//!
//! Platform-agnostic core logic for the Cosmic Connection activity picker.
//! This crate provides seeded selection, pick timing, validation, and
//! session summaries without UI, storage, or clock dependencies: every
//! function that needs the current time takes it as a parameter.

pub mod constants;
pub mod data;
pub mod lifecycle;
pub mod numbers;
pub mod picker;
pub mod reflection;
pub mod seed;
pub mod session;
pub mod snapshot;
pub mod summary;
pub mod validate;

use anyhow::{Context, bail};

// Re-export commonly used types
pub use data::{Activity, Meet, MeetStatus, Pick, Reflection};
pub use lifecycle::{edit_duration, end_pick, start_pick};
pub use picker::{eligible, pick_next, replay_mismatches};
pub use reflection::append_reflection;
pub use seed::{fnv1a32, make_seed, rng};
pub use session::{MeetSession, SessionError};
pub use snapshot::{ImportStats, Snapshot, SnapshotError};
pub use summary::{
    Pattern, PatternEvidence, PatternKind, Summary, SummaryConfig, SummaryConfigError,
    SummaryMetrics, make_summary, make_summary_with,
};
pub use validate::{ValidationReport, validate_meet, validate_meet_value};

/// Trait for abstracting meet persistence.
/// Platform-specific implementations should provide this
pub trait MeetStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a meet with its activities, picks, and reflections
    ///
    /// # Errors
    ///
    /// Returns an error if the meet cannot be read.
    fn load_meet(&self, meet_id: &str) -> Result<Option<Meet>, Self::Error>;

    /// Persist a meet, replacing any previous version
    ///
    /// # Errors
    ///
    /// Returns an error if the meet cannot be written.
    fn save_meet(&self, meet: &Meet) -> Result<(), Self::Error>;

    /// Persist a generated summary
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be written.
    fn save_summary(&self, summary: &Summary) -> Result<(), Self::Error>;
}

/// Drives meets held by a [`MeetStore`] through the pure engine functions
pub struct MeetEngine<S>
where
    S: MeetStore,
{
    store: S,
    summary_cfg: SummaryConfig,
}

impl<S> MeetEngine<S>
where
    S: MeetStore,
{
    /// Create a new engine over the provided store
    pub fn new(store: S) -> Self {
        Self {
            store,
            summary_cfg: SummaryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_summary_config(mut self, cfg: SummaryConfig) -> Self {
        self.summary_cfg = cfg;
        self
    }

    /// Create and persist a draft meet
    ///
    /// # Errors
    ///
    /// Returns an error if the meet cannot be saved.
    pub fn create_meet(
        &self,
        meet_id: &str,
        title: &str,
        seed: &str,
        activities: Vec<Activity>,
        now: i64,
    ) -> anyhow::Result<Meet> {
        let meet = Meet::new(meet_id, title, seed, now).with_activities(activities);
        self.store
            .save_meet(&meet)
            .with_context(|| format!("failed to save meet {meet_id}"))?;
        Ok(meet)
    }

    /// Draw the next pick for a stored meet and persist it.
    ///
    /// `Ok(None)` means nothing was eligible this round.
    ///
    /// # Errors
    ///
    /// Returns an error if the meet is missing, done, or storage fails.
    pub fn draw_next(&self, meet_id: &str, now: i64) -> anyhow::Result<Option<Pick>> {
        let mut session = self.open(meet_id)?;
        let pick = match session.draw(now) {
            Ok(pick) => pick.clone(),
            Err(SessionError::NoEligibleActivity { round }) => {
                log::info!("meet {meet_id}: nothing eligible for round {round}");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        self.store
            .save_meet(session.meet())
            .with_context(|| format!("failed to save meet {meet_id}"))?;
        Ok(Some(pick))
    }

    /// Generate and persist a summary for a stored meet.
    ///
    /// Validation problems are logged, not fatal: a summary is still useful
    /// for a meet with a dangling reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the meet is missing or storage fails.
    pub fn summarize(&self, meet_id: &str, now: i64) -> anyhow::Result<Summary> {
        let session = self.open(meet_id)?;
        let report = session.validate();
        if !report.ok {
            log::warn!("meet {meet_id} has integrity issues: {:?}", report.issues);
        }
        let summary = session.summary(now);
        self.store
            .save_summary(&summary)
            .with_context(|| format!("failed to save summary for {meet_id}"))?;
        Ok(summary)
    }

    fn open(&self, meet_id: &str) -> anyhow::Result<MeetSession> {
        let Some(meet) = self
            .store
            .load_meet(meet_id)
            .with_context(|| format!("failed to load meet {meet_id}"))?
        else {
            bail!("meet {meet_id} not found");
        };
        Ok(MeetSession::new(meet).with_summary_config(self.summary_cfg.clone()))
    }
}
