use anyhow::{Context, Result};
use cosmic_game::{MeetSession, Snapshot, SummaryConfig, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetAudit {
    pub meet_id: String,
    pub title: String,
    pub picks: usize,
    pub validation: ValidationReport,
    pub code: String,
    pub total_time_min: u64,
    /// Whether a summary stored in the snapshot still matches the
    /// regenerated code; `None` when nothing was stored.
    pub stored_code_matches: Option<bool>,
    /// Rounds whose pick no longer follows from the seed and pool.
    pub replay_mismatches: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAudit {
    pub source: String,
    pub exported_at: i64,
    pub record_count: usize,
    pub orphan_records: usize,
    pub meets: Vec<MeetAudit>,
}

impl SnapshotAudit {
    /// An audit passes when every meet validates. Replay drift is
    /// informational: activities may legitimately be edited after a meet.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.meets.iter().all(|m| m.validation.ok)
    }
}

/// # Errors
///
/// Returns an error if the file cannot be read or is not a supported snapshot.
pub fn audit_snapshot_file(path: &Path, cfg: &SummaryConfig, now: i64) -> Result<SnapshotAudit> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = Snapshot::from_json(&raw)
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;
    Ok(audit_snapshot(&snapshot, &path.display().to_string(), cfg, now))
}

#[must_use]
pub fn audit_snapshot(
    snapshot: &Snapshot,
    source: &str,
    cfg: &SummaryConfig,
    now: i64,
) -> SnapshotAudit {
    let meets = snapshot
        .meets()
        .into_iter()
        .map(|meet| {
            let stored = snapshot
                .summaries
                .iter()
                .rev()
                .find(|s| s.meet_id == meet.meet_id)
                .map(|s| s.code.clone());
            let session = MeetSession::new(meet).with_summary_config(cfg.clone());
            let summary = session.summary(now);
            let validation = session.validate();
            if !validation.ok {
                log::warn!(
                    "meet {} failed validation: {:?}",
                    summary.meet_id,
                    validation.issues
                );
            }
            MeetAudit {
                meet_id: summary.meet_id.clone(),
                title: session.meet().title.clone(),
                picks: session.meet().picks.len(),
                validation,
                stored_code_matches: stored.map(|code| code == summary.code),
                total_time_min: summary.metrics.total_time_min,
                replay_mismatches: session.replay_mismatches(),
                code: summary.code,
            }
        })
        .collect();

    SnapshotAudit {
        source: source.to_string(),
        exported_at: snapshot.exported_at,
        record_count: snapshot.record_count(),
        orphan_records: snapshot.orphan_count(),
        meets,
    }
}
