//! Export/import snapshot shape shared with storage layers.
//!
//! Records are stored flat, each child record carrying its `meetId`, as
//! `{ version, exportedAt, meets, activities, picks, reflections, summaries }`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::SNAPSHOT_VERSION;
use crate::data::{Activity, Meet, MeetStatus, Pick, Reflection};
use crate::summary::Summary;
use crate::validate::{ValidationReport, validate_meet};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Meet header without its child collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetRecord {
    pub meet_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub seed: String,
    #[serde(default)]
    pub status: MeetStatus,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub meet_id: String,
    #[serde(flatten)]
    pub activity: Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickRecord {
    pub meet_id: String,
    #[serde(flatten)]
    pub pick: Pick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionRecord {
    pub meet_id: String,
    #[serde(flatten)]
    pub reflection: Reflection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportStats {
    pub imported: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub exported_at: i64,
    #[serde(default)]
    pub meets: Vec<MeetRecord>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
    #[serde(default)]
    pub picks: Vec<PickRecord>,
    #[serde(default)]
    pub reflections: Vec<ReflectionRecord>,
    #[serde(default)]
    pub summaries: Vec<Summary>,
}

impl Snapshot {
    #[must_use]
    pub fn empty(exported_at: i64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at,
            meets: Vec::new(),
            activities: Vec::new(),
            picks: Vec::new(),
            reflections: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Flatten meets and their cached summaries into a snapshot.
    #[must_use]
    pub fn export(meets: &[Meet], summaries: &[Summary], now: i64) -> Self {
        let mut snapshot = Self::empty(now);
        for meet in meets {
            let meet_id = &meet.meet_id;
            snapshot.meets.push(MeetRecord {
                meet_id: meet_id.clone(),
                title: meet.title.clone(),
                seed: meet.seed.clone(),
                status: meet.status,
                created_at: meet.created_at,
            });
            snapshot
                .activities
                .extend(meet.activities.iter().map(|activity| ActivityRecord {
                    meet_id: meet_id.clone(),
                    activity: activity.clone(),
                }));
            snapshot.picks.extend(meet.picks.iter().map(|pick| PickRecord {
                meet_id: meet_id.clone(),
                pick: pick.clone(),
            }));
            snapshot
                .reflections
                .extend(meet.reflections.iter().map(|reflection| ReflectionRecord {
                    meet_id: meet_id.clone(),
                    reflection: reflection.clone(),
                }));
        }
        snapshot.summaries = summaries.to_vec();
        snapshot
    }

    /// Parse a snapshot, rejecting versions this build does not understand.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the version is unsupported.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.meets.len()
            + self.activities.len()
            + self.picks.len()
            + self.reflections.len()
            + self.summaries.len()
    }

    /// Regroup the flat records into meets.
    ///
    /// Picks come back ordered by `pickedAt` and reflections by `createdAt`;
    /// records whose `meetId` has no header are left out.
    #[must_use]
    pub fn meets(&self) -> Vec<Meet> {
        self.meets
            .iter()
            .map(|header| {
                let belongs = |meet_id: &str| meet_id == header.meet_id;
                let mut picks: Vec<Pick> = self
                    .picks
                    .iter()
                    .filter(|r| belongs(&r.meet_id))
                    .map(|r| r.pick.clone())
                    .collect();
                picks.sort_by_key(|pick| pick.picked_at);
                let mut reflections: Vec<Reflection> = self
                    .reflections
                    .iter()
                    .filter(|r| belongs(&r.meet_id))
                    .map(|r| r.reflection.clone())
                    .collect();
                reflections.sort_by_key(|reflection| reflection.created_at);
                Meet {
                    meet_id: header.meet_id.clone(),
                    title: header.title.clone(),
                    seed: header.seed.clone(),
                    status: header.status,
                    activities: self
                        .activities
                        .iter()
                        .filter(|r| belongs(&r.meet_id))
                        .map(|r| r.activity.clone())
                        .collect(),
                    picks,
                    reflections,
                    created_at: header.created_at,
                }
            })
            .collect()
    }

    /// Child records that reference a meet missing from `meets`.
    #[must_use]
    pub fn orphan_count(&self) -> usize {
        let known = |meet_id: &str| self.meets.iter().any(|m| m.meet_id == meet_id);
        self.activities.iter().filter(|r| !known(&r.meet_id)).count()
            + self.picks.iter().filter(|r| !known(&r.meet_id)).count()
            + self.reflections.iter().filter(|r| !known(&r.meet_id)).count()
            + self.summaries.iter().filter(|s| !known(&s.meet_id)).count()
    }

    /// Validate every regrouped meet, keyed by meet id.
    #[must_use]
    pub fn validate(&self) -> Vec<(String, ValidationReport)> {
        self.meets()
            .iter()
            .map(|meet| (meet.meet_id.clone(), validate_meet(meet)))
            .collect()
    }

    /// Import `incoming` with put semantics: a record whose key already
    /// exists overwrites it, anything else is appended. With `replace` the
    /// current contents are discarded first.
    pub fn merge(&mut self, incoming: Self, replace: bool) -> ImportStats {
        let mut stats = ImportStats::default();
        if replace {
            stats.replaced = self.record_count();
            let exported_at = self.exported_at;
            *self = Self::empty(exported_at);
        }

        for record in incoming.meets {
            stats.record(upsert(&mut self.meets, record, |r| r.meet_id.clone()));
        }
        for record in incoming.activities {
            stats.record(upsert(&mut self.activities, record, |r| {
                (r.meet_id.clone(), r.activity.id.clone())
            }));
        }
        for record in incoming.picks {
            stats.record(upsert(&mut self.picks, record, |r| {
                (r.meet_id.clone(), r.pick.id.clone())
            }));
        }
        for record in incoming.reflections {
            stats.record(upsert(&mut self.reflections, record, |r| {
                (r.meet_id.clone(), r.reflection.id.clone())
            }));
        }
        for summary in incoming.summaries {
            stats.record(upsert(&mut self.summaries, summary, |s| {
                (s.meet_id.clone(), s.generated_at)
            }));
        }

        log::debug!(
            "merged snapshot: {} imported, {} replaced",
            stats.imported,
            stats.replaced
        );
        stats
    }
}

impl ImportStats {
    fn record(&mut self, overwrote: bool) {
        self.imported += 1;
        if overwrote {
            self.replaced += 1;
        }
    }
}

/// Returns `true` when an existing record with the same key was overwritten.
fn upsert<T, K: PartialEq>(target: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) -> bool {
    let wanted = key(&item);
    if let Some(slot) = target.iter_mut().find(|existing| key(existing) == wanted) {
        *slot = item;
        true
    } else {
        target.push(item);
        false
    }
}
