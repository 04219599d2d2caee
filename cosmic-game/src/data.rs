use serde::{Deserialize, Serialize};

/// One entry of the activity pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_minutes: Option<f64>,
}

impl Activity {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tags: Vec::new(),
            est_minutes: None,
        }
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_est_minutes(mut self, minutes: f64) -> Self {
        self.est_minutes = Some(minutes);
        self
    }
}

/// A single selection made for one round of a meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub id: String,
    pub round: u32,
    pub activity_id: String,
    /// Raw draw that produced this pick, kept for replay audits.
    pub rng: f64,
    pub picked_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_duration_minutes: Option<f64>,
    /// Written alongside `edited_duration_minutes`; see [`Pick::effective_duration_ms`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

/// A participant's note attached to a pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub id: String,
    pub pick_id: String,
    #[serde(default)]
    pub user_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    pub created_at: i64,
}

/// Lifecycle status of a meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetStatus {
    #[default]
    Draft,
    Live,
    #[serde(alias = "ended")]
    Done,
}

impl std::fmt::Display for MeetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Live => write!(f, "live"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// One run of the picker: its pool, seed, and everything drawn so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meet {
    pub meet_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub seed: String,
    #[serde(default)]
    pub status: MeetStatus,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub picks: Vec<Pick>,
    #[serde(default)]
    pub reflections: Vec<Reflection>,
    #[serde(default)]
    pub created_at: i64,
}

impl Meet {
    #[must_use]
    pub fn new(
        meet_id: impl Into<String>,
        title: impl Into<String>,
        seed: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            meet_id: meet_id.into(),
            title: title.into(),
            seed: seed.into(),
            status: MeetStatus::Draft,
            activities: Vec::new(),
            picks: Vec::new(),
            reflections: Vec::new(),
            created_at,
        }
    }

    #[must_use]
    pub fn with_activities(mut self, activities: Vec<Activity>) -> Self {
        self.activities = activities;
        self
    }

    /// Load a meet from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a meet.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    #[must_use]
    pub fn pick(&self, id: &str) -> Option<&Pick> {
        self.picks.iter().find(|pick| pick.id == id)
    }

    #[must_use]
    pub fn last_pick(&self) -> Option<&Pick> {
        self.picks.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meet_from_json_fills_defaults() {
        let json = r#"{
            "meetId": "m1",
            "seed": "abc",
            "status": "ended",
            "activities": [{ "id": "a1", "title": "Meditate" }]
        }"#;
        let meet = Meet::from_json(json).unwrap();
        assert_eq!(meet.status, MeetStatus::Done);
        assert!(meet.picks.is_empty());
        assert!(meet.activity("a1").unwrap().tags.is_empty());
        assert_eq!(meet.title, "");
    }

    #[test]
    fn pick_serializes_camel_case_and_skips_unset_timing() {
        let pick = Pick {
            id: "pick_1_0".to_string(),
            round: 0,
            activity_id: "a1".to_string(),
            rng: 0.25,
            picked_at: 1,
            started_at: None,
            ended_at: None,
            edited_duration_minutes: None,
            duration_ms: None,
        };
        let value = serde_json::to_value(&pick).unwrap();
        assert_eq!(value["activityId"], "a1");
        assert_eq!(value["pickedAt"], 1);
        assert!(value.get("startedAt").is_none());
    }

    #[test]
    fn status_displays_lowercase() {
        assert_eq!(MeetStatus::Live.to_string(), "live");
        assert_eq!(MeetStatus::default(), MeetStatus::Draft);
    }
}
