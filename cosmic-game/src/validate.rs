//! Structural and referential integrity checks for meets.
//!
//! Validation is advisory: it never fails, it only reports. Reflections are
//! not checked against picks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::Meet;

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            ok: issues.is_empty(),
            issues,
        }
    }
}

/// Validate a typed meet.
///
/// The collection shapes are guaranteed by the type, so only field presence
/// and pick → activity references can fail here. Use
/// [`validate_meet_value`] for untrusted JSON.
#[must_use]
pub fn validate_meet(meet: &Meet) -> ValidationReport {
    let mut issues = Vec::new();

    if meet.meet_id.is_empty() {
        issues.push("Missing meetId".to_string());
    }
    if meet.seed.is_empty() {
        issues.push("Missing seed".to_string());
    }

    for (i, activity) in meet.activities.iter().enumerate() {
        if activity.id.is_empty() {
            issues.push(format!("Activity {i} missing id"));
        }
        if activity.title.is_empty() {
            issues.push(format!("Activity {i} missing title"));
        }
    }

    for (i, pick) in meet.picks.iter().enumerate() {
        if pick.id.is_empty() {
            issues.push(format!("Pick {i} missing id"));
        }
        if pick.activity_id.is_empty() {
            issues.push(format!("Pick {i} missing activityId"));
        }
        if meet.activity(&pick.activity_id).is_none() {
            issues.push(format!(
                "Pick {i} references invalid activity {}",
                pick.activity_id
            ));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Validate a meet in its raw JSON form, before it is trusted enough to
/// deserialize.
#[must_use]
pub fn validate_meet_value(meet: &Value) -> ValidationReport {
    let mut issues = Vec::new();

    if !is_present(meet.get("meetId")) {
        issues.push("Missing meetId".to_string());
    }
    if !is_present(meet.get("seed")) {
        issues.push("Missing seed".to_string());
    }

    let activities = meet.get("activities").and_then(Value::as_array);
    let picks = meet.get("picks").and_then(Value::as_array);
    if activities.is_none() {
        issues.push("Activities must be array".to_string());
    }
    if picks.is_none() {
        issues.push("Picks must be array".to_string());
    }
    if meet.get("reflections").and_then(Value::as_array).is_none() {
        issues.push("Reflections must be array".to_string());
    }

    let activities = activities.map(Vec::as_slice).unwrap_or_default();
    for (i, activity) in activities.iter().enumerate() {
        if !is_present(activity.get("id")) {
            issues.push(format!("Activity {i} missing id"));
        }
        if !is_present(activity.get("title")) {
            issues.push(format!("Activity {i} missing title"));
        }
    }

    for (i, pick) in picks.map(Vec::as_slice).unwrap_or_default().iter().enumerate() {
        let activity_id = pick.get("activityId");
        if !is_present(pick.get("id")) {
            issues.push(format!("Pick {i} missing id"));
        }
        if !is_present(activity_id) {
            issues.push(format!("Pick {i} missing activityId"));
        }
        if !activities.iter().any(|a| a.get("id") == activity_id) {
            issues.push(format!(
                "Pick {i} references invalid activity {}",
                describe(activity_id)
            ));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Presence in the loose sense JSON producers use: not null, not false,
/// not zero, not the empty string.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "<missing>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
