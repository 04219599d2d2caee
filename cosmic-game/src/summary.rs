//! Post-session analytics: metrics, patterns, the Divine Code, and the
//! narrative line.
//!
//! A summary is a report derived from a meet. Generating it again just
//! produces a new report; nothing in here mutates the meet.
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    CODE_SEPARATOR, DEFAULT_CODE_PLACEHOLDER, DEFAULT_CODE_SEED_LEN, DEFAULT_CODE_TAG_LEN,
    DEFAULT_TOP_TAG_LIMIT, NARRATIVE_CLOSING, NARRATIVE_TEMPLATE_COUNT,
    PATTERN_REPEATED_ACTIVITIES, PATTERN_TAG_RESONANCE,
};
use crate::data::Meet;
use crate::numbers::round_f64_to_u64;

/// Most-used tags, highest count first.
pub type TopTags = SmallVec<[String; DEFAULT_TOP_TAG_LIMIT]>;

/// Tuning for summary generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub top_tag_limit: usize,
    pub code_seed_len: usize,
    pub code_tag_len: usize,
    pub code_placeholder: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_tag_limit: DEFAULT_TOP_TAG_LIMIT,
            code_seed_len: DEFAULT_CODE_SEED_LEN,
            code_tag_len: DEFAULT_CODE_TAG_LEN,
            code_placeholder: DEFAULT_CODE_PLACEHOLDER.to_string(),
        }
    }
}

/// Errors raised when a summary configuration is unusable.
#[derive(Debug, Error)]
pub enum SummaryConfigError {
    #[error("summary config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
    #[error("code placeholder must not be empty")]
    EmptyPlaceholder,
}

impl SummaryConfig {
    /// Parse and validate a configuration; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, SummaryConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns an error when a length is zero or the placeholder is empty.
    pub fn validate(&self) -> Result<(), SummaryConfigError> {
        for (field, value) in [
            ("top_tag_limit", self.top_tag_limit),
            ("code_seed_len", self.code_seed_len),
            ("code_tag_len", self.code_tag_len),
        ] {
            if value == 0 {
                return Err(SummaryConfigError::Zero { field });
            }
        }
        if self.code_placeholder.is_empty() {
            return Err(SummaryConfigError::EmptyPlaceholder);
        }
        Ok(())
    }
}

/// Named finding surfaced in a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    RepeatedActivities,
    TagResonance,
}

impl PatternKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RepeatedActivities => PATTERN_REPEATED_ACTIVITIES,
            Self::TagResonance => PATTERN_TAG_RESONANCE,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence backing a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternEvidence {
    /// `(activity id, pick count)` pairs.
    ActivityCounts(Vec<(String, u32)>),
    Tags(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern: PatternKind,
    pub evidence: PatternEvidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_activities: usize,
    /// Older exports may carry negative or fractional totals; those load
    /// rounded and clamped at zero.
    #[serde(deserialize_with = "clamped_minutes")]
    pub total_time_min: u64,
    pub activity_frequency: BTreeMap<String, u32>,
    pub top_tags: TopTags,
    pub first_pick_distribution: BTreeMap<String, u32>,
}

fn clamped_minutes<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = f64::deserialize(deserializer)?;
    Ok(round_f64_to_u64(minutes))
}

/// Analytic report for one meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub meet_id: String,
    pub generated_at: i64,
    pub code: String,
    pub metrics: SummaryMetrics,
    pub patterns: Vec<Pattern>,
    pub narrative: String,
}

impl Summary {
    #[must_use]
    pub fn pattern(&self, kind: PatternKind) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.pattern == kind)
    }
}

/// Summarize `meet` with the default configuration.
#[must_use]
pub fn make_summary(meet: &Meet, now: i64) -> Summary {
    make_summary_with(meet, now, &SummaryConfig::default())
}

/// Summarize `meet`. Never fails: an empty meet yields zero metrics, the
/// placeholder code segment, and the first narrative template.
#[must_use]
pub fn make_summary_with(meet: &Meet, now: i64, cfg: &SummaryConfig) -> Summary {
    let activity_frequency = count_by_activity(meet, |_| true);
    let first_pick_distribution = count_by_activity(meet, |round| round == 0);
    let total_minutes: f64 = meet.picks.iter().map(crate::data::Pick::tracked_minutes).sum();
    let total_time_min = round_f64_to_u64(total_minutes);
    let top_tags = top_tags(meet, cfg.top_tag_limit);
    let patterns = detect_patterns(meet, &activity_frequency, &top_tags);
    let code = divine_code(&meet.seed, meet.picks.len(), top_tags.first(), cfg);
    let narrative = narrative(
        meet.picks.len(),
        meet.activities.len(),
        total_time_min,
        &patterns,
    );
    log::debug!(
        "summarized meet {} -> {code} ({} picks, {} patterns)",
        meet.meet_id,
        meet.picks.len(),
        patterns.len()
    );

    Summary {
        meet_id: meet.meet_id.clone(),
        generated_at: now,
        code,
        metrics: SummaryMetrics {
            total_activities: meet.activities.len(),
            total_time_min,
            activity_frequency,
            top_tags,
            first_pick_distribution,
        },
        patterns,
        narrative,
    }
}

fn count_by_activity(meet: &Meet, include_round: impl Fn(u32) -> bool) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for pick in meet.picks.iter().filter(|p| include_round(p.round)) {
        *counts.entry(pick.activity_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Tags by descending count; equal counts keep first-encountered order.
fn top_tags(meet: &Meet, limit: usize) -> TopTags {
    let mut order: Vec<(&str, u32)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for tag in meet.activities.iter().flat_map(|a| a.tags.iter()) {
        if let Some(&slot) = slots.get(tag.as_str()) {
            order[slot].1 += 1;
        } else {
            slots.insert(tag.as_str(), order.len());
            order.push((tag.as_str(), 1));
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(limit)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn detect_patterns(
    meet: &Meet,
    frequency: &BTreeMap<String, u32>,
    top_tags: &TopTags,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    let mut repeated: Vec<(String, u32)> = Vec::new();
    for pick in &meet.picks {
        let count = frequency.get(&pick.activity_id).copied().unwrap_or(0);
        if count > 1 && !repeated.iter().any(|(id, _)| *id == pick.activity_id) {
            repeated.push((pick.activity_id.clone(), count));
        }
    }
    if !repeated.is_empty() {
        patterns.push(Pattern {
            pattern: PatternKind::RepeatedActivities,
            evidence: PatternEvidence::ActivityCounts(repeated),
        });
    }

    if !top_tags.is_empty() {
        patterns.push(Pattern {
            pattern: PatternKind::TagResonance,
            evidence: PatternEvidence::Tags(top_tags.to_vec()),
        });
    }

    patterns
}

/// `<SEED prefix>-<pick count>-<TOP TAG prefix | placeholder>`, uppercased.
#[must_use]
pub fn divine_code(
    seed: &str,
    pick_count: usize,
    top_tag: Option<&String>,
    cfg: &SummaryConfig,
) -> String {
    let seed_part = prefix_upper(seed, cfg.code_seed_len);
    let tag_part = top_tag.map_or_else(
        || cfg.code_placeholder.to_uppercase(),
        |tag| prefix_upper(tag, cfg.code_tag_len),
    );
    [seed_part, pick_count.to_string(), tag_part].join(CODE_SEPARATOR)
}

/// First `len` UTF-16 units of `text`, uppercased. A surrogate pair that
/// would straddle the cut is left out whole.
fn prefix_upper(text: &str, len: usize) -> String {
    let mut units = 0;
    text.chars()
        .take_while(|c| {
            units += c.len_utf16();
            units <= len
        })
        .collect::<String>()
        .to_uppercase()
}

fn narrative(
    pick_count: usize,
    activity_count: usize,
    total_minutes: u64,
    patterns: &[Pattern],
) -> String {
    let mut text = match pick_count % NARRATIVE_TEMPLATE_COUNT {
        0 => format!(
            "The universe guided {pick_count} moments of connection across {total_minutes} minutes."
        ),
        1 => format!(
            "Through {activity_count} possibilities, the cosmos chose a path of discovery."
        ),
        _ => format!("{pick_count} divine selections wove together a tapestry of shared experience."),
    };

    if !patterns.is_empty() {
        let names: Vec<&str> = patterns.iter().map(|p| p.pattern.as_str()).collect();
        text.push_str(&format!(" Patterns emerged: {}.", names.join(", ")));
    }

    text.push_str(NARRATIVE_CLOSING);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Activity, Pick};

    fn pick(round: u32, activity_id: &str) -> Pick {
        Pick {
            id: format!("pick_{round}"),
            round,
            activity_id: activity_id.to_string(),
            rng: 0.5,
            picked_at: 1_000,
            started_at: None,
            ended_at: None,
            edited_duration_minutes: None,
            duration_ms: None,
        }
    }

    #[test]
    fn top_tags_break_ties_by_first_encounter() {
        let meet = Meet::new("m", "t", "seed", 0).with_activities(vec![
            Activity::new("a1", "One").with_tags(["calm", "joy"]),
            Activity::new("a2", "Two").with_tags(["joy", "focus", "calm"]),
            Activity::new("a3", "Three").with_tags(["focus", "art"]),
        ]);
        let tags = top_tags(&meet, 3);
        assert_eq!(tags.as_slice(), ["calm", "joy", "focus"]);
    }

    #[test]
    fn code_uses_placeholder_without_tags() {
        let cfg = SummaryConfig::default();
        assert_eq!(divine_code("abcdef", 4, None, &cfg), "ABC-4-XX");
        let tag = "spiritual".to_string();
        assert_eq!(divine_code("ab", 0, Some(&tag), &cfg), "AB-0-SP");
    }

    #[test]
    fn code_prefixes_count_utf16_units() {
        let cfg = SummaryConfig::default();
        assert_eq!(divine_code("🌌abc", 0, None, &cfg), "🌌A-0-XX");
        let tag = "a🌌b".to_string();
        assert_eq!(divine_code("xyz", 1, Some(&tag), &cfg), "XYZ-1-A");
        assert_eq!(divine_code("éclair", 2, None, &cfg), "ÉCL-2-XX");
    }

    #[test]
    fn negative_stored_totals_load_as_zero() {
        let metrics: SummaryMetrics = serde_json::from_value(serde_json::json!({
            "totalActivities": 2,
            "totalTimeMin": -3,
            "activityFrequency": {},
            "topTags": [],
            "firstPickDistribution": {}
        }))
        .unwrap();
        assert_eq!(metrics.total_time_min, 0);
        let metrics: SummaryMetrics = serde_json::from_value(serde_json::json!({
            "totalActivities": 0,
            "totalTimeMin": 7.6,
            "activityFrequency": {},
            "topTags": [],
            "firstPickDistribution": {}
        }))
        .unwrap();
        assert_eq!(metrics.total_time_min, 8);
    }

    #[test]
    fn narrative_rotates_templates_and_appends_patterns() {
        let none = narrative(3, 2, 15, &[]);
        assert_eq!(
            none,
            "The universe guided 3 moments of connection across 15 minutes. The connection deepens."
        );
        let patterns = vec![
            Pattern {
                pattern: PatternKind::RepeatedActivities,
                evidence: PatternEvidence::ActivityCounts(vec![("a1".to_string(), 2)]),
            },
            Pattern {
                pattern: PatternKind::TagResonance,
                evidence: PatternEvidence::Tags(vec!["calm".to_string()]),
            },
        ];
        let both = narrative(2, 2, 0, &patterns);
        assert_eq!(
            both,
            "2 divine selections wove together a tapestry of shared experience. \
             Patterns emerged: repeated_activities, tag_resonance. The connection deepens."
        );
    }

    #[test]
    fn repeated_activities_list_counts_in_pick_order() {
        let mut meet = Meet::new("m", "t", "seed", 0).with_activities(vec![
            Activity::new("a1", "One"),
            Activity::new("a2", "Two"),
        ]);
        meet.picks = vec![pick(0, "a2"), pick(1, "a1"), pick(2, "a2"), pick(3, "a1"), pick(4, "a2")];
        let summary = make_summary(&meet, 9);
        assert_eq!(
            summary.pattern(PatternKind::RepeatedActivities).map(|p| &p.evidence),
            Some(&PatternEvidence::ActivityCounts(vec![
                ("a2".to_string(), 3),
                ("a1".to_string(), 2),
            ]))
        );
        assert!(summary.pattern(PatternKind::TagResonance).is_none());
        assert_eq!(summary.metrics.first_pick_distribution.get("a2"), Some(&1));
        assert_eq!(summary.metrics.activity_frequency.get("a1"), Some(&2));
    }

    #[test]
    fn total_time_prefers_span_then_edited_minutes() {
        let mut meet = Meet::new("m", "t", "seed", 0)
            .with_activities(vec![Activity::new("a1", "One"), Activity::new("a2", "Two")]);
        let mut timed = pick(0, "a1");
        timed.started_at = Some(0);
        timed.ended_at = Some(90_000);
        timed.edited_duration_minutes = Some(30.0);
        let mut edited = pick(1, "a2");
        edited.edited_duration_minutes = Some(4.2);
        meet.picks = vec![timed, edited, pick(2, "a1")];
        // 1.5 + 4.2 = 5.7
        assert_eq!(make_summary(&meet, 0).metrics.total_time_min, 6);
    }

    #[test]
    fn empty_meet_summarizes_to_defaults() {
        let meet = Meet::new("empty", "", "s", 0);
        let summary = make_summary(&meet, 77);
        assert_eq!(summary.generated_at, 77);
        assert_eq!(summary.code, "S-0-XX");
        assert_eq!(summary.metrics, SummaryMetrics::default());
        assert!(summary.patterns.is_empty());
        assert_eq!(
            summary.narrative,
            "The universe guided 0 moments of connection across 0 minutes. The connection deepens."
        );
    }

    #[test]
    fn config_rejects_zero_lengths() {
        assert!(SummaryConfig::from_json(r#"{"top_tag_limit": 1}"#).is_ok());
        assert!(matches!(
            SummaryConfig::from_json(r#"{"code_tag_len": 0}"#),
            Err(SummaryConfigError::Zero { field: "code_tag_len" })
        ));
        assert!(matches!(
            SummaryConfig::from_json(r#"{"code_placeholder": ""}"#),
            Err(SummaryConfigError::EmptyPlaceholder)
        ));
        assert!(matches!(
            SummaryConfig::from_json("{"),
            Err(SummaryConfigError::Parse(_))
        ));
    }

    #[test]
    fn patterns_serialize_with_snake_case_names() {
        let pattern = Pattern {
            pattern: PatternKind::TagResonance,
            evidence: PatternEvidence::Tags(vec!["calm".to_string()]),
        };
        let value = serde_json::to_value(&pattern).unwrap();
        assert_eq!(value, serde_json::json!({ "pattern": "tag_resonance", "evidence": ["calm"] }));
    }
}
