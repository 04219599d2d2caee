//! Round-by-round selection under the no-immediate-repeat rule.

use crate::constants::PICK_ID_PREFIX;
use crate::data::{Activity, Pick};
use crate::numbers::scale_to_index;
use crate::seed::rng;

/// Activities that may legally be picked after `history`.
///
/// Only the immediately preceding pick is excluded; anything picked earlier
/// is eligible again. Pool order is preserved because the selector indexes
/// into it.
#[must_use]
pub fn eligible<'a>(activities: &'a [Activity], history: &[Pick]) -> Vec<&'a Activity> {
    match history.last() {
        None => activities.iter().collect(),
        Some(last) => activities
            .iter()
            .filter(|activity| activity.id != last.activity_id)
            .collect(),
    }
}

/// Deterministically choose the pick for round `history.len()`.
///
/// Returns `None` when nothing is eligible, which is an expected outcome
/// (an empty pool, or a single activity that was just picked). For fixed
/// inputs the result is always the same; callers supply `now` and keep
/// `history` current.
#[must_use]
pub fn pick_next(seed: &str, activities: &[Activity], history: &[Pick], now: i64) -> Option<Pick> {
    let candidates = eligible(activities, history);
    let round = u32::try_from(history.len()).unwrap_or(u32::MAX);
    let draw = rng(seed, round);
    let index = scale_to_index(draw, candidates.len())?;
    let chosen = candidates[index];
    log::debug!(
        "round {round}: drew {draw:.6} -> {} ({} of {} eligible)",
        chosen.id,
        index + 1,
        candidates.len()
    );
    Some(Pick {
        id: pick_id(now, round),
        round,
        activity_id: chosen.id.clone(),
        rng: draw,
        picked_at: now,
        started_at: None,
        ended_at: None,
        edited_duration_minutes: None,
        duration_ms: None,
    })
}

/// Pick ids are unique within a meet because rounds never repeat.
#[must_use]
pub fn pick_id(now: i64, round: u32) -> String {
    format!("{PICK_ID_PREFIX}_{now}_{round}")
}

/// Re-derive every recorded pick from the seed and the picks before it.
///
/// Returns the rounds whose stored activity or draw no longer matches, e.g.
/// because the pool was edited after the pick was made.
#[must_use]
pub fn replay_mismatches(seed: &str, activities: &[Activity], picks: &[Pick]) -> Vec<u32> {
    picks
        .iter()
        .enumerate()
        .filter_map(|(i, recorded)| {
            let replayed = pick_next(seed, activities, &picks[..i], recorded.picked_at);
            let matches = replayed.is_some_and(|p| {
                p.activity_id == recorded.activity_id && p.rng.to_bits() == recorded.rng.to_bits()
            });
            (!matches).then_some(recorded.round)
        })
        .collect()
}
