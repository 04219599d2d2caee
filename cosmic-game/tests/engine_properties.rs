use std::collections::HashMap;

use cosmic_game::{
    Activity, Meet, Pick, edit_duration, eligible, end_pick, make_seed, pick_next, rng,
    start_pick, validate_meet, validate_meet_value,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

fn pool(size: usize) -> Vec<Activity> {
    (1..=size)
        .map(|i| Activity::new(format!("a{i}"), format!("Activity {i}")))
        .collect()
}

fn play(seed: &str, activities: &[Activity], rounds: usize) -> Vec<Pick> {
    let mut history = Vec::new();
    for round in 0..rounds {
        let now = 1_000 + i64::try_from(round).unwrap();
        match pick_next(seed, activities, &history, now) {
            Some(pick) => history.push(pick),
            None => break,
        }
    }
    history
}

#[test]
fn same_inputs_produce_the_same_pick() {
    let activities = pool(3);
    for seed in ["test-seed-123", "alpha", "", "🌌 cosmic"] {
        for round in 0..20 {
            assert_eq!(rng(seed, round).to_bits(), rng(seed, round).to_bits());
        }
        let first = pick_next(seed, &activities, &[], 1_000).unwrap();
        let second = pick_next(seed, &activities, &[], 1_000).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn whole_sessions_replay_identically() {
    let activities = pool(4);
    assert_eq!(play("replay", &activities, 50), play("replay", &activities, 50));
}

#[test]
fn no_activity_is_picked_twice_in_a_row() {
    let activities = pool(3);
    for i in 0..200 {
        let history = play(&format!("streak-{i}"), &activities, 25);
        assert_eq!(history.len(), 25);
        for pair in history.windows(2) {
            assert_ne!(pair[0].activity_id, pair[1].activity_id);
        }
    }
}

#[test]
fn rounds_count_up_from_zero() {
    let history = play("rounds", &pool(5), 10);
    let rounds: Vec<u32> = history.iter().map(|p| p.round).collect();
    assert_eq!(rounds, (0..10).collect::<Vec<_>>());
}

#[test]
fn draws_are_uniform_across_seeds() {
    let activities = pool(3);
    let simulations = 10_000;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for i in 0..simulations {
        let pick = pick_next(&format!("sim-{i}"), &activities, &[], 0).unwrap();
        *counts.entry(pick.activity_id).or_default() += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let expected = simulations as f64 / activities.len() as f64;
    let tolerance = expected * 0.05;
    assert_eq!(counts.len(), 3);
    for (id, count) in counts {
        #[allow(clippy::cast_precision_loss)]
        let delta = (count as f64 - expected).abs();
        assert!(delta <= tolerance, "{id} drawn {count} times, expected ~{expected}");
    }
}

#[test]
fn lone_activity_cannot_follow_itself() {
    let activities = pool(1);
    let history = play("solo", &activities, 5);
    assert_eq!(history.len(), 1);
    assert!(eligible(&activities, &history).is_empty());
}

#[test]
fn history_with_unknown_last_activity_keeps_whole_pool() {
    let activities = pool(3);
    let mut history = play("ghost", &activities, 1);
    history[0].activity_id = "retired".to_string();
    assert_eq!(eligible(&activities, &history).len(), 3);
}

#[test]
fn timing_overwrites_and_edits_take_precedence() {
    let pick = pick_next("timer", &pool(2), &[], 1_000_000).unwrap();
    let started = start_pick(start_pick(pick, 1_000_000), 1_060_000);
    assert_eq!(started.started_at, Some(1_060_000));
    let ended = end_pick(started, 1_360_000);
    assert_eq!(ended.effective_duration_ms(), Some(300_000));
    let edited = edit_duration(ended, 10.0);
    assert_eq!(edited.duration_ms, Some(600_000));
    assert_eq!(edited.effective_duration_ms(), Some(600_000));
}

#[test]
fn validator_accepts_consistent_sessions() {
    let activities = pool(3);
    let mut meet = Meet::new("m1", "Friday", "seed", 0).with_activities(activities.clone());
    meet.picks = play("seed", &activities, 6);
    let report = validate_meet(&meet);
    assert!(report.ok, "{:?}", report.issues);
}

#[test]
fn validator_flags_broken_sessions() {
    let mut meet = Meet::new("", "Broken", "seed", 0).with_activities(pool(2));
    meet.picks = play("seed", &pool(3), 3);
    let report = validate_meet(&meet);
    assert!(!report.ok);
    assert!(report.issues.iter().any(|i| i == "Missing meetId"));

    let raw = json!({
        "meetId": "m1",
        "seed": "seed",
        "activities": [{ "title": "No ID" }],
        "picks": [],
        "reflections": [],
    });
    let report = validate_meet_value(&raw);
    assert!(!report.ok);
    assert_eq!(report.issues, vec!["Activity 0 missing id".to_string()]);
}

#[test]
fn seeds_are_reproducible_from_entropy() {
    let mut a = ChaCha8Rng::seed_from_u64(42);
    let mut b = ChaCha8Rng::seed_from_u64(42);
    assert_eq!(make_seed(1_700_000_000_000, &mut a), make_seed(1_700_000_000_000, &mut b));
    let fresh: Vec<String> = (0..100).map(|_| make_seed(5, &mut a)).collect();
    let mut unique = fresh.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), fresh.len());
}
