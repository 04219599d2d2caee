use anyhow::{Context, Result, anyhow, ensure};

use cosmic_game::constants::{MS_PER_MINUTE, NARRATIVE_CLOSING};
use cosmic_game::picker::pick_id;
use cosmic_game::summary::divine_code;
use cosmic_game::{
    Activity, Meet, MeetSession, PatternKind, SessionError, SummaryConfig, validate_meet,
};

const TAG_PALETTE: &[&str] = &["spiritual", "calm", "creative", "joy", "focus", "outdoor"];

/// Inputs for one scenario iteration.
#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub seed: String,
    pub activities: Vec<Activity>,
    pub rounds: u32,
    pub now: i64,
}

impl ScenarioCtx {
    fn session(&self) -> MeetSession {
        let meet = Meet::new(
            format!("meet-{}", self.seed),
            "Scenario meet",
            self.seed.clone(),
            self.now,
        )
        .with_activities(self.activities.clone());
        MeetSession::new(meet)
    }

    /// Rounds a pool of this size can fill before running dry.
    fn expected_picks(&self) -> usize {
        let rounds = usize::try_from(self.rounds).unwrap_or(usize::MAX);
        match self.activities.len() {
            0 => 0,
            1 => rounds.min(1),
            _ => rounds,
        }
    }

    /// Draw up to `rounds` picks, one second apart, stopping at the first
    /// round with nothing eligible.
    fn play(&self) -> Result<MeetSession> {
        let mut session = self.session();
        session.begin_live()?;
        for round in 0..self.rounds {
            let at = self.now + i64::from(round) * 1_000;
            match session.draw(at) {
                Ok(_) => {}
                Err(SessionError::NoEligibleActivity { .. }) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(session)
    }
}

pub type ScenarioCheck = fn(&ScenarioCtx) -> Result<()>;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: &'static str,
    pub check: ScenarioCheck,
}

impl TestScenario {
    fn new(name: &str, description: &'static str, check: ScenarioCheck) -> Self {
        Self {
            name: name.to_string(),
            description,
            check,
        }
    }

    /// # Errors
    ///
    /// Returns the first expectation the scenario violated.
    pub fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        (self.check)(ctx)
    }
}

fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario::new("smoke", "Play a meet and check every pick is well formed", smoke),
        TestScenario::new(
            "determinism",
            "Replaying a seed reproduces the same picks",
            determinism,
        ),
        TestScenario::new(
            "no-repeat",
            "No activity is picked twice in a row",
            no_repeat,
        ),
        TestScenario::new(
            "single-activity",
            "A lone activity is picked once, then nothing is eligible",
            single_activity,
        ),
        TestScenario::new(
            "lifecycle",
            "Start, end, and edit a pick's duration",
            lifecycle,
        ),
        TestScenario::new(
            "summary",
            "Summary metrics, code, and narrative track the played meet",
            summary,
        ),
        TestScenario::new(
            "validation",
            "Played meets validate and corrupted ones do not",
            validation,
        ),
    ]
}

#[must_use]
pub fn list_scenarios() -> Vec<(String, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.name, scenario.description))
        .collect()
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    catalog().into_iter().find(|scenario| scenario.name == name)
}

/// Deterministic pool of `size` activities, each carrying two tags.
#[must_use]
pub fn build_pool(size: usize) -> Vec<Activity> {
    (0..size)
        .map(|i| {
            let first = TAG_PALETTE[i % TAG_PALETTE.len()];
            let second = TAG_PALETTE[(i + 1) % TAG_PALETTE.len()];
            Activity::new(format!("a{}", i + 1), format!("Activity {}", i + 1))
                .with_tags([first, second])
                .with_est_minutes(5.0)
        })
        .collect()
}

fn smoke(ctx: &ScenarioCtx) -> Result<()> {
    let session = ctx.play()?;
    let meet = session.meet();
    ensure!(
        meet.picks.len() == ctx.expected_picks(),
        "expected {} picks, drew {}",
        ctx.expected_picks(),
        meet.picks.len()
    );
    for (i, pick) in meet.picks.iter().enumerate() {
        let round = u32::try_from(i)?;
        ensure!(pick.round == round, "pick {i} carries round {}", pick.round);
        ensure!(
            pick.id == pick_id(pick.picked_at, round),
            "pick {i} has malformed id {}",
            pick.id
        );
        ensure!(
            (0.0..1.0).contains(&pick.rng),
            "pick {i} rng {} out of range",
            pick.rng
        );
        ensure!(
            meet.activity(&pick.activity_id).is_some(),
            "pick {i} references unknown activity {}",
            pick.activity_id
        );
    }
    Ok(())
}

fn determinism(ctx: &ScenarioCtx) -> Result<()> {
    let first = ctx.play()?;
    let second = ctx.play()?;
    ensure!(
        first.meet().picks == second.meet().picks,
        "seed {} produced different picks on replay",
        ctx.seed
    );
    let mismatches = first.replay_mismatches();
    ensure!(
        mismatches.is_empty(),
        "rounds {mismatches:?} do not replay from the seed"
    );
    Ok(())
}

fn no_repeat(ctx: &ScenarioCtx) -> Result<()> {
    let session = ctx.play()?;
    for pair in session.meet().picks.windows(2) {
        ensure!(
            pair[0].activity_id != pair[1].activity_id,
            "{} repeated in rounds {} and {}",
            pair[1].activity_id,
            pair[0].round,
            pair[1].round
        );
    }
    Ok(())
}

fn single_activity(ctx: &ScenarioCtx) -> Result<()> {
    let lone = ctx
        .activities
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("scenario needs at least one activity"))?;
    let solo = ScenarioCtx {
        activities: vec![lone.clone()],
        ..ctx.clone()
    };
    let mut session = solo.session();
    let first = session.draw(ctx.now)?;
    ensure!(
        first.activity_id == lone.id,
        "lone activity {} was not picked first",
        lone.id
    );
    match session.draw(ctx.now + 1_000) {
        Err(SessionError::NoEligibleActivity { round: 1 }) => Ok(()),
        Ok(pick) => Err(anyhow!("drew {} after the lone activity", pick.activity_id)),
        Err(err) => Err(anyhow!("unexpected error: {err}")),
    }
}

fn lifecycle(ctx: &ScenarioCtx) -> Result<()> {
    let mut session = ctx.session();
    let pick_id = session
        .draw(ctx.now)
        .context("first draw failed")?
        .id
        .clone();

    session.start(&pick_id, ctx.now)?;
    let restarted_at = ctx.now + 1_000;
    let started = session.start(&pick_id, restarted_at)?;
    ensure!(
        started.started_at == Some(restarted_at),
        "restarting did not overwrite startedAt"
    );

    let ended = session.end(&pick_id, restarted_at + 5 * MS_PER_MINUTE)?;
    ensure!(
        (ended.tracked_minutes() - 5.0).abs() < f64::EPSILON,
        "expected 5 tracked minutes, got {}",
        ended.tracked_minutes()
    );

    let edited = session.edit_duration(&pick_id, 7.5)?;
    ensure!(
        edited.effective_duration_ms() == Some(450_000),
        "edited duration not preferred: {:?}",
        edited.effective_duration_ms()
    );

    ensure!(
        session.start("pick_missing", ctx.now).is_err(),
        "starting an unknown pick succeeded"
    );
    Ok(())
}

fn summary(ctx: &ScenarioCtx) -> Result<()> {
    let mut session = ctx.play()?;
    let ids: Vec<(String, i64)> = session
        .meet()
        .picks
        .iter()
        .map(|p| (p.id.clone(), p.picked_at))
        .collect();
    for (id, at) in &ids {
        session.start(id, *at)?;
        session.end(id, *at + MS_PER_MINUTE)?;
    }

    let summary = session.summary(ctx.now);
    let metrics = &summary.metrics;
    ensure!(
        metrics.total_activities == ctx.activities.len(),
        "totalActivities {} != pool size {}",
        metrics.total_activities,
        ctx.activities.len()
    );
    ensure!(
        metrics.total_time_min == u64::try_from(ids.len())?,
        "totalTimeMin {} != {} one-minute picks",
        metrics.total_time_min,
        ids.len()
    );
    let picked: u32 = metrics.activity_frequency.values().sum();
    ensure!(
        usize::try_from(picked)? == ids.len(),
        "frequency map counts {picked} picks, meet has {}",
        ids.len()
    );

    let expected_code = divine_code(
        &ctx.seed,
        ids.len(),
        metrics.top_tags.first(),
        &SummaryConfig::default(),
    );
    ensure!(
        summary.code == expected_code,
        "code {} does not match {expected_code}",
        summary.code
    );
    ensure!(
        summary.code.contains(&format!("-{}-", ids.len())),
        "code {} does not carry the pick count",
        summary.code
    );
    ensure!(
        summary.narrative.ends_with(NARRATIVE_CLOSING),
        "narrative lacks its closing line"
    );
    if !ctx.activities.is_empty() {
        ensure!(
            summary.pattern(PatternKind::TagResonance).is_some(),
            "tagged pool produced no tag resonance"
        );
    }
    Ok(())
}

fn validation(ctx: &ScenarioCtx) -> Result<()> {
    let session = ctx.play()?;
    let report = session.validate();
    ensure!(report.ok, "played meet failed validation: {:?}", report.issues);

    let mut meet = session.into_meet();
    let Some(pick) = meet.picks.first_mut() else {
        return Ok(());
    };
    pick.activity_id = "ghost".to_string();
    let report = validate_meet(&meet);
    ensure!(!report.ok, "dangling pick reference passed validation");
    ensure!(
        report
            .issues
            .iter()
            .any(|issue| issue == "Pick 0 references invalid activity ghost"),
        "missing dangling-reference issue: {:?}",
        report.issues
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pool: usize, rounds: u32) -> ScenarioCtx {
        ScenarioCtx {
            seed: "cosmic-1337".to_string(),
            activities: build_pool(pool),
            rounds,
            now: 1_700_000_000_000,
        }
    }

    #[test]
    fn every_catalog_scenario_passes_on_a_normal_pool() {
        let ctx = ctx(4, 8);
        for (name, _) in list_scenarios() {
            let scenario = get_scenario(&name).expect("listed scenario exists");
            scenario
                .run(&ctx)
                .unwrap_or_else(|err| panic!("{name} failed: {err:#}"));
        }
    }

    #[test]
    fn scenarios_tolerate_a_single_activity_pool() {
        let ctx = ctx(1, 5);
        for (name, _) in list_scenarios() {
            let scenario = get_scenario(&name).expect("listed scenario exists");
            scenario
                .run(&ctx)
                .unwrap_or_else(|err| panic!("{name} failed: {err:#}"));
        }
    }

    #[test]
    fn unknown_scenarios_are_not_found() {
        assert!(get_scenario("vehicle-system").is_none());
    }

    #[test]
    fn pool_ids_and_tags_are_stable() {
        let pool = build_pool(7);
        assert_eq!(pool[0].id, "a1");
        assert_eq!(pool[6].tags, vec!["spiritual", "calm"]);
    }
}
