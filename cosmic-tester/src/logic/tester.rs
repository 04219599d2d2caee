use colored::Colorize;
use cosmic_game::Activity;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{ScenarioCtx, TestScenario};
use super::seeds::SeedInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

/// Runs catalog scenarios against a shared activity pool.
pub struct LogicTester {
    pool: Vec<Activity>,
    rounds: u32,
    start_ms: i64,
    verbose: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(pool: Vec<Activity>, rounds: u32, start_ms: i64, verbose: bool) -> Self {
        Self {
            pool,
            rounds,
            start_ms,
            verbose,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|info| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {}, {})",
                        scenario.name.bright_white(),
                        info.seed,
                        info.origin
                    );
                }
                self.run_single_scenario(scenario, &info.seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &str,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            // Each iteration shifts the clock so pick ids differ between runs.
            let offset = i64::try_from(i).unwrap_or(i64::MAX);
            let ctx = ScenarioCtx {
                seed: seed.to_string(),
                activities: self.pool.clone(),
                rounds: self.rounds,
                now: self.start_ms.saturating_add(offset.saturating_mul(60_000)),
            };

            let start_time = Instant::now();
            match scenario.run(&ctx) {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?})",
                            i + 1,
                            iterations
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {seed}): {err:#}", i + 1);
                    log::info!("{}: {message}", scenario.name);
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed: seed.to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}
