use anyhow::Result;
use colored::Colorize;
use cosmic_game::numbers::usize_to_f64;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::{FairnessAnalysis, ScenarioResult, SnapshotAudit};

/// Everything a run produced, borrowed for rendering.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunReport<'a> {
    pub results: &'a [ScenarioResult],
    pub fairness: Option<&'a FairnessAnalysis>,
    pub audit: Option<&'a SnapshotAudit>,
}

impl RunReport<'_> {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
            && self.fairness.is_none_or(|f| f.within_tolerance)
            && self.audit.is_none_or(SnapshotAudit::passed)
    }

    fn success_rate(&self) -> f64 {
        let total = self.results.len();
        if total == 0 {
            return 0.0;
        }
        let passed = self.results.iter().filter(|r| r.passed).count();
        usize_to_f64(passed) / usize_to_f64(total) * 100.0
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &RunReport<'_>,
    total_duration: Duration,
) -> Result<()> {
    let results = report.results;
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenario runs: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", report.success_rate())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} [seed {}]",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let Some(fairness) = report.fairness {
        writeln!(out, "{}", "⚖️  Fairness Analysis".bright_yellow().bold())?;
        writeln!(out, "{}", "====================".yellow())?;
        writeln!(
            out,
            "Simulations: {} over {} activities (expected {:.1} each)",
            fairness.simulations, fairness.pool_size, fairness.expected
        )?;
        for (activity_id, count) in &fairness.distribution {
            writeln!(out, "   {activity_id:8} {count}")?;
        }
        writeln!(
            out,
            "Std dev: {:.2}  CV: {:.4}  Score: {:.4}",
            fairness.std_dev, fairness.coefficient_of_variation, fairness.fairness_score
        )?;
        let verdict = if fairness.within_tolerance {
            "within tolerance".green()
        } else {
            "outside tolerance".red()
        };
        writeln!(
            out,
            "Max deviation: {:.2}% ({verdict} of {:.2}%)",
            fairness.max_deviation * 100.0,
            fairness.tolerance * 100.0
        )?;
        writeln!(out)?;
    }

    if let Some(audit) = report.audit {
        writeln!(out, "{}", "🗂️  Snapshot Audit".bright_blue().bold())?;
        writeln!(out, "{}", "=================".blue())?;
        writeln!(
            out,
            "Source: {} ({} records, {} orphaned)",
            audit.source, audit.record_count, audit.orphan_records
        )?;
        for meet in &audit.meets {
            let status = if meet.validation.ok {
                "✅".green()
            } else {
                "❌".red()
            };
            writeln!(
                out,
                "{} {} {} - {} picks, {} min",
                status,
                meet.meet_id.bold(),
                meet.code,
                meet.picks,
                meet.total_time_min
            )?;
            for issue in &meet.validation.issues {
                writeln!(out, "     • {}", issue.red())?;
            }
            if !meet.replay_mismatches.is_empty() {
                writeln!(
                    out,
                    "     ↳ rounds {:?} no longer replay from the seed",
                    meet.replay_mismatches
                )?;
            }
            if meet.stored_code_matches == Some(false) {
                writeln!(out, "     ↳ stored summary code is stale")?;
            }
        }
        writeln!(out)?;
    }

    if !results.is_empty() {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        if let (Some(fastest), Some(slowest)) = (
            results.iter().min_by_key(|r| r.average_duration),
            results.iter().max_by_key(|r| r.average_duration),
        ) {
            writeln!(
                out,
                "Fastest: {} ({:?})",
                fastest.scenario_name.green(),
                fastest.average_duration
            )?;
            writeln!(
                out,
                "Slowest: {} ({:?})",
                slowest.scenario_name.yellow(),
                slowest.average_duration
            )?;
        }
    }

    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &RunReport<'_>) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &RunReport<'_>) -> Result<()> {
    let results = report.results;
    writeln!(out, "# Cosmic Connection Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenario runs**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", report.success_rate())?;

    if !results.is_empty() {
        writeln!(out, "## Detailed Results\n")?;
    }
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {} (seed `{}`)\n", status, result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }

    if let Some(fairness) = report.fairness {
        writeln!(out, "## Fairness\n")?;
        writeln!(out, "| Activity | Picks |")?;
        writeln!(out, "|----------|-------|")?;
        for (activity_id, count) in &fairness.distribution {
            writeln!(out, "| {activity_id} | {count} |")?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "- **Fairness score**: {:.4}\n- **Max deviation**: {:.2}% (tolerance {:.2}%)\n",
            fairness.fairness_score,
            fairness.max_deviation * 100.0,
            fairness.tolerance * 100.0
        )?;
    }

    if let Some(audit) = report.audit {
        writeln!(out, "## Snapshot Audit: `{}`\n", audit.source)?;
        writeln!(out, "| Meet | Code | Picks | Minutes | Issues |")?;
        writeln!(out, "|------|------|-------|---------|--------|")?;
        for meet in &audit.meets {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                meet.meet_id,
                meet.code,
                meet.picks,
                meet.total_time_min,
                meet.validation.issues.len()
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}
