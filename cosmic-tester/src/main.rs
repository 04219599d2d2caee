mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use cosmic_game::SummaryConfig;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::{now_ms, split_csv};
use logic::reports::{
    RunReport, generate_console_report, generate_json_report, generate_markdown_report,
};
use logic::{
    FairnessAnalysis, FairnessConfig, LogicTester, ScenarioResult, SeedInfo, audit_snapshot_file,
    build_pool, get_scenario, list_scenarios, resolve_seed_inputs, run_fairness_analysis,
};

#[derive(Debug, Parser)]
#[command(name = "cosmic-tester", version = "0.1.0")]
#[command(about = "Automated QA for the Cosmic Connection engine")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for the whole catalog)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated literals, `sim:N`, or `fresh`)
    #[arg(long, default_value = "cosmic-1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Rounds drawn per meet
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,

    /// Activities in the generated pool
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pool_size: u64,

    /// Seeds sampled by the fairness analysis
    #[arg(long, default_value_t = 10_000)]
    simulations: usize,

    /// Allowed relative deviation per activity in the fairness analysis
    #[arg(long, default_value_t = 0.05)]
    tolerance: f64,

    /// Skip the fairness analysis
    #[arg(long)]
    skip_fairness: bool,

    /// Audit an exported snapshot file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// JSON file overriding summary generation settings
    #[arg(long)]
    summary_config: Option<PathBuf>,

    /// Fix the entropy used for `fresh` seeds
    #[arg(long)]
    entropy: Option<u64>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let now = now_ms();
    let summary_cfg = load_summary_config(args.summary_config.as_deref())?;
    let seeds = resolve_seeds(&args, now)?;

    let results = run_logic_scenarios(&args, &expand_scenarios(&args.scenarios), &seeds, now)?;
    let fairness = gather_fairness(&args);
    let audit = args
        .snapshot
        .as_deref()
        .map(|path| audit_snapshot_file(path, &summary_cfg, now))
        .transpose()?;

    let report = RunReport {
        results: &results,
        fairness: fairness.as_ref(),
        audit: audit.as_ref(),
    };
    write_reports(&args, &report, start_time)?;

    if !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🌌 Cosmic Connection Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.contains(&key) {
                scenarios.push(key);
            }
        }
    }
    scenarios
}

fn load_summary_config(path: Option<&Path>) -> Result<SummaryConfig> {
    let Some(path) = path else {
        return Ok(SummaryConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read summary config {}", path.display()))?;
    SummaryConfig::from_json(&raw)
        .with_context(|| format!("invalid summary config {}", path.display()))
}

fn resolve_seeds(args: &Args, now: i64) -> Result<Vec<SeedInfo>> {
    let tokens = split_csv(&args.seeds);
    let mut entropy: Box<dyn RngCore> = match args.entropy {
        Some(value) => Box::new(ChaCha8Rng::seed_from_u64(value)),
        None => Box::new(rand::thread_rng()),
    };
    resolve_seed_inputs(&tokens, now, entropy.as_mut())
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[SeedInfo],
    now: i64,
) -> Result<Vec<ScenarioResult>> {
    if scenarios.is_empty() {
        return Ok(Vec::new());
    }
    let pool_size = usize::try_from(args.pool_size).context("pool size too large")?;

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(build_pool(pool_size), args.rounds, now, args.verbose);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        let Some(scenario) = get_scenario(scenario_name) else {
            bail!("unknown scenario: {scenario_name}");
        };
        results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
    }
    Ok(results)
}

fn gather_fairness(args: &Args) -> Option<FairnessAnalysis> {
    if args.skip_fairness || args.simulations == 0 {
        return None;
    }
    let pool_size = usize::try_from(args.pool_size).ok()?;
    Some(run_fairness_analysis(&FairnessConfig {
        simulations: args.simulations,
        pool_size,
        tolerance: args.tolerance,
    }))
}

fn write_reports(args: &Args, report: &RunReport<'_>, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => generate_json_report(&mut output_target, report)?,
        "markdown" => generate_markdown_report(&mut output_target, report)?,
        _ => {
            let duration = start_time.elapsed();
            generate_console_report(&mut output_target, report, duration)?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
