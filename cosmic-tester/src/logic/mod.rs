pub mod audit;
pub mod fairness;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use audit::{SnapshotAudit, audit_snapshot_file};
pub use fairness::{FairnessAnalysis, FairnessConfig, run_fairness_analysis};
pub use scenarios::{build_pool, get_scenario, list_scenarios};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::{LogicTester, ScenarioResult};
