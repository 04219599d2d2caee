use cosmic_game::{Activity, Meet, MeetSession, Snapshot};
use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "cosmic-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_cosmic-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("determinism"));
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_cosmic-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "all",
            "--seeds",
            "cosmic-1337,sim:2",
            "--iterations",
            "1",
            "--rounds",
            "6",
            "--pool-size",
            "3",
            "--simulations",
            "1000",
            "--tolerance",
            "0.1",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cosmic Connection Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["results"].as_array().map(Vec::len), Some(21));
    assert_eq!(report["fairness"]["within_tolerance"], true);
    assert_eq!(report["fairness"]["simulations"], 1000);
}

#[test]
fn cli_audits_a_snapshot_file() {
    let exe = env!("CARGO_BIN_EXE_cosmic-tester");
    let mut session = MeetSession::new(
        Meet::new("cli-meet", "CLI", "lq2", 0).with_activities(vec![
            Activity::new("a1", "Meditate").with_tags(["spiritual"]),
            Activity::new("a2", "Walk"),
        ]),
    );
    session.draw(1_000).expect("first draw");
    session.draw(2_000).expect("second draw");
    let snapshot = Snapshot::export(&[session.into_meet()], &[], 3_000);
    let snapshot_path = temp_path("snapshot");
    std::fs::write(&snapshot_path, snapshot.to_json_pretty().expect("json")).expect("write");

    let output_path = temp_path("audit");
    let status = Command::new(exe)
        .args(["--scenarios", "", "--skip-fairness", "--report", "json"])
        .arg("--snapshot")
        .arg(&snapshot_path)
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["audit"]["meets"][0]["meet_id"], "cli-meet");
    assert_eq!(report["audit"]["meets"][0]["code"], "LQ2-2-SP");
}

#[test]
fn cli_fails_on_unknown_scenario() {
    let exe = env!("CARGO_BIN_EXE_cosmic-tester");
    let status = Command::new(exe)
        .args(["--scenarios", "vehicle-system", "--skip-fairness"])
        .status()
        .expect("run cli");
    assert!(!status.success());
}
