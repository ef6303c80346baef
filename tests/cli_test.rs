//! CLI contract tests
//!
//! Runs the built binary against throwaway projects and checks output
//! formats, exit codes and the helper subcommands.

use std::path::Path;
use std::process::{Command, Output};

fn pulsecheck_bin() -> &'static str {
    env!("CARGO_BIN_EXE_pulsecheck")
}

fn setup_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"name": "cli-fixture", "version": "1.0.0", "dependencies": {"react": "^18.0.0"}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("src/List.tsx"),
        r#"export function List({ items }: { items: string[] }) {
  return <ul>{items.map((item) => <li>{item}</li>)}</ul>;
}
"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("src/legacy.js"), "var count = 0;\n").unwrap();
    dir
}

fn command() -> Command {
    let mut cmd = Command::new(pulsecheck_bin());
    cmd.env_remove("PULSECHECK_PRESET")
        .env_remove("PULSECHECK_AI_BACKEND")
        .env_remove("RUST_LOG");
    cmd
}

fn run_analyze(dir: &Path, extra_args: &[&str]) -> Output {
    command()
        .arg("analyze")
        .arg(dir)
        .arg("--no-progress")
        .args(extra_args)
        .output()
        .expect("Failed to run pulsecheck")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("Invalid JSON ({}): {}", e, stdout))
}

// ============================================================================
// analyze
// ============================================================================

#[test]
fn json_report_has_score_and_findings() {
    let dir = setup_project();
    let output = run_analyze(dir.path(), &["--format", "json"]);
    assert!(output.status.success(), "{:?}", output);

    let report = stdout_json(&output);
    // missing key (error) + var (warning)
    assert_eq!(report["healthScore"], 7.0);
    assert_eq!(report["project"]["projectName"], "cli-fixture");
    assert_eq!(report["platform"], "react");
    let rules: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["ruleId"].as_str())
        .collect();
    assert!(rules.contains(&"react-missing-key"));
    assert!(rules.contains(&"no-var"));
}

#[test]
fn fail_on_error_exits_one() {
    let dir = setup_project();
    let output = run_analyze(dir.path(), &["--format", "json", "--fail-on", "error"]);
    assert_eq!(output.status.code(), Some(1));
    // the report is still printed before exiting
    let report = stdout_json(&output);
    assert!(report["findings"].as_array().is_some_and(|f| !f.is_empty()));
}

#[test]
fn fail_on_is_quiet_when_threshold_not_reached() {
    let dir = setup_project();
    let output = run_analyze(
        dir.path(),
        &["--format", "json", "--rules", "no-var", "--fail-on", "error"],
    );
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["healthScore"], 9.0);
}

#[test]
fn missing_project_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let output = run_analyze(&missing, &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "{}", stderr);
}

#[test]
fn markdown_report_written_to_file() {
    let dir = setup_project();
    let report = dir.path().join("report.md");
    let output = run_analyze(
        dir.path(),
        &["--format", "md", "--output", report.to_str().unwrap()],
    );
    assert!(output.status.success(), "{:?}", output);
    let content = std::fs::read_to_string(&report).unwrap();
    assert!(content.contains("react-missing-key"));
    assert!(output.stdout.is_empty());
}

#[test]
fn table_output_without_terminal_has_no_ansi() {
    let dir = setup_project();
    let output = run_analyze(dir.path(), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("7.0"), "{}", stdout);
    assert!(!stdout.contains('\x1b'));
}

#[test]
fn project_file_preset_is_applied() {
    let dir = setup_project();
    std::fs::write(
        dir.path().join("pulsecheck.toml"),
        "preset = \"minimal\"\n[rules.no-var]\nenabled = false\n",
    )
    .unwrap();
    let output = run_analyze(dir.path(), &["--format", "json"]);
    let report = stdout_json(&output);
    let findings = report["findings"].as_array().unwrap();
    assert!(findings.iter().all(|f| f["ruleId"] != "no-var"));
}

#[test]
fn ai_without_key_records_error_and_keeps_report() {
    let dir = setup_project();
    let home = tempfile::tempdir().unwrap();
    let output = command()
        .arg("analyze")
        .arg(dir.path())
        .args(["--no-progress", "--format", "json", "--ai"])
        .env_remove("ANTHROPIC_API_KEY")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let report = stdout_json(&output);
    assert_eq!(report["aiEnhanced"], false);
    assert!(report["aiError"]
        .as_str()
        .is_some_and(|e| e.contains("ANTHROPIC_API_KEY")));
    assert_eq!(report["healthScore"], 7.0);
}

// ============================================================================
// rules / init
// ============================================================================

#[test]
fn rules_json_lists_catalog() {
    let output = command()
        .args(["rules", "--json", "--preset", "minimal"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let listing = stdout_json(&output);
    assert_eq!(listing["preset"], "minimal");
    let rules = listing["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 13);
    let no_var = rules.iter().find(|r| r["id"] == "no-var").unwrap();
    assert_eq!(no_var["enabled"], false);
}

#[test]
fn init_creates_config_once() {
    let dir = tempfile::tempdir().unwrap();
    let output = command().arg("init").arg(dir.path()).output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    let written = std::fs::read_to_string(dir.path().join("pulsecheck.toml")).unwrap();
    assert!(written.contains("preset"));

    std::fs::write(dir.path().join("pulsecheck.toml"), "preset = \"strict\"\n").unwrap();
    let output = command().arg("init").arg(dir.path()).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("pulsecheck.toml")).unwrap(),
        "preset = \"strict\"\n"
    );
}
