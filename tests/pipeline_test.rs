//! End-to-end tests for the analysis pipeline
//!
//! Each test builds its own project in a temp directory.

use pulsecheck::config::{resolve, Overrides, RuleOverride};
use pulsecheck::detectors::catalog;
use pulsecheck::models::{Platform, Severity};
use pulsecheck::pipeline::{analyze_project, AnalysisOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LIST_COMPONENT: &str = r#"interface ListProps {
  items: any;
}

export function ItemList({ items }: ListProps) {
  return (
    <ul>
      {items.map((item: string) => (
        <li>{item}</li>
      ))}
    </ul>
  );
}
"#;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, content).expect("write fixture");
    }
    dir
}

#[test]
fn missing_key_and_any_under_recommended() {
    let dir = project(&[("src/ItemList.tsx", LIST_COMPONENT)]);
    let result = analyze_project(dir.path(), &AnalysisOptions::default()).unwrap();

    let errors: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    let warnings: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .collect();

    assert_eq!(result.findings.len(), 2, "{:#?}", result.findings);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule_id, catalog::REACT_MISSING_KEY);
    assert_eq!(errors[0].line, 9);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].rule_id, catalog::NO_EXPLICIT_ANY);
    assert_eq!((warnings[0].line, warnings[0].column), (2, 10));

    // 10 - 2 (error) - 1 (warning)
    assert_eq!(result.health_score, 7.0);
    assert!(!result.ai_enhanced);
    assert!(result.diagnostics.is_empty(), "{:#?}", result.diagnostics);

    let metrics = result.metrics.unwrap();
    assert_eq!(metrics.files_analyzed, 1);
    assert_eq!(metrics.by_category.get("correctness"), Some(&1));
    assert_eq!(metrics.by_category.get("type-safety"), Some(&1));
}

#[test]
fn findings_are_sorted_by_location() {
    let dir = project(&[
        ("b.js", "var b = 1;\n"),
        ("a.js", "if (x == y) {}\nvar a = 1;\n"),
    ]);
    let result = analyze_project(dir.path(), &AnalysisOptions::default()).unwrap();
    let order: Vec<(String, u32)> = result
        .findings
        .iter()
        .map(|f| (f.file.display().to_string(), f.line))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a.js".to_string(), 1),
            ("a.js".to_string(), 2),
            ("b.js".to_string(), 1)
        ]
    );
}

#[test]
fn explicit_rule_list_beats_minimal_preset() {
    let overrides = Overrides::new().with_enabled_rules(["react-missing-key"]);
    let resolved = resolve("minimal", &overrides);
    assert_eq!(resolved.config.enabled_rule_ids(), vec!["react-missing-key"]);

    // the same holds when the listed rule is one minimal turns off
    let overrides = Overrides::new().with_enabled_rules(["no-var"]);
    let resolved = resolve("minimal", &overrides);
    assert_eq!(resolved.config.enabled_rule_ids(), vec!["no-var"]);
}

#[test]
fn explicit_rule_list_applies_end_to_end() {
    let dir = project(&[("src/ItemList.tsx", LIST_COMPONENT)]);
    let options = AnalysisOptions::default()
        .with_preset("minimal")
        .with_overrides(Overrides::new().with_enabled_rules(["no-explicit-any"]));
    let result = analyze_project(dir.path(), &options).unwrap();
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].rule_id, catalog::NO_EXPLICIT_ANY);
    assert_eq!(result.health_score, 9.0);
}

#[test]
fn per_rule_severity_override() {
    let dir = project(&[("a.js", "var a = 1;\n")]);
    let options = AnalysisOptions::default().with_overrides(Overrides::new().with_rule(
        "no-var",
        RuleOverride {
            severity: Some(Severity::Error),
            ..RuleOverride::default()
        },
    ));
    let result = analyze_project(dir.path(), &options).unwrap();
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].severity, Severity::Error);
    assert_eq!(result.health_score, 8.0);
}

#[test]
fn manifest_metadata_is_attached() {
    let dir = project(&[
        (
            "package.json",
            r#"{"name": "storefront", "version": "2.0.1", "dependencies": {"react": "18"}}"#,
        ),
        ("src/index.ts", "export const ok: number = 1;\n"),
    ]);
    let result = analyze_project(dir.path(), &AnalysisOptions::default()).unwrap();
    assert_eq!(result.project.project_name, "storefront");
    assert_eq!(result.project.framework, "React");
    assert_eq!(result.platform, Platform::React);
    assert_eq!(result.health_score, 10.0);
}

#[test]
fn dependency_directories_are_skipped() {
    let dir = project(&[
        ("node_modules/lib/index.js", "var x = 1;\n"),
        ("dist/bundle.js", "var y = 1;\n"),
        ("src/types.d.ts", "declare const z: any;\n"),
        ("src/app.js", "const ok = 1;\n"),
    ]);
    let result = analyze_project(dir.path(), &AnalysisOptions::default()).unwrap();
    assert!(result.findings.is_empty(), "{:#?}", result.findings);
    assert_eq!(result.metrics.unwrap().files_analyzed, 1);
}

#[test]
fn missing_project_is_the_only_fatal_error() {
    let err = analyze_project(
        Path::new("/this/path/does/not/exist/pulsecheck"),
        &AnalysisOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn unknown_preset_falls_back_with_diagnostic() {
    let dir = project(&[("a.js", "var a = 1;\n")]);
    let options = AnalysisOptions::default().with_preset("extreme");
    let result = analyze_project(dir.path(), &options).unwrap();
    assert_eq!(result.findings.len(), 1);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("unknown preset 'extreme'")));
}

#[test]
fn unparseable_file_reports_nested_map_once() {
    let dir = project(&[(
        "src/L.jsx",
        "const L = ({ rows }) => <ul>{rows.map((r) => r.tags.map((t) => <b>{t}</b>))}</ul>;\n{{{\n",
    )]);
    let result = analyze_project(dir.path(), &AnalysisOptions::default()).unwrap();
    let keys: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == catalog::REACT_MISSING_KEY)
        .map(|f| (f.line, f.column))
        .collect();
    assert_eq!(keys, vec![(1, 64)]);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("falling back to text heuristics")));
}
