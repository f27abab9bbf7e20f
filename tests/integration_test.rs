use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn ont2wb_bin() -> String {
    env!("CARGO_BIN_EXE_ont2wb").to_string()
}

fn okh_stats_bin() -> String {
    env!("CARGO_BIN_EXE_okh-stats").to_string()
}

const ONTOLOGY: &str = r#"@prefix ex: <http://example.org/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

ex:base a owl:Ontology ;
    rdfs:label "Example ontology"@en .

ex:Widget a owl:Class ;
    rdfs:label "Widget"@en ;
    rdfs:comment "A thing"@en ;
    ex:hasComponent ex:Gear .

ex:Gear a owl:Class ;
    rdfs:label "Gear"@en .

ex:hasComponent a owl:ObjectProperty ;
    rdfs:label "has component"@en ;
    rdfs:domain ex:Widget ;
    rdfs:range ex:Gear .
"#;

/// Temp dir with the ontology and an empty config file
fn setup(ontology: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ontology.ttl"), ontology).unwrap();
    fs::write(dir.path().join("config.toml"), "").unwrap();
    dir
}

fn run_dry(dir: &Path, extra: &[&str]) -> std::process::Output {
    Command::new(ont2wb_bin())
        .args([
            dir.join("ontology.ttl").to_str().unwrap(),
            "--config",
            dir.join("config.toml").to_str().unwrap(),
            "--links",
            dir.join("links.ttl").to_str().unwrap(),
            "--base-uri",
            "http://example.org/base",
            "--dry-run",
        ])
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_help() {
    let output = Command::new(ont2wb_bin()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--skip-existing-claims"));
}

#[test]
fn test_dry_run() {
    let dir = setup(ONTOLOGY);

    let output = run_dry(dir.path(), &[]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dry-run complete"));
    // Dry runs never write the link file
    assert!(!dir.path().join("links.ttl").exists());
}

#[test]
fn test_dry_run_json_output() {
    let dir = setup(ONTOLOGY);

    let output = run_dry(dir.path(), &["--json"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let count = |kind: &str| events.iter().filter(|e| e["type"] == kind).count();
    assert_eq!(count("start"), 1);
    assert_eq!(count("entity_created"), 3);
    assert_eq!(count("claim_added"), 1);
    // rdfs:domain and rdfs:range
    assert_eq!(count("claim_skipped"), 2);

    let summary = events.last().unwrap();
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["entities_created"], 3);
}

#[test]
fn test_unclassified_subject_fails() {
    let dir = setup(
        r#"@prefix ex: <http://example.org/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
ex:restriction a owl:Restriction .
"#,
    );

    let output = run_dry(dir.path(), &["--quiet"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("http://example.org/restriction"));
}

#[test]
fn test_missing_credentials() {
    let dir = setup(ONTOLOGY);

    let output = Command::new(ont2wb_bin())
        .arg(dir.path().join("ontology.ttl").to_str().unwrap())
        .env_remove("WB_USER")
        .env_remove("WB_PASSWORD")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--dry-run"));
}

#[test]
fn test_okh_stats_existing_dir() {
    let dir = TempDir::new().unwrap();
    let okh_dir = dir.path().join("okh1_files");
    fs::create_dir(&okh_dir).unwrap();
    fs::write(
        okh_dir.join("Widget-okh.yml"),
        "# generated\ntitle: @Widget\nlicense:\n  hardware: CERN-OHL-S-2.0\nkeywords: [a, b]\n",
    )
    .unwrap();
    fs::write(okh_dir.join("Gear-okh.yml"), "# generated\ntitle: Gear\n").unwrap();
    fs::write(okh_dir.join("notes.yml"), "# ignored\nother: 1\n").unwrap();
    let stats_file = dir.path().join("stats.txt");

    let output = Command::new(okh_stats_bin())
        .args([stats_file.to_str().unwrap(), okh_dir.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let content = fs::read_to_string(&stats_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("{:40} 1", "license.hardware").as_str(),
            format!("{:40} 2", "keywords").as_str(),
            format!("{:40} 2", "title").as_str(),
            "",
            format!("{:40} 2", "Parsed-files").as_str(),
        ]
    );
    assert!(!content.contains("other"));
}
