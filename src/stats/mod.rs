//! Usage statistics over Open Know-How (OKH) v1 manifests
//!
//! Downloads the manifests listed in the OKH project list, then counts how
//! often every (dotted) key occurs across all of them.

use crate::error::{Result, SyncError};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const OKH_LIST_URL: &str =
    "https://raw.githubusercontent.com/OpenKnowHow/okh-search/master/projects_okhs.csv";
pub const LIST_FILE: &str = "projects.csv";
pub const MANIFEST_SUFFIX: &str = "-okh.yml";

/// Occurrences per dotted key path
pub type KeyStats = BTreeMap<String, usize>;

#[derive(Debug, Default)]
pub struct DownloadStats {
    pub num_entries: usize,
    pub num_success: usize,
    /// Manifests per `scheme://host`
    pub url_bases: BTreeMap<String, usize>,
    /// HTTP error codes per `scheme://host`
    pub error_url_codes: BTreeMap<String, BTreeMap<u16, usize>>,
    pub error_code_reason: BTreeMap<u16, String>,
}

/// File name friendly version of a project name
pub fn urlify(name: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let name = non_word.replace_all(name, "");
    whitespace.replace_all(&name, "-").into_owned()
}

fn url_base(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => String::new(),
    }
}

pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("okh-stats/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` into `path`, replacing an existing file
    pub async fn download(&self, url: &str, path: &Path) -> Result<()> {
        tracing::info!("Downloading {} to {} ...", url, path.display());
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(path, &body).await?;
        Ok(())
    }

    /// Download the project list and every manifest it names into `dir`
    pub async fn download_all(&self, list_url: &str, dir: &Path) -> Result<DownloadStats> {
        tokio::fs::create_dir_all(dir).await?;

        let list_path = dir.join(LIST_FILE);
        self.download(list_url, &list_path).await?;

        let mut stats = DownloadStats::default();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&list_path)?;

        for record in reader.records() {
            let record = record?;
            stats.num_entries += 1;

            let (Some(name), Some(url)) = (record.get(0), record.get(2)) else {
                tracing::warn!("Skipping incomplete project list row: {:?}", record);
                continue;
            };
            let url = url.trim();
            let target = dir.join(format!("{}{}", urlify(name), MANIFEST_SUFFIX));

            let base = url_base(url);
            *stats.url_bases.entry(base.clone()).or_default() += 1;

            match self.download(url, &target).await {
                Ok(()) => stats.num_success += 1,
                Err(SyncError::Http(e)) if e.status().is_some() => {
                    let status = e.status().unwrap_or_default();
                    tracing::warn!(
                        "Failed to download {} to {}: {}",
                        url,
                        target.display(),
                        status
                    );
                    stats.error_code_reason.insert(
                        status.as_u16(),
                        status.canonical_reason().unwrap_or_default().to_string(),
                    );
                    *stats
                        .error_url_codes
                        .entry(base)
                        .or_default()
                        .entry(status.as_u16())
                        .or_default() += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to download {} to {}: {}", url, target.display(), e);
                }
            }
        }

        Ok(stats)
    }
}

/// Read a manifest, dropping its first line and the stray `@` before values
pub fn parse_manifest(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let body = content.split_once('\n').map_or("", |(_, rest)| rest);
    let cleaned = body.replace(": @", ": ");
    Ok(serde_yaml::from_str(&cleaned)?)
}

/// Count the keys of `mapping`, nested keys joined with `.`
pub fn append_stats(stats: &mut KeyStats, mapping: &Mapping, prefix: &str) {
    for (key, value) in mapping {
        let key = format!("{}{}", prefix, key_name(key));
        count_value(stats, &key, value);
    }
}

fn count_value(stats: &mut KeyStats, key: &str, value: &Value) {
    match value {
        Value::Mapping(mapping) => append_stats(stats, mapping, &format!("{}.", key)),
        Value::Sequence(entries) => {
            for entry in entries {
                match entry {
                    Value::Mapping(mapping) => append_stats(stats, mapping, &format!("{}.", key)),
                    _ => *stats.entry(key.to_string()).or_default() += 1,
                }
            }
        }
        Value::Tagged(tagged) => count_value(stats, key, &tagged.value),
        _ => *stats.entry(key.to_string()).or_default() += 1,
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// All `*-okh.yml` files in `dir`, sorted by name
pub fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| SyncError::Config(format!("Non UTF-8 path: {}", dir.display())))?;
    let pattern = format!("{}/*{}", glob::Pattern::escape(dir_str), MANIFEST_SUFFIX);

    let paths = glob::glob(&pattern).map_err(|e| SyncError::Config(e.to_string()))?;
    let mut files: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
    files.sort();
    Ok(files)
}

/// Count keys over all manifests in `dir`
///
/// Returns the statistics and the number of parsed files. Manifests that
/// fail to parse are reported and left out.
pub fn gather_stats(dir: &Path) -> Result<(KeyStats, usize)> {
    let mut stats = KeyStats::new();
    let mut parsed = 0;

    for path in manifest_files(dir)? {
        tracing::debug!("Parsing {}", path.display());
        match parse_manifest(&path) {
            Ok(Value::Mapping(mapping)) => {
                append_stats(&mut stats, &mapping, "");
                parsed += 1;
            }
            Ok(_) => tracing::warn!("{} is not a YAML mapping, skipping", path.display()),
            Err(e) => tracing::warn!("Failed to parse {}: {}", path.display(), e),
        }
    }

    Ok((stats, parsed))
}

/// Entries in ascending order of occurrence, ties by key
pub fn sorted_by_count(stats: &KeyStats) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = stats.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    entries
}

pub fn write_stats(path: &Path, stats: &KeyStats, parsed_files: usize) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (key, count) in sorted_by_count(stats) {
        writeln!(out, "{:40} {}", key, count)?;
    }
    writeln!(out)?;
    writeln!(out, "{:40} {}", "Parsed-files", parsed_files)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_urlify() {
        assert_eq!(urlify("Open Source Ventilator"), "Open-Source-Ventilator");
        assert_eq!(urlify("Foo (v2.0) / Bar"), "Foo-v20-Bar");
        assert_eq!(urlify("Hand  Pump_Drill"), "Hand-Pump_Drill");
        assert_eq!(urlify("Größe"), "Größe");
    }

    #[test]
    fn test_url_base() {
        assert_eq!(url_base("https://github.com/a/b/okh.yml"), "https://github.com");
        assert_eq!(url_base("http://example.org:8080/x"), "http://example.org:8080");
        assert_eq!(url_base("not a url"), "");
    }

    #[test]
    fn test_append_stats_nested() {
        let value: Value = serde_yaml::from_str(
            r#"
title: Widget
licensor:
  name: Jane
  email: jane@example.org
keywords: [a, b, c]
bom:
  - name: gear
    qty: 2
  - name: bolt
"#,
        )
        .unwrap();
        let Value::Mapping(mapping) = value else {
            panic!("expected mapping");
        };

        let mut stats = KeyStats::new();
        append_stats(&mut stats, &mapping, "");

        assert_eq!(stats["title"], 1);
        assert_eq!(stats["licensor.name"], 1);
        assert_eq!(stats["licensor.email"], 1);
        assert_eq!(stats["keywords"], 3);
        assert_eq!(stats["bom.name"], 2);
        assert_eq!(stats["bom.qty"], 1);
        assert!(!stats.contains_key("licensor"));
    }

    #[test]
    fn test_parse_manifest_skips_first_line_and_at_signs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("widget-okh.yml");
        std::fs::write(
            &path,
            "%YAML 1.2 garbage that must be skipped: [\ntitle: @Widget\nversion: 1.0\n",
        )
        .unwrap();

        let Value::Mapping(mapping) = parse_manifest(&path).unwrap() else {
            panic!("expected mapping");
        };
        assert_eq!(
            mapping.get("title"),
            Some(&Value::String("Widget".to_string()))
        );
    }

    #[test]
    fn test_gather_and_write_stats() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("a-okh.yml"),
            "---\ntitle: A\nlicense: MIT\nlicensor:\n  name: X\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("b-okh.yml"), "---\ntitle: B\n").unwrap();
        std::fs::write(dir.path().join("broken-okh.yml"), "---\ntitle: [unclosed\n").unwrap();
        std::fs::write(dir.path().join("projects.csv"), "name,x,url\n").unwrap();

        let (stats, parsed) = gather_stats(dir.path()).unwrap();
        assert_eq!(parsed, 2);
        assert_eq!(stats["title"], 2);

        let out = dir.path().join("stats.txt");
        write_stats(&out, &stats, parsed).unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], format!("{:40} 1", "license"));
        assert_eq!(lines[1], format!("{:40} 1", "licensor.name"));
        assert_eq!(lines[2], format!("{:40} 2", "title"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], format!("{:40} 2", "Parsed-files"));
    }

    #[test]
    fn test_sorted_by_count_breaks_ties_by_key() {
        let stats: KeyStats = [("b", 1), ("a", 1), ("c", 0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(sorted_by_count(&stats), vec![("c", 0), ("a", 1), ("b", 1)]);
    }
}
