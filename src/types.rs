//! Core types for readiness scoring.

use serde::{Serialize, Serializer, ser::SerializeMap};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Completion ratio a level must reach to unlock.
pub const GATE: f64 = 0.8;

/// Bumped whenever the serialized report shape changes.
pub const SCHEMA_VERSION: &str = "0.2.0";

pub const INTEGRATION_TIMEOUT: Duration = Duration::from_secs(90);

/// A discovered workspace member, or the repository root as a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    #[serde(skip_serializing)]
    pub id: String,
    /// Posix-style path relative to the repo root; `"."` for the root itself.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl AppInfo {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let description = (path == ".").then(|| "Repository root".to_string());
        Self {
            id: path.clone(),
            path,
            description,
            kind: None,
        }
    }
}

/// Snapshot of git state. Every field is independently unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitMetadata {
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
    pub has_local_changes: Option<bool>,
    /// `None` when no upstream is configured.
    pub has_non_remote_commits: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CiProvider {
    Github,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SignalsSource {
    Github,
}

/// Run-time toggles. Everything defaults to off.
#[derive(Debug, Clone, Default)]
pub struct ReadinessOptions {
    /// Scan source files for tracing/metrics usage when a dependency is
    /// present but no instrumentation entrypoint file is.
    pub telemetry_scan: bool,
    /// Execute resolved integration-test commands.
    pub run_integration: bool,
    pub ci_provider: Option<CiProvider>,
    pub signals: Option<SignalsSource>,
}

impl ReadinessOptions {
    /// Whether CI-workflow-dependent checks are opted in.
    pub fn github_signals(&self) -> bool {
        self.ci_provider == Some(CiProvider::Github) || self.signals == Some(SignalsSource::Github)
    }
}

/// Limits for bounded tree walks.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory names never descended into.
    pub skip_dirs: Vec<&'static str>,
    /// Extensions considered source code for pattern scans.
    pub source_extensions: Vec<&'static str>,
    pub max_files: usize,
    pub max_file_bytes: u64,
    /// Wall-clock limit for one app's integration test run.
    pub integration_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_dirs: vec![
                "node_modules",
                "target",
                "build",
                "dist",
                ".git",
                "__pycache__",
                ".venv",
                "venv",
                "vendor",
                ".next",
                "out",
                "coverage",
            ],
            source_extensions: vec![
                "rs", "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "rb", "java", "kt",
                "cs", "php", "ex", "exs", "scala",
            ],
            max_files: 2000,
            max_file_bytes: 256 * 1024,
            integration_timeout: INTEGRATION_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Repo,
    App,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pillar {
    Documentation,
    #[serde(rename = "Style & Validation")]
    StyleValidation,
    #[serde(rename = "Build System")]
    BuildSystem,
    Testing,
    #[serde(rename = "Dev Environment")]
    DevEnvironment,
    Observability,
    Security,
    Deployment,
    Autonomy,
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Pillar::Documentation => "Documentation",
            Pillar::StyleValidation => "Style & Validation",
            Pillar::BuildSystem => "Build System",
            Pillar::Testing => "Testing",
            Pillar::DevEnvironment => "Dev Environment",
            Pillar::Observability => "Observability",
            Pillar::Security => "Security",
            Pillar::Deployment => "Deployment",
            Pillar::Autonomy => "Autonomy",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    NotApplicable,
    /// Skipped because a required option was not enabled.
    NotEvaluated,
}

/// Output of a single evaluator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionCheck {
    pub status: Status,
    pub rationale: String,
    pub evidence: Vec<String>,
}

impl CriterionCheck {
    pub fn pass(rationale: impl Into<String>) -> Self {
        Self::with_status(Status::Pass, rationale)
    }

    pub fn fail(rationale: impl Into<String>) -> Self {
        Self::with_status(Status::Fail, rationale)
    }

    pub fn not_evaluated(rationale: impl Into<String>) -> Self {
        Self::with_status(Status::NotEvaluated, rationale)
    }

    pub fn with_evidence(mut self, evidence: impl IntoIterator<Item = String>) -> Self {
        self.evidence.extend(evidence);
        self
    }

    fn with_status(status: Status, rationale: impl Into<String>) -> Self {
        Self {
            status,
            rationale: rationale.into(),
            evidence: Vec::new(),
        }
    }
}

/// Aggregated result of one criterion across its scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionResult {
    pub id: String,
    pub title: String,
    pub level: u8,
    pub pillar: Pillar,
    pub scope: Scope,
    pub numerator: u32,
    pub denominator: u32,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failing_apps: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaMeta {
    #[serde(skip_serializing)]
    pub id: String,
    pub level: u8,
    pub scope: Scope,
    pub pillar: Pillar,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDetail {
    pub completion: f64,
    pub evaluated_count: u32,
    pub pass_count: u32,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub achieved_level: u8,
    pub next_level: Option<u8>,
    pub gate: f64,
    pub levels: BTreeMap<u8, LevelDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub criterion_id: String,
    pub title: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_provider: Option<CiProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_source: Option<SignalsSource>,
    pub notes: String,
}

/// The full output of one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub schema_version: String,
    pub tool_version: String,
    pub report_id: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub repo_root: String,
    pub repo_url: Option<String>,
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
    pub has_local_changes: Option<bool>,
    pub has_non_remote_commits: Option<bool>,
    #[serde(serialize_with = "keyed_by_id")]
    pub apps: Vec<AppInfo>,
    #[serde(serialize_with = "keyed_by_id")]
    pub report: Vec<CriterionResult>,
    #[serde(serialize_with = "keyed_by_id")]
    pub criteria_meta: Vec<CriteriaMeta>,
    pub levels: BTreeMap<u8, LevelDetail>,
    pub level_summary: LevelSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<SignalsSummary>,
    pub action_items: Vec<ActionItem>,
}

impl ReadinessReport {
    pub fn result(&self, id: &str) -> Option<&CriterionResult> {
        self.report.iter().find(|r| r.id == id)
    }

    pub fn meta(&self, id: &str) -> Option<&CriteriaMeta> {
        self.criteria_meta.iter().find(|m| m.id == id)
    }
}

/// Entries serialized as a JSON object keyed by their id, in list order.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for AppInfo {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for CriterionResult {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for CriteriaMeta {
    fn key(&self) -> &str {
        &self.id
    }
}

fn keyed_by_id<S, T>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Keyed + Serialize,
{
    let mut map = serializer.serialize_map(Some(items.len()))?;
    for item in items {
        map.serialize_entry(item.key(), item)?;
    }
    map.end()
}
