//! Score a repository against agent-readiness maturity levels.

mod checks;
mod context;
mod criteria;
mod discovery;
mod engine;
mod error;
mod fsutil;
mod git;
mod integration;
mod render;
mod types;
mod validate;

pub use context::RepoContext;
pub use criteria::{CRITERIA, CriterionDefinition, CriterionId};
pub use discovery::discover_apps;
pub use engine::{
    Evaluation, assemble_report, build_report, derive_action_items, evaluate_criteria,
    score_levels,
};
pub use error::{ReadinessError, Result};
pub use git::detect_repo_root;
pub use render::render_markdown;
pub use types::*;
pub use validate::{REPORT_SCHEMA, ValidationResult, load_report, validate_against, validate_report};

use std::path::{Path, PathBuf};

/// Where `report --out` conventionally writes and `validate` reads.
pub const DEFAULT_REPORT_PATH: &str = ".agent-readiness/latest.json";

/// Resolve a `--root` argument against `cwd`, then climb to the git toplevel.
///
/// The joined path is canonicalized so `..` segments never reach the report.
pub fn resolve_root(cwd: &Path, root_flag: Option<&Path>) -> PathBuf {
    let joined = match root_flag {
        Some(p) => cwd.join(p),
        None => cwd.to_path_buf(),
    };
    let start = joined.canonicalize().unwrap_or(joined);
    detect_repo_root(&start)
}

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_report(report: &ReadinessReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ReadinessError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| ReadinessError::Write {
        path: path.to_path_buf(),
        source,
    })
}
