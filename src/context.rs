//! Shared evaluation context: the repository, its apps and run options.

use crate::discovery::discover_apps;
use crate::fsutil::relative_posix;
use crate::git::{git_metadata, repo_url};
use crate::types::{AppInfo, GitMetadata, ReadinessOptions, ScanConfig};
use std::path::{Path, PathBuf};

/// Read-only inputs shared by every criterion evaluator.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub root: PathBuf,
    pub apps: Vec<AppInfo>,
    pub repo_url: Option<String>,
    pub git: GitMetadata,
    pub options: ReadinessOptions,
    pub scan: ScanConfig,
}

impl RepoContext {
    /// Discover apps and snapshot git state for `root`.
    pub fn build(root: &Path, options: ReadinessOptions) -> Self {
        let apps = discover_apps(root);
        tracing::debug!(count = apps.len(), "apps discovered");
        Self {
            root: root.to_path_buf(),
            apps,
            repo_url: repo_url(root),
            git: git_metadata(root),
            options,
            scan: ScanConfig::default(),
        }
    }

    /// A context with explicit apps and no git lookups.
    pub fn with_apps(root: &Path, apps: Vec<AppInfo>, options: ReadinessOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            apps,
            repo_url: None,
            git: GitMetadata::default(),
            options,
            scan: ScanConfig::default(),
        }
    }

    pub fn app_dir(&self, app: &AppInfo) -> PathBuf {
        if app.path == "." {
            self.root.clone()
        } else {
            self.root.join(&app.path)
        }
    }

    /// Repo-relative posix path, used for evidence.
    pub fn rel(&self, path: &Path) -> String {
        relative_posix(&self.root, path)
    }
}
