//! App discovery: find the workspace members of a repository.

use crate::fsutil::{
    is_directory, list_subdirectories, path_exists, read_json, read_text, relative_posix,
    walk_directories,
};
use crate::types::AppInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Files whose presence marks a directory as an app.
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "setup.py",
    "go.mod",
    "Cargo.toml",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
];

/// Conventional app containers, tried when no workspace manifest matches.
const DEFAULT_APP_DIRS: &[&str] = &["apps", "packages", "services", "libs"];

const WALK_IGNORE: &[&str] = &["node_modules", ".git", "dist", "build"];

static PNPM_PACKAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*packages\s*:\s*$").unwrap());

static PNPM_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-\s*(.+?)\s*$").unwrap());

/// Workspace member globs and the file they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub patterns: Vec<String>,
    pub source: &'static str,
}

/// Discover apps under `root`. Never empty.
///
/// Strategy:
/// - Pass 1: expand `workspaces` from package.json or pnpm-workspace.yaml
/// - Pass 2: children of `apps/`, `packages/`, `services/`, `libs/` that carry a manifest
/// - Pass 3: the repository root itself
pub fn discover_apps(root: &Path) -> Vec<AppInfo> {
    let mut apps = AppSet::default();

    if let Some(workspace) = read_workspace_config(root) {
        tracing::debug!(
            source = workspace.source,
            patterns = ?workspace.patterns,
            "workspace config found"
        );
        let (excludes, includes): (Vec<_>, Vec<_>) = workspace
            .patterns
            .iter()
            .partition(|p| p.starts_with('!'));
        let excluded: Vec<ExcludePattern> = excludes
            .iter()
            .filter_map(|p| ExcludePattern::new(&p[1..]))
            .collect();
        for pattern in includes {
            for dir in expand_workspace_pattern(root, pattern) {
                let rel = relative_posix(root, &dir);
                if !excluded.iter().any(|e| e.matches(&rel)) && has_manifest(&dir) {
                    apps.insert(AppInfo::new(rel));
                }
            }
        }
    }

    if apps.is_empty() {
        for container in DEFAULT_APP_DIRS {
            let dir = root.join(container);
            if !is_directory(&dir) {
                continue;
            }
            for child in list_subdirectories(&dir) {
                let child = dir.join(child);
                if has_manifest(&child) {
                    apps.insert(AppInfo::new(relative_posix(root, &child)));
                }
            }
        }
    }

    if apps.is_empty() {
        apps.insert(AppInfo::new("."));
    }

    apps.into_vec()
}

/// A `!`-prefixed workspace glob, matched against repo-relative paths.
struct ExcludePattern {
    pattern: glob::Pattern,
    /// `foo/**` also excludes `foo` itself.
    stem: Option<glob::Pattern>,
}

const EXCLUDE_MATCH: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl ExcludePattern {
    fn new(raw: &str) -> Option<Self> {
        let normalized = raw.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./").trim_end_matches('/');
        let pattern = glob::Pattern::new(normalized).ok()?;
        let stem = normalized
            .strip_suffix("/**")
            .and_then(|stem| glob::Pattern::new(stem).ok());
        Some(Self { pattern, stem })
    }

    fn matches(&self, rel: &str) -> bool {
        self.pattern.matches_with(rel, EXCLUDE_MATCH)
            || self
                .stem
                .as_ref()
                .is_some_and(|stem| stem.matches_with(rel, EXCLUDE_MATCH))
    }
}

/// Insertion-ordered apps, unique by path.
#[derive(Default)]
struct AppSet {
    seen: HashSet<String>,
    apps: Vec<AppInfo>,
}

impl AppSet {
    fn insert(&mut self, app: AppInfo) {
        if self.seen.insert(app.path.clone()) {
            self.apps.push(app);
        }
    }

    fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn into_vec(self) -> Vec<AppInfo> {
        self.apps
    }
}

pub fn has_manifest(dir: &Path) -> bool {
    MANIFEST_FILES.iter().any(|file| path_exists(&dir.join(file)))
}

pub fn read_workspace_config(root: &Path) -> Option<WorkspaceConfig> {
    if let Some(pkg) = read_json(&root.join("package.json")) {
        let workspaces = pkg.get("workspaces");
        let list = workspaces
            .and_then(|w| w.as_array())
            .or_else(|| workspaces.and_then(|w| w.get("packages")).and_then(|p| p.as_array()));
        let patterns: Vec<String> = list
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if !patterns.is_empty() {
            return Some(WorkspaceConfig {
                patterns,
                source: "package.json",
            });
        }
    }

    let raw = read_text(&root.join("pnpm-workspace.yaml"))?;
    let patterns = parse_pnpm_workspace(&raw);
    if patterns.is_empty() {
        return None;
    }
    Some(WorkspaceConfig {
        patterns,
        source: "pnpm-workspace.yaml",
    })
}

/// Extract the `packages:` list from a pnpm-workspace.yaml document.
pub fn parse_pnpm_workspace(raw: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut in_packages = false;
    for line in raw.lines() {
        if PNPM_PACKAGES_RE.is_match(line) {
            in_packages = true;
            continue;
        }
        if !in_packages {
            continue;
        }
        if let Some(caps) = PNPM_ITEM_RE.captures(line) {
            let item = caps[1].trim_matches(|c| c == '\'' || c == '"');
            patterns.push(item.to_string());
            continue;
        }
        if line.starts_with(|c: char| !c.is_whitespace()) {
            in_packages = false;
        }
    }
    patterns
}

/// Directories matched by a workspace pattern, sorted.
fn expand_workspace_pattern(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let normalized = pattern.replace('\\', "/");
    let normalized = normalized.trim_start_matches("./").trim_end_matches('/');

    if !normalized.contains('*') {
        let dir = root.join(normalized);
        return if is_directory(&dir) { vec![dir] } else { Vec::new() };
    }

    if let Some((base, _)) = normalized.split_once("**") {
        let base_dir = root.join(base.trim_end_matches('/'));
        if !is_directory(&base_dir) {
            return Vec::new();
        }
        let mut dirs = walk_directories(&base_dir, WALK_IGNORE);
        dirs.sort();
        return dirs;
    }

    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        normalized
    );
    let Ok(entries) = glob::glob(&full) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries.flatten().filter(|p| p.is_dir()).collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn paths(apps: &[AppInfo]) -> Vec<String> {
        let mut paths: Vec<String> = apps.iter().map(|a| a.path.clone()).collect();
        paths.sort();
        paths
    }

    #[test]
    fn falls_back_to_root_without_workspace() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("package.json"), r#"{"name": "root-app"}"#);

        let apps = discover_apps(tmp.path());
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].path, ".");
        assert_eq!(apps[0].description.as_deref(), Some("Repository root"));
    }

    #[test]
    fn empty_directory_still_yields_root() {
        let tmp = TempDir::new().unwrap();
        let apps = discover_apps(tmp.path());
        assert_eq!(paths(&apps), vec!["."]);
    }

    #[test]
    fn uses_package_json_workspaces() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root.join("package.json"), r#"{"workspaces": ["apps/*"]}"#);
        write(root.join("apps/web/package.json"), r#"{"name": "web"}"#);
        write(root.join("apps/api/package.json"), r#"{"name": "api"}"#);
        fs::create_dir_all(root.join("apps/empty")).unwrap();

        let apps = discover_apps(root);
        assert_eq!(paths(&apps), vec!["apps/api", "apps/web"]);
        assert_eq!(apps[0].id, apps[0].path);
    }

    #[test]
    fn workspaces_object_form() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root.join("package.json"),
            r#"{"workspaces": {"packages": ["packages/*"]}}"#,
        );
        write(root.join("packages/core/go.mod"), "module core\n");

        assert_eq!(paths(&discover_apps(root)), vec!["packages/core"]);
    }

    #[test]
    fn pnpm_workspace_with_exclusion() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root.join("pnpm-workspace.yaml"),
            "packages:\n  - 'apps/*'\n  - \"!apps/legacy\"\nother: true\n",
        );
        write(root.join("apps/web/package.json"), "{}");
        write(root.join("apps/legacy/package.json"), "{}");

        assert_eq!(paths(&discover_apps(root)), vec!["apps/web"]);
    }

    #[test]
    fn double_star_exclusion_only_drops_matching_members() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root.join("pnpm-workspace.yaml"),
            "packages:\n  - 'components/*'\n  - '!**/test/**'\n",
        );
        write(root.join("components/ui/package.json"), "{}");
        write(root.join("components/forms/package.json"), "{}");
        write(root.join("components/test/package.json"), "{}");

        assert_eq!(
            paths(&discover_apps(root)),
            vec!["components/forms", "components/ui"]
        );
    }

    #[test]
    fn exclusion_star_stays_within_one_segment() {
        let excluded = ExcludePattern::new("apps/*").unwrap();
        assert!(excluded.matches("apps/web"));
        assert!(!excluded.matches("apps/web/nested"));
        assert!(!excluded.matches("services/web"));
    }

    #[test]
    fn double_star_walks_nested_members() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root.join("package.json"), r#"{"workspaces": ["services/**"]}"#);
        write(root.join("services/billing/api/pyproject.toml"), "");
        write(root.join("services/billing/node_modules/x/package.json"), "{}");

        assert_eq!(paths(&discover_apps(root)), vec!["services/billing/api"]);
    }

    #[test]
    fn default_app_dirs_without_workspace() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root.join("services/auth/Cargo.toml"), "[package]\n");
        write(root.join("libs/util/setup.py"), "");
        fs::create_dir_all(root.join("libs/docs")).unwrap();

        assert_eq!(
            paths(&discover_apps(root)),
            vec!["libs/util", "services/auth"]
        );
    }

    #[test]
    fn parse_pnpm_workspace_stops_at_next_key() {
        let raw = "packages:\n  - apps/*\n  - packages/*\ncatalog:\n  - ignored\n";
        assert_eq!(parse_pnpm_workspace(raw), vec!["apps/*", "packages/*"]);
    }

    #[test]
    fn parse_pnpm_workspace_without_packages() {
        assert!(parse_pnpm_workspace("catalog:\n  react: 18\n").is_empty());
    }
}
