//! Git metadata, gathered by shelling out to `git`.
//!
//! Nothing here fails: a missing binary, a non-repo directory or a failing
//! command all come back as `None`.

use crate::types::GitMetadata;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn run_git(cwd: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// The git toplevel containing `start`, or `start` itself outside a repo.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    match run_git(start, &["rev-parse", "--show-toplevel"]) {
        Some(top) if !top.is_empty() => PathBuf::from(top),
        _ => start.to_path_buf(),
    }
}

pub fn git_metadata(root: &Path) -> GitMetadata {
    let inside = run_git(root, &["rev-parse", "--is-inside-work-tree"]);
    if inside.as_deref() != Some("true") {
        tracing::debug!(root = %root.display(), "not a git work tree");
        return GitMetadata::default();
    }

    let commit_hash = run_git(root, &["rev-parse", "HEAD"]);
    let branch = run_git(root, &["rev-parse", "--abbrev-ref", "HEAD"]);
    let has_local_changes = run_git(root, &["status", "--porcelain"]).map(|s| !s.is_empty());

    let upstream = run_git(
        root,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    );
    let has_non_remote_commits = upstream.map(|_| {
        run_git(root, &["rev-list", "--count", "@{u}..HEAD"])
            .and_then(|n| n.parse::<u64>().ok())
            .map(|n| n > 0)
            .unwrap_or(false)
    });

    GitMetadata {
        commit_hash,
        branch,
        has_local_changes,
        has_non_remote_commits,
    }
}

pub fn repo_url(root: &Path) -> Option<String> {
    run_git(root, &["config", "--get", "remote.origin.url"]).filter(|url| !url.is_empty())
}
