//! Integration-test command resolution and bounded execution.

use crate::fsutil::{is_directory, package_script, path_exists, read_text, walk_source_files};
use crate::types::ScanConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// package.json scripts tried in order.
const INTEGRATION_SCRIPTS: &[&str] = &["test:integration", "integration", "test:e2e", "e2e"];

static MAKE_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(integration|test-integration|integration-test|e2e)\s*:").unwrap()
});

static GO_INTEGRATION_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^//\s*(go:build|\+build)\s.*\bintegration\b").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl IntegrationCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for IntegrationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Best-guess integration test command for an app directory.
pub fn resolve_integration_command(app_dir: &Path) -> Option<IntegrationCommand> {
    for script in INTEGRATION_SCRIPTS {
        if package_script(app_dir, script).is_some() {
            return Some(IntegrationCommand::new("npm", &["run", script]));
        }
    }

    if let Some(makefile) = read_text(&app_dir.join("Makefile")) {
        if let Some(caps) = MAKE_TARGET_RE.captures(&makefile) {
            return Some(IntegrationCommand::new("make", &[&caps[1]]));
        }
    }

    let python = ["pyproject.toml", "pytest.ini", "setup.py", "requirements.txt"]
        .iter()
        .any(|f| path_exists(&app_dir.join(f)));
    if python && is_directory(&app_dir.join("tests/integration")) {
        return Some(IntegrationCommand::new("pytest", &["tests/integration"]));
    }

    if path_exists(&app_dir.join("go.mod")) && has_go_integration_tag(app_dir) {
        return Some(IntegrationCommand::new(
            "go",
            &["test", "-tags=integration", "./..."],
        ));
    }

    if path_exists(&app_dir.join("Cargo.toml")) && is_directory(&app_dir.join("tests")) {
        return Some(IntegrationCommand::new("cargo", &["test", "--tests"]));
    }

    None
}

fn has_go_integration_tag(app_dir: &Path) -> bool {
    let config = ScanConfig {
        source_extensions: vec!["go"],
        ..ScanConfig::default()
    };
    walk_source_files(app_dir, &config)
        .iter()
        .filter(|p| p.to_string_lossy().ends_with("_test.go"))
        .filter_map(|p| read_text(p))
        .any(|text| GO_INTEGRATION_TAG_RE.is_match(&text))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    /// Exit code, when the process was not killed by a signal.
    Failed(Option<i32>),
    TimedOut,
    SpawnError(String),
}

/// Run `command` in `cwd`, killing it once `timeout` elapses.
pub fn run_with_timeout(command: &IntegrationCommand, cwd: &Path, timeout: Duration) -> RunOutcome {
    let spawned = Command::new(&command.program)
        .args(&command.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => return RunOutcome::SpawnError(err.to_string()),
    };

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return RunOutcome::Passed,
            Ok(Some(status)) => return RunOutcome::Failed(status.code()),
            Ok(None) => {}
            Err(err) => return RunOutcome::SpawnError(err.to_string()),
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return RunOutcome::TimedOut;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
