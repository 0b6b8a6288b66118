//! Individual criterion checks.
//!
//! Every check is a pure function of the filesystem (plus options) and never
//! fails: a missing file is a `fail` verdict, not an error.

use crate::context::RepoContext;
use crate::fsutil::{
    is_directory, package_script, path_exists, read_json, read_text, walk_source_files,
};
use crate::integration::{RunOutcome, resolve_integration_command, run_with_timeout};
use crate::types::{AppInfo, CriterionCheck};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

const ESLINT_FILES: &[&str] = &[
    ".eslintrc",
    ".eslintrc.js",
    ".eslintrc.cjs",
    ".eslintrc.json",
    ".eslintrc.yaml",
    ".eslintrc.yml",
    "eslint.config.js",
    "eslint.config.mjs",
    "eslint.config.cjs",
    "eslint.config.ts",
];

const OTHER_LINT_FILES: &[&str] = &[
    "biome.json",
    ".ruff.toml",
    "ruff.toml",
    ".pylintrc",
    "pylintrc",
    ".flake8",
    "setup.cfg",
    "tox.ini",
    ".golangci.yml",
    ".golangci.yaml",
    "golangci.yml",
    "golangci.yaml",
    "clippy.toml",
    ".clippy.toml",
];

const FORMATTER_FILES: &[&str] = &[
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.js",
    ".prettierrc.cjs",
    ".prettierrc.yaml",
    ".prettierrc.yml",
    "prettier.config.js",
    "prettier.config.cjs",
    "prettier.config.mjs",
    "biome.json",
    "rustfmt.toml",
    ".rustfmt.toml",
    ".clang-format",
    ".editorconfig",
];

const TEST_CONFIG_FILES: &[&str] = &[
    "jest.config.js",
    "jest.config.cjs",
    "jest.config.mjs",
    "jest.config.ts",
    "vitest.config.ts",
    "vitest.config.js",
    "pytest.ini",
    "tox.ini",
    "phpunit.xml",
];

const TYPECHECK_FILES: &[&str] = &["tsconfig.json", "pyrightconfig.json", "mypy.ini"];

const DEPENDENCY_MANIFESTS: &[&str] = &[
    "package.json",
    "requirements.txt",
    "requirements-dev.txt",
    "dev-requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "setup.py",
    "go.mod",
    "Cargo.toml",
];

/// Directories, relative to an app, where entrypoint files are looked for.
const ENTRYPOINT_DIRS: &[&str] = &["", "src", "lib", "app"];

const TRACING_ENTRYPOINTS: &[&str] = &[
    "instrumentation.ts",
    "instrumentation.js",
    "instrumentation.node.ts",
    "tracing.ts",
    "tracing.js",
    "tracing.py",
    "tracing.go",
    "tracing.rs",
    "otel.ts",
    "otel.js",
    "otel.py",
    "otel.go",
    "telemetry.ts",
    "telemetry.js",
    "telemetry.py",
    "telemetry.go",
    "telemetry.rs",
];

const METRICS_ENTRYPOINTS: &[&str] = &[
    "metrics.ts",
    "metrics.js",
    "metrics.py",
    "metrics.go",
    "metrics.rs",
    "prometheus.ts",
    "prometheus.js",
    "prometheus.py",
    "prometheus.go",
];

const INTEGRATION_PATHS: &[&str] = &[
    "tests/integration",
    "test/integration",
    "integration",
    "integration-tests",
    "e2e",
    "tests/e2e",
    "test/e2e",
    "cypress",
    "playwright.config.ts",
    "playwright.config.js",
    "cypress.config.ts",
    "cypress.config.js",
];

const AUTOMATION_CONFIG_FILES: &[&str] = &[
    ".github/dependabot.yml",
    ".github/dependabot.yaml",
    "renovate.json",
    ".github/renovate.json",
    ".renovaterc",
    ".renovaterc.json",
];

static README_TEST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(test|tests|pytest|go test|cargo test)\b").unwrap());

static README_BUILD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(build|compile)\b").unwrap());

static README_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(run|start|serve)\b").unwrap());

static PYPROJECT_TYPECHECK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[tool\.(mypy|pyright)\]").unwrap());

static PYPROJECT_PYTEST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[tool\.pytest\.ini_options\]").unwrap());

static PYPROJECT_LINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[tool\.(ruff|pylint|flake8)(\.lint)?\]").unwrap());

static PYPROJECT_FORMAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[tool\.(black|isort|ruff\.format|yapf)\]").unwrap());

static TRACING_DEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)(opentelemetry|\bdd-?trace\b|@sentry/|sentry[-_]sdk|sentry-go|elastic-apm|\bnewrelic\b|\bjaeger|^\s*tracing\s*=)",
    )
    .unwrap()
});

static METRICS_DEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)(prom-client|prometheus[-_]client|client_golang|sdk-metrics|\bstatsd\b|hot-shots|micrometer|datadog-metrics|\bprometheus\b|^\s*metrics\s*=)",
    )
    .unwrap()
});

static LOGGING_DEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)(\bpino\b|\bwinston\b|\bbunyan\b|\bstructlog\b|\bloguru\b|python-json-logger|go\.uber\.org/zap|sirupsen/logrus|rs/zerolog|^\s*tracing-subscriber\s*=|^\s*slog\s*=|^\s*env_logger\s*=)",
    )
    .unwrap()
});

static TRACING_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(startActiveSpan|startSpan\(|start_as_current_span|get_tracer\(|getTracer\(|otel\.Tracer\(|#\[instrument|tracing::instrument|NodeSDK|tracer\.trace\()",
    )
    .unwrap()
});

static METRICS_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(new\s+(client\.)?(Counter|Histogram|Gauge|Summary)\s*\(|createCounter\(|createHistogram\(|create_counter\(|create_histogram\(|promauto\.New|prometheus\.New(Counter|Histogram|Gauge)|metrics::(counter|histogram|gauge)!)",
    )
    .unwrap()
});

static CACHE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(actions/cache@|^\s*cache:\s*\S|\bcache-dependency-path\b)").unwrap()
});

static MATRIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*matrix:").unwrap());

static PULL_REQUEST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpull_request\b").unwrap());

static FAST_FEEDBACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(cancel-in-progress:\s*true|timeout-minutes:\s*\d+)").unwrap()
});

static FLAKY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\bretry\b|\bretries\b|--retries|\brerun|\bflak(y|e|iness)\b|nick-fields/retry)",
    )
        .unwrap()
});

static DEPLOY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\bdeploy(ment|s|ing)?\b|\brelease\b|\bpublish\b|environment:\s*production)")
        .unwrap()
});

static AGENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\bclaude\b|anthropics/|\bcodex\b|\bcopilot\b|\bagents?\b|dependabot|renovate)",
    )
        .unwrap()
});

static GUARDRAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(guardrails?|never|do not|don't|must not|forbidden|approval)\b").unwrap()
});

const GITHUB_GATE_RATIONALE: &str = "Requires --ci-provider github or --signals github.";

fn first_existing(dir: &Path, files: &[&'static str]) -> Option<&'static str> {
    files.iter().copied().find(|f| path_exists(&dir.join(f)))
}

// --- repo scope ---

pub fn check_readme(ctx: &RepoContext) -> CriterionCheck {
    let Some(content) = read_text(&ctx.root.join("README.md")) else {
        return CriterionCheck::fail("README.md not found.");
    };
    let lower = content.to_lowercase();
    let has_test = README_TEST_RE.is_match(&lower);
    let has_build = README_BUILD_RE.is_match(&lower);
    let has_run = README_RUN_RE.is_match(&lower);

    if has_test && (has_build || has_run) {
        return CriterionCheck::pass("README.md includes run/build/test guidance.")
            .with_evidence(["README.md".to_string()]);
    }
    CriterionCheck::fail("README.md found but missing clear run/build/test guidance.")
}

pub fn check_agents_md(ctx: &RepoContext) -> CriterionCheck {
    if path_exists(&ctx.root.join("AGENTS.md")) {
        CriterionCheck::pass("AGENTS.md present at repo root.")
            .with_evidence(["AGENTS.md".to_string()])
    } else {
        CriterionCheck::fail("AGENTS.md not found.")
    }
}

pub fn check_devcontainer(ctx: &RepoContext) -> CriterionCheck {
    match first_existing(&ctx.root, &[".devcontainer/devcontainer.json", ".devcontainer.json"]) {
        Some(file) => CriterionCheck::pass("Dev container configuration found.")
            .with_evidence([file.to_string()]),
        None => CriterionCheck::fail("No devcontainer configuration found."),
    }
}

pub fn check_precommit(ctx: &RepoContext) -> CriterionCheck {
    let hook_files = [
        ".pre-commit-config.yaml",
        ".pre-commit-config.yml",
        ".husky",
        "lefthook.yml",
        "lefthook.yaml",
    ];
    if let Some(file) = first_existing(&ctx.root, &hook_files) {
        return CriterionCheck::pass("Pre-commit tooling detected.")
            .with_evidence([file.to_string()]);
    }
    let lint_staged_key = read_json(&ctx.root.join("package.json"))
        .map(|pkg| pkg.get("lint-staged").is_some())
        .unwrap_or(false);
    if lint_staged_key || package_script(&ctx.root, "lint-staged").is_some() {
        return CriterionCheck::pass("Pre-commit tooling detected (lint-staged).")
            .with_evidence(["package.json".to_string()]);
    }
    CriterionCheck::fail("No pre-commit tooling detected.")
}

pub fn check_codeowners(ctx: &RepoContext) -> CriterionCheck {
    match first_existing(&ctx.root, &["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS"]) {
        Some(file) => {
            CriterionCheck::pass("CODEOWNERS file found.").with_evidence([file.to_string()])
        }
        None => CriterionCheck::fail("No CODEOWNERS file found."),
    }
}

pub fn check_ci_workflows(ctx: &RepoContext) -> CriterionCheck {
    let workflows = read_workflows(&ctx.root);
    if workflows.is_empty() {
        return CriterionCheck::fail("No GitHub Actions workflows found.");
    }
    CriterionCheck::pass(format!("{} CI workflow(s) found.", workflows.len()))
        .with_evidence(workflows.into_iter().map(|w| w.rel_path))
}

pub fn check_ci_caching(ctx: &RepoContext) -> CriterionCheck {
    workflow_keyword_check(
        ctx,
        &CACHE_RE,
        "CI dependency caching configured.",
        "No caching directives found in CI workflows.",
    )
}

pub fn check_ci_matrix(ctx: &RepoContext) -> CriterionCheck {
    workflow_keyword_check(
        ctx,
        &MATRIX_RE,
        "CI matrix parallelism configured.",
        "No matrix builds found in CI workflows.",
    )
}

pub fn check_fast_ci_feedback(ctx: &RepoContext) -> CriterionCheck {
    if !ctx.options.github_signals() {
        return CriterionCheck::not_evaluated(GITHUB_GATE_RATIONALE);
    }
    let workflows = read_workflows(&ctx.root);
    if workflows.is_empty() {
        return CriterionCheck::fail("No GitHub Actions workflows found.");
    }
    let evidence: Vec<String> = workflows
        .into_iter()
        .filter(|w| PULL_REQUEST_RE.is_match(&w.text) && FAST_FEEDBACK_RE.is_match(&w.text))
        .map(|w| w.rel_path)
        .collect();
    if evidence.is_empty() {
        return CriterionCheck::fail(
            "No pull request workflow bounds its runtime (timeout-minutes or cancel-in-progress).",
        );
    }
    CriterionCheck::pass("Pull request workflows bound their runtime.").with_evidence(evidence)
}

pub fn check_flaky_tests(ctx: &RepoContext) -> CriterionCheck {
    if !ctx.options.github_signals() {
        return CriterionCheck::not_evaluated(GITHUB_GATE_RATIONALE);
    }
    workflow_keyword_check(
        ctx,
        &FLAKY_RE,
        "Flaky test retry or detection configured in CI.",
        "No retry or flaky-test handling found in CI workflows.",
    )
}

pub fn check_deploy_frequency(ctx: &RepoContext) -> CriterionCheck {
    if !ctx.options.github_signals() {
        return CriterionCheck::not_evaluated(GITHUB_GATE_RATIONALE);
    }
    workflow_keyword_check(
        ctx,
        &DEPLOY_RE,
        "Automated deploy or release workflow found.",
        "No deploy or release workflow found.",
    )
}

pub fn check_agent_automation(ctx: &RepoContext) -> CriterionCheck {
    let mut evidence: Vec<String> = AUTOMATION_CONFIG_FILES
        .iter()
        .filter(|f| path_exists(&ctx.root.join(f)))
        .map(|f| f.to_string())
        .collect();
    evidence.extend(
        read_workflows(&ctx.root)
            .into_iter()
            .filter(|w| AGENT_RE.is_match(&w.text))
            .map(|w| w.rel_path),
    );
    if evidence.is_empty() {
        return CriterionCheck::fail("No agent or automation bots configured.");
    }
    CriterionCheck::pass("Agent or automation tooling configured.").with_evidence(evidence)
}

pub fn check_agent_guardrails(ctx: &RepoContext) -> CriterionCheck {
    let mut found_any = false;
    for file in ["AGENTS.md", "CLAUDE.md"] {
        let Some(content) = read_text(&ctx.root.join(file)) else {
            continue;
        };
        found_any = true;
        if GUARDRAIL_RE.is_match(&content) {
            return CriterionCheck::pass(format!("{} documents agent guardrails.", file))
                .with_evidence([file.to_string()]);
        }
    }
    if found_any {
        CriterionCheck::fail("Agent instructions found but no guardrails documented.")
    } else {
        CriterionCheck::fail("No agent instruction file to document guardrails in.")
    }
}

// --- app scope ---

pub fn check_lint_config(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    if let Some(file) =
        first_existing(&dir, ESLINT_FILES).or_else(|| first_existing(&dir, OTHER_LINT_FILES))
    {
        return CriterionCheck::pass("Lint configuration detected.")
            .with_evidence([ctx.rel(&dir.join(file))]);
    }
    let eslint_key = read_json(&dir.join("package.json"))
        .map(|pkg| pkg.get("eslintConfig").is_some())
        .unwrap_or(false);
    if eslint_key || package_script(&dir, "lint").is_some() {
        return CriterionCheck::pass("Lint script or config detected in package.json.")
            .with_evidence([ctx.rel(&dir.join("package.json"))]);
    }
    if pyproject_matches(&dir, &PYPROJECT_LINT_RE) {
        return CriterionCheck::pass("pyproject.toml includes lint tool config.")
            .with_evidence([ctx.rel(&dir.join("pyproject.toml"))]);
    }
    CriterionCheck::fail("No lint config or lint script found in app.")
}

pub fn check_type_check(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    if let Some(file) = first_existing(&dir, &["go.mod", "Cargo.toml"]) {
        return CriterionCheck::pass("Typed language module detected (Go/Rust).")
            .with_evidence([ctx.rel(&dir.join(file))]);
    }

    let tsconfig = dir.join("tsconfig.json");
    if path_exists(&tsconfig) {
        let strict = read_json(&tsconfig)
            .and_then(|config| config.get("compilerOptions").cloned())
            .map(|options| {
                ["strict", "strictNullChecks", "noImplicitAny"]
                    .iter()
                    .any(|key| options.get(key).and_then(|v| v.as_bool()).unwrap_or(false))
            })
            .unwrap_or(false);
        if strict {
            return CriterionCheck::pass("tsconfig.json with strict options detected.")
                .with_evidence([ctx.rel(&tsconfig)]);
        }
        return CriterionCheck::fail("tsconfig.json found but strict options missing.");
    }

    if let Some(file) = first_existing(&dir, TYPECHECK_FILES) {
        return CriterionCheck::pass(format!("Type check config found ({}).", file))
            .with_evidence([ctx.rel(&dir.join(file))]);
    }
    if pyproject_matches(&dir, &PYPROJECT_TYPECHECK_RE) {
        return CriterionCheck::pass("pyproject.toml includes type checking tool config.")
            .with_evidence([ctx.rel(&dir.join("pyproject.toml"))]);
    }
    CriterionCheck::fail("No type checking configuration found.")
}

pub fn check_unit_tests(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    if package_script(&dir, "test").is_some() {
        return CriterionCheck::pass("Unit test command detected.")
            .with_evidence([ctx.rel(&dir.join("package.json"))]);
    }
    if let Some(file) = first_existing(&dir, TEST_CONFIG_FILES)
        .or_else(|| first_existing(&dir, &["tests", "__tests__"]))
    {
        return CriterionCheck::pass("Unit test config detected.")
            .with_evidence([ctx.rel(&dir.join(file))]);
    }
    if pyproject_matches(&dir, &PYPROJECT_PYTEST_RE) {
        return CriterionCheck::pass("pyproject.toml includes pytest config.")
            .with_evidence([ctx.rel(&dir.join("pyproject.toml"))]);
    }
    CriterionCheck::fail("No unit test command/config detected.")
}

pub fn check_formatter(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    if let Some(file) = first_existing(&dir, FORMATTER_FILES) {
        return CriterionCheck::pass("Formatter configuration detected.")
            .with_evidence([ctx.rel(&dir.join(file))]);
    }
    let has_script = ["format", "fmt", "prettier"]
        .iter()
        .any(|s| package_script(&dir, s).is_some());
    let has_prettier_key = read_json(&dir.join("package.json"))
        .map(|pkg| pkg.get("prettier").is_some())
        .unwrap_or(false);
    if has_script || has_prettier_key {
        return CriterionCheck::pass("Format script or config detected in package.json.")
            .with_evidence([ctx.rel(&dir.join("package.json"))]);
    }
    if pyproject_matches(&dir, &PYPROJECT_FORMAT_RE) {
        return CriterionCheck::pass("pyproject.toml includes formatter config.")
            .with_evidence([ctx.rel(&dir.join("pyproject.toml"))]);
    }
    CriterionCheck::fail("No formatter configuration found.")
}

pub fn check_structured_logging(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    let manifests = manifests_matching(ctx, &dir, &LOGGING_DEP_RE);
    if manifests.is_empty() {
        return CriterionCheck::fail("No structured logging library found in dependencies.");
    }
    CriterionCheck::pass("Structured logging library found.").with_evidence(manifests)
}

/// Which telemetry signal an instrumentation check looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Telemetry {
    Tracing,
    Metrics,
}

impl Telemetry {
    fn label(self) -> &'static str {
        match self {
            Telemetry::Tracing => "tracing",
            Telemetry::Metrics => "metrics",
        }
    }

    fn dependency_re(self) -> &'static Regex {
        match self {
            Telemetry::Tracing => &TRACING_DEP_RE,
            Telemetry::Metrics => &METRICS_DEP_RE,
        }
    }

    fn code_re(self) -> &'static Regex {
        match self {
            Telemetry::Tracing => &TRACING_CODE_RE,
            Telemetry::Metrics => &METRICS_CODE_RE,
        }
    }

    fn entrypoints(self) -> &'static [&'static str] {
        match self {
            Telemetry::Tracing => TRACING_ENTRYPOINTS,
            Telemetry::Metrics => METRICS_ENTRYPOINTS,
        }
    }
}

/// Passes only with both a dependency and an instrumentation site.
pub fn check_instrumentation(ctx: &RepoContext, app: &AppInfo, kind: Telemetry) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    let label = kind.label();
    let manifests = manifests_matching(ctx, &dir, kind.dependency_re());
    if manifests.is_empty() {
        return CriterionCheck::fail(format!("No {} dependency or instrumentation found.", label));
    }

    if let Some(entry) = find_entrypoint(&dir, kind.entrypoints()) {
        return CriterionCheck::pass(format!(
            "{} dependency and instrumentation entrypoint found.",
            capitalize(label)
        ))
        .with_evidence(manifests.into_iter().chain([ctx.rel(&entry)]));
    }

    if !ctx.options.telemetry_scan {
        return CriterionCheck::fail(format!(
            "{} dependency found but no instrumentation entrypoint (use --telemetry-scan for a deeper scan).",
            capitalize(label)
        ))
        .with_evidence(manifests);
    }

    match scan_for_pattern(ctx, &dir, kind.code_re()) {
        Some(hit) => CriterionCheck::pass(format!(
            "{} dependency and instrumentation code found.",
            capitalize(label)
        ))
        .with_evidence(manifests.into_iter().chain([hit])),
        None => CriterionCheck::fail(format!(
            "{} dependency found but no instrumentation code detected.",
            capitalize(label)
        ))
        .with_evidence(manifests),
    }
}

pub fn check_integration_tests(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    let dir = ctx.app_dir(app);
    if let Some(path) = first_existing(&dir, INTEGRATION_PATHS) {
        return CriterionCheck::pass("Integration test suite detected.")
            .with_evidence([ctx.rel(&dir.join(path))]);
    }
    if let Some(command) = resolve_integration_command(&dir) {
        return CriterionCheck::pass(format!("Integration test command resolved: {}.", command));
    }
    CriterionCheck::fail("No integration or end-to-end tests detected.")
}

pub fn check_integration_runnable(ctx: &RepoContext, app: &AppInfo) -> CriterionCheck {
    if !ctx.options.run_integration {
        return CriterionCheck::not_evaluated("Requires --run-integration.");
    }
    let dir = ctx.app_dir(app);
    let Some(command) = resolve_integration_command(&dir) else {
        return CriterionCheck::fail("No integration test command could be resolved.");
    };

    tracing::debug!(app = %app.path, %command, "running integration tests");
    let timeout = ctx.scan.integration_timeout;
    match run_with_timeout(&command, &dir, timeout) {
        RunOutcome::Passed => {
            CriterionCheck::pass(format!("Integration tests passed: {}.", command))
        }
        RunOutcome::Failed(code) => {
            let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            CriterionCheck::fail(format!(
                "Integration tests failed: {} (exit {}).",
                command, code
            ))
        }
        RunOutcome::TimedOut => {
            tracing::warn!(app = %app.path, %command, "integration tests timed out");
            CriterionCheck::fail(format!(
                "Integration tests timed out after {}s: {}.",
                timeout.as_secs(),
                command
            ))
        }
        RunOutcome::SpawnError(err) => {
            tracing::warn!(
                app = %app.path,
                %command,
                error = %err,
                "integration tests failed to start"
            );
            CriterionCheck::fail(format!("Failed to run {}: {}", command, err))
        }
    }
}

// --- helpers ---

/// A GitHub Actions workflow file and its contents.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub rel_path: String,
    pub text: String,
}

/// All readable `.github/workflows/*.y(a)ml` files, sorted by path.
pub fn read_workflows(root: &Path) -> Vec<Workflow> {
    let dir = root.join(".github").join("workflows");
    if !is_directory(&dir) {
        return Vec::new();
    }
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let mut paths: Vec<PathBuf> = ["yml", "yaml"]
        .iter()
        .filter_map(|ext| glob::glob(&format!("{}/*.{}", base, ext)).ok())
        .flat_map(|entries| entries.flatten())
        .collect();
    paths.sort();
    paths
        .into_iter()
        .filter_map(|path| {
            let text = read_text(&path)?;
            let name = path.file_name()?.to_string_lossy().to_string();
            Some(Workflow {
                rel_path: format!(".github/workflows/{}", name),
                text,
            })
        })
        .collect()
}

fn workflow_keyword_check(
    ctx: &RepoContext,
    re: &Regex,
    pass_rationale: &str,
    fail_rationale: &str,
) -> CriterionCheck {
    let workflows = read_workflows(&ctx.root);
    if workflows.is_empty() {
        return CriterionCheck::fail("No GitHub Actions workflows found.");
    }
    let evidence: Vec<String> = workflows
        .into_iter()
        .filter(|w| re.is_match(&w.text))
        .map(|w| w.rel_path)
        .collect();
    if evidence.is_empty() {
        CriterionCheck::fail(fail_rationale)
    } else {
        CriterionCheck::pass(pass_rationale).with_evidence(evidence)
    }
}

fn pyproject_matches(dir: &Path, re: &Regex) -> bool {
    read_text(&dir.join("pyproject.toml"))
        .map(|text| re.is_match(&text))
        .unwrap_or(false)
}

/// Repo-relative paths of the app's dependency manifests matching `re`.
fn manifests_matching(ctx: &RepoContext, dir: &Path, re: &Regex) -> Vec<String> {
    DEPENDENCY_MANIFESTS
        .iter()
        .map(|file| dir.join(file))
        .filter(|path| {
            read_text(path)
                .map(|text| re.is_match(&text))
                .unwrap_or(false)
        })
        .map(|path| ctx.rel(&path))
        .collect()
}

fn find_entrypoint(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    ENTRYPOINT_DIRS
        .iter()
        .flat_map(|sub| names.iter().map(move |name| dir.join(sub).join(name)))
        .find(|path| path.is_file())
}

/// First source file under `dir` whose content matches `re`.
fn scan_for_pattern(ctx: &RepoContext, dir: &Path, re: &Regex) -> Option<String> {
    walk_source_files(dir, &ctx.scan)
        .into_iter()
        .find(|path| {
            read_text(path)
                .map(|text| re.is_match(&text))
                .unwrap_or(false)
        })
        .map(|path| ctx.rel(&path))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
