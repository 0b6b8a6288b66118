//! The static criterion registry.
//!
//! Each record is plain data; `evaluate_repo`, `evaluate_app` and
//! `recommendation` dispatch on the record's [`CriterionId`].

use crate::checks::{self, Telemetry};
use crate::context::RepoContext;
use crate::types::{AppInfo, CriterionCheck, Pillar, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionId {
    Readme,
    LintConfig,
    TypeCheck,
    UnitTests,
    AgentsMd,
    Devcontainer,
    PrecommitHooks,
    Codeowners,
    CiWorkflows,
    FormatterConfig,
    StructuredLogging,
    TracingInstrumentation,
    MetricsInstrumentation,
    IntegrationTests,
    CiCaching,
    CiMatrix,
    FastCiFeedback,
    FlakyTestDetection,
    IntegrationTestsRunnable,
    DeployFrequency,
    AgentAutomation,
    AgentGuardrails,
}

impl CriterionId {
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionId::Readme => "readme",
            CriterionId::LintConfig => "lint_config",
            CriterionId::TypeCheck => "type_check",
            CriterionId::UnitTests => "unit_tests",
            CriterionId::AgentsMd => "agents_md",
            CriterionId::Devcontainer => "devcontainer",
            CriterionId::PrecommitHooks => "precommit_hooks",
            CriterionId::Codeowners => "codeowners",
            CriterionId::CiWorkflows => "ci_workflows",
            CriterionId::FormatterConfig => "formatter_config",
            CriterionId::StructuredLogging => "structured_logging",
            CriterionId::TracingInstrumentation => "tracing_instrumentation",
            CriterionId::MetricsInstrumentation => "metrics_instrumentation",
            CriterionId::IntegrationTests => "integration_tests",
            CriterionId::CiCaching => "ci_caching",
            CriterionId::CiMatrix => "ci_matrix",
            CriterionId::FastCiFeedback => "fast_ci_feedback",
            CriterionId::FlakyTestDetection => "flaky_test_detection",
            CriterionId::IntegrationTestsRunnable => "integration_tests_runnable",
            CriterionId::DeployFrequency => "deploy_frequency",
            CriterionId::AgentAutomation => "agent_automation",
            CriterionId::AgentGuardrails => "agent_guardrails",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CriterionDefinition {
    pub id: CriterionId,
    pub title: &'static str,
    /// Maturity level, 1 through 5.
    pub level: u8,
    pub pillar: Pillar,
    pub scope: Scope,
}

const fn def(
    id: CriterionId,
    title: &'static str,
    level: u8,
    pillar: Pillar,
    scope: Scope,
) -> CriterionDefinition {
    CriterionDefinition {
        id,
        title,
        level,
        pillar,
        scope,
    }
}

/// Every criterion, in report order.
#[rustfmt::skip]
pub const CRITERIA: &[CriterionDefinition] = &[
    def(CriterionId::Readme, "README with run/test/build guidance", 1, Pillar::Documentation, Scope::Repo),
    def(CriterionId::LintConfig, "Lint configuration per app", 1, Pillar::StyleValidation, Scope::App),
    def(CriterionId::TypeCheck, "Type checking configured per app", 1, Pillar::BuildSystem, Scope::App),
    def(CriterionId::UnitTests, "Unit test command or config per app", 1, Pillar::Testing, Scope::App),
    def(CriterionId::AgentsMd, "AGENTS.md instructions", 2, Pillar::Documentation, Scope::Repo),
    def(CriterionId::Devcontainer, "Reproducible dev environment hints", 2, Pillar::DevEnvironment, Scope::Repo),
    def(CriterionId::PrecommitHooks, "Pre-commit hooks configured", 2, Pillar::StyleValidation, Scope::Repo),
    def(CriterionId::Codeowners, "Code ownership declared", 2, Pillar::Security, Scope::Repo),
    def(CriterionId::CiWorkflows, "CI workflows defined", 2, Pillar::BuildSystem, Scope::Repo),
    def(CriterionId::FormatterConfig, "Formatter configured per app", 2, Pillar::StyleValidation, Scope::App),
    def(CriterionId::StructuredLogging, "Structured logging library per app", 3, Pillar::Observability, Scope::App),
    def(CriterionId::TracingInstrumentation, "Distributed tracing instrumented", 3, Pillar::Observability, Scope::App),
    def(CriterionId::MetricsInstrumentation, "Metrics instrumented", 3, Pillar::Observability, Scope::App),
    def(CriterionId::IntegrationTests, "Integration tests present per app", 3, Pillar::Testing, Scope::App),
    def(CriterionId::CiCaching, "CI dependency caching", 3, Pillar::BuildSystem, Scope::Repo),
    def(CriterionId::CiMatrix, "CI matrix parallelism", 4, Pillar::Testing, Scope::Repo),
    def(CriterionId::FastCiFeedback, "Fast CI feedback on pull requests", 4, Pillar::BuildSystem, Scope::Repo),
    def(CriterionId::FlakyTestDetection, "Flaky test detection", 4, Pillar::Testing, Scope::Repo),
    def(CriterionId::IntegrationTestsRunnable, "Integration tests runnable", 4, Pillar::Testing, Scope::App),
    def(CriterionId::DeployFrequency, "Automated deploys", 5, Pillar::Deployment, Scope::Repo),
    def(CriterionId::AgentAutomation, "Agent and bot automation in CI", 5, Pillar::Autonomy, Scope::Repo),
    def(CriterionId::AgentGuardrails, "Agent guardrails documented", 5, Pillar::Autonomy, Scope::Repo),
];

#[cfg(test)]
pub fn find(id: &str) -> Option<&'static CriterionDefinition> {
    CRITERIA.iter().find(|c| c.id.as_str() == id)
}

/// Repo-scope evaluator, or `None` if `id` is not repo-scoped.
pub fn evaluate_repo(id: CriterionId, ctx: &RepoContext) -> Option<CriterionCheck> {
    let check = match id {
        CriterionId::Readme => checks::check_readme(ctx),
        CriterionId::AgentsMd => checks::check_agents_md(ctx),
        CriterionId::Devcontainer => checks::check_devcontainer(ctx),
        CriterionId::PrecommitHooks => checks::check_precommit(ctx),
        CriterionId::Codeowners => checks::check_codeowners(ctx),
        CriterionId::CiWorkflows => checks::check_ci_workflows(ctx),
        CriterionId::CiCaching => checks::check_ci_caching(ctx),
        CriterionId::CiMatrix => checks::check_ci_matrix(ctx),
        CriterionId::FastCiFeedback => checks::check_fast_ci_feedback(ctx),
        CriterionId::FlakyTestDetection => checks::check_flaky_tests(ctx),
        CriterionId::DeployFrequency => checks::check_deploy_frequency(ctx),
        CriterionId::AgentAutomation => checks::check_agent_automation(ctx),
        CriterionId::AgentGuardrails => checks::check_agent_guardrails(ctx),
        _ => return None,
    };
    Some(check)
}

/// App-scope evaluator, or `None` if `id` is not app-scoped.
pub fn evaluate_app(id: CriterionId, ctx: &RepoContext, app: &AppInfo) -> Option<CriterionCheck> {
    let check = match id {
        CriterionId::LintConfig => checks::check_lint_config(ctx, app),
        CriterionId::TypeCheck => checks::check_type_check(ctx, app),
        CriterionId::UnitTests => checks::check_unit_tests(ctx, app),
        CriterionId::FormatterConfig => checks::check_formatter(ctx, app),
        CriterionId::StructuredLogging => checks::check_structured_logging(ctx, app),
        CriterionId::TracingInstrumentation => {
            checks::check_instrumentation(ctx, app, Telemetry::Tracing)
        }
        CriterionId::MetricsInstrumentation => {
            checks::check_instrumentation(ctx, app, Telemetry::Metrics)
        }
        CriterionId::IntegrationTests => checks::check_integration_tests(ctx, app),
        CriterionId::IntegrationTestsRunnable => checks::check_integration_runnable(ctx, app),
        _ => return None,
    };
    Some(check)
}

/// Remediation text for a failing criterion.
pub fn recommendation(id: CriterionId, ctx: &RepoContext, failing_apps: &[String]) -> String {
    let per_app = |with_apps: &str, generic: &str| {
        if failing_apps.is_empty() {
            generic.to_string()
        } else {
            format!("{} for: {}.", with_apps, failing_apps.join(", "))
        }
    };
    match id {
        CriterionId::Readme => "Add a README.md with clear run/build/test instructions.".into(),
        CriterionId::LintConfig => per_app(
            "Add lint config or lint script",
            "Add lint configuration for each app.",
        ),
        CriterionId::TypeCheck => per_app(
            "Add strict type checking configs",
            "Add type checking configuration for each app.",
        ),
        CriterionId::UnitTests => per_app(
            "Add unit test configuration or command",
            "Add unit tests or test command for each app.",
        ),
        CriterionId::AgentsMd => "Add AGENTS.md with repo workflow and guardrails.".into(),
        CriterionId::Devcontainer => {
            "Add .devcontainer/devcontainer.json or equivalent setup hints.".into()
        }
        CriterionId::PrecommitHooks => {
            "Add pre-commit hooks (pre-commit, husky, lefthook, or lint-staged).".into()
        }
        CriterionId::Codeowners => "Add a CODEOWNERS file so changes route to reviewers.".into(),
        CriterionId::CiWorkflows => "Add CI workflows under .github/workflows.".into(),
        CriterionId::FormatterConfig => per_app(
            "Add formatter configuration",
            "Add a formatter configuration for each app.",
        ),
        CriterionId::StructuredLogging => per_app(
            "Adopt a structured logging library",
            "Adopt a structured logging library in each app.",
        ),
        CriterionId::TracingInstrumentation => per_app(
            "Add a tracing SDK and instrumentation entrypoint",
            "Add tracing instrumentation (e.g. OpenTelemetry) to each app.",
        ),
        CriterionId::MetricsInstrumentation => per_app(
            "Add a metrics client and instrumentation entrypoint",
            "Add metrics instrumentation to each app.",
        ),
        CriterionId::IntegrationTests => per_app(
            "Add integration or end-to-end tests",
            "Add integration tests for each app.",
        ),
        CriterionId::IntegrationTestsRunnable => {
            let base = per_app(
                "Make integration tests pass within 90s",
                "Make integration tests runnable with a single command.",
            );
            if ctx.options.run_integration {
                base
            } else {
                format!("{} Re-run with --run-integration to verify.", base)
            }
        }
        CriterionId::CiCaching => "Cache dependencies in CI (e.g. actions/cache).".into(),
        CriterionId::CiMatrix => "Parallelize CI with a matrix strategy.".into(),
        CriterionId::FastCiFeedback => {
            "Bound pull request CI with timeout-minutes and cancel-in-progress concurrency.".into()
        }
        CriterionId::FlakyTestDetection => {
            "Add retry or flaky-test reporting to CI test runs.".into()
        }
        CriterionId::DeployFrequency => "Automate deploys or releases from CI.".into(),
        CriterionId::AgentAutomation => {
            "Wire an agent or automation bot (dependabot, renovate, coding agent) into CI.".into()
        }
        CriterionId::AgentGuardrails => {
            "Document agent guardrails (what agents must never do) in AGENTS.md.".into()
        }
    }
}
