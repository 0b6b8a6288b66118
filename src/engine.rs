//! Criterion evaluation, level scoring and action items.

use crate::context::RepoContext;
use crate::criteria::{self, CRITERIA, CriterionDefinition};
use crate::types::{
    ActionItem, CriteriaMeta, CriterionCheck, CriterionResult, GATE, LevelDetail, LevelSummary,
    ReadinessOptions, ReadinessReport, SCHEMA_VERSION, Scope, SignalsSummary, Status,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const MAX_ACTION_ITEMS: usize = 3;
const MAX_LEVEL: u8 = 5;

/// Results and status metadata, both in registry order.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub results: Vec<CriterionResult>,
    pub meta: Vec<CriteriaMeta>,
}

/// Evaluate every criterion against `ctx`, one at a time.
pub fn evaluate_criteria(ctx: &RepoContext, registry: &[CriterionDefinition]) -> Evaluation {
    let mut results = Vec::with_capacity(registry.len());
    let mut meta = Vec::with_capacity(registry.len());

    for criterion in registry {
        let (result, status) = match criterion.scope {
            Scope::Repo => evaluate_repo_scope(ctx, criterion),
            Scope::App => evaluate_app_scope(ctx, criterion),
        };
        tracing::debug!(
            criterion = result.id.as_str(),
            ?status,
            numerator = result.numerator,
            denominator = result.denominator,
            "criterion evaluated"
        );
        meta.push(CriteriaMeta {
            id: result.id.clone(),
            level: criterion.level,
            scope: criterion.scope,
            pillar: criterion.pillar,
            status,
        });
        results.push(result);
    }

    Evaluation { results, meta }
}

fn missing_evaluator() -> CriterionCheck {
    CriterionCheck::not_evaluated("No evaluator provided.")
}

fn base_result(criterion: &CriterionDefinition) -> CriterionResult {
    CriterionResult {
        id: criterion.id.as_str().to_string(),
        title: criterion.title.to_string(),
        level: criterion.level,
        pillar: criterion.pillar,
        scope: criterion.scope,
        numerator: 0,
        denominator: 0,
        rationale: String::new(),
        evidence: None,
        failing_apps: None,
    }
}

fn evaluate_repo_scope(
    ctx: &RepoContext,
    criterion: &CriterionDefinition,
) -> (CriterionResult, Status) {
    let check = criteria::evaluate_repo(criterion.id, ctx).unwrap_or_else(missing_evaluator);
    let (numerator, denominator) = match check.status {
        Status::Pass => (1, 1),
        Status::Fail => (0, 1),
        Status::NotApplicable | Status::NotEvaluated => (0, 0),
    };
    let result = CriterionResult {
        numerator,
        denominator,
        rationale: check.rationale,
        evidence: (!check.evidence.is_empty()).then_some(check.evidence),
        ..base_result(criterion)
    };
    (result, check.status)
}

fn evaluate_app_scope(
    ctx: &RepoContext,
    criterion: &CriterionDefinition,
) -> (CriterionResult, Status) {
    if ctx.apps.is_empty() {
        let result = CriterionResult {
            rationale: "No apps discovered.".to_string(),
            ..base_result(criterion)
        };
        return (result, Status::NotApplicable);
    }

    let mut numerator = 0u32;
    let mut denominator = 0u32;
    let mut failing_apps: Vec<String> = Vec::new();
    let mut saw_not_evaluated = false;
    let mut evidence: Vec<String> = Vec::new();
    let mut seen_evidence: HashSet<String> = HashSet::new();

    for app in &ctx.apps {
        let check =
            criteria::evaluate_app(criterion.id, ctx, app).unwrap_or_else(missing_evaluator);
        match check.status {
            Status::Pass => {
                numerator += 1;
                denominator += 1;
            }
            Status::Fail => {
                denominator += 1;
                failing_apps.push(app.path.clone());
            }
            Status::NotEvaluated => saw_not_evaluated = true,
            Status::NotApplicable => {}
        }
        for item in check.evidence {
            if seen_evidence.insert(item.clone()) {
                evidence.push(item);
            }
        }
    }

    let rationale = if denominator == 0 {
        if saw_not_evaluated {
            "Not evaluated for apps (missing required signals).".to_string()
        } else {
            "Not applicable for discovered apps.".to_string()
        }
    } else if failing_apps.is_empty() {
        "All apps satisfied this criterion.".to_string()
    } else if failing_apps.len() == ctx.apps.len() {
        "No apps satisfied this criterion.".to_string()
    } else {
        format!("Missing for: {}.", failing_apps.join(", "))
    };

    let status = match (denominator, saw_not_evaluated) {
        (0, true) => Status::NotEvaluated,
        (0, false) => Status::NotApplicable,
        _ if numerator == denominator => Status::Pass,
        _ => Status::Fail,
    };

    let result = CriterionResult {
        numerator,
        denominator,
        rationale,
        evidence: (!evidence.is_empty()).then_some(evidence),
        failing_apps: (!failing_apps.is_empty()).then_some(failing_apps),
        ..base_result(criterion)
    };
    (result, status)
}

/// Per-level completion plus the longest unlocked prefix of levels.
pub fn score_levels(results: &[CriterionResult]) -> LevelSummary {
    let mut levels = BTreeMap::new();
    for level in 1..=MAX_LEVEL {
        let (pass_count, evaluated_count) = results
            .iter()
            .filter(|r| r.level == level)
            .fold((0u32, 0u32), |(pass, eval), r| {
                (pass + r.numerator, eval + r.denominator)
            });
        let completion = if evaluated_count > 0 {
            f64::from(pass_count) / f64::from(evaluated_count)
        } else {
            0.0
        };
        levels.insert(
            level,
            LevelDetail {
                completion,
                evaluated_count,
                pass_count,
                unlocked: evaluated_count > 0 && completion >= GATE,
            },
        );
    }

    let achieved_level = (1..=MAX_LEVEL)
        .take_while(|level| levels.get(level).map(|d| d.unlocked).unwrap_or(false))
        .last()
        .unwrap_or(0);
    let next_level = (achieved_level < MAX_LEVEL).then_some(achieved_level + 1);

    LevelSummary {
        achieved_level,
        next_level,
        gate: GATE,
        levels,
    }
}

/// Up to three unmet criteria of the next level, most-missing first.
pub fn derive_action_items(
    ctx: &RepoContext,
    registry: &[CriterionDefinition],
    results: &[CriterionResult],
    summary: &LevelSummary,
) -> Vec<ActionItem> {
    let Some(target) = summary.next_level else {
        return Vec::new();
    };

    let mut missing: Vec<(&CriterionDefinition, &CriterionResult, u32)> = registry
        .iter()
        .filter(|c| c.level == target)
        .filter_map(|c| {
            let result = results.iter().find(|r| r.id == c.id.as_str())?;
            if result.denominator == 0 {
                return None;
            }
            let missing_count = result.denominator - result.numerator;
            (missing_count > 0).then_some((c, result, missing_count))
        })
        .collect();
    // Stable: ties keep registry order.
    missing.sort_by(|a, b| b.2.cmp(&a.2));

    missing
        .into_iter()
        .take(MAX_ACTION_ITEMS)
        .map(|(criterion, result, _)| {
            let failing = result.failing_apps.as_deref().unwrap_or(&[]);
            ActionItem {
                criterion_id: criterion.id.as_str().to_string(),
                title: criterion.title.to_string(),
                details: criteria::recommendation(criterion.id, ctx, failing),
            }
        })
        .collect()
}

/// Score the repository at `root` and assemble the full report.
pub fn build_report(root: &Path, tool_version: &str, options: ReadinessOptions) -> ReadinessReport {
    let ctx = RepoContext::build(root, options);
    assemble_report(&ctx, tool_version)
}

/// Score an already-built context.
pub fn assemble_report(ctx: &RepoContext, tool_version: &str) -> ReadinessReport {
    let Evaluation { results, meta } = evaluate_criteria(ctx, CRITERIA);
    let level_summary = score_levels(&results);
    let action_items = derive_action_items(ctx, CRITERIA, &results, &level_summary);
    tracing::info!(
        achieved = level_summary.achieved_level,
        next = ?level_summary.next_level,
        "readiness scored"
    );

    let options = &ctx.options;
    let signals = (options.ci_provider.is_some() || options.signals.is_some()).then(|| {
        SignalsSummary {
            ci_provider: options.ci_provider,
            deploy_source: options.signals,
            notes: "Signals derived from local heuristics; API signals not enabled.".to_string(),
        }
    });

    ReadinessReport {
        schema_version: SCHEMA_VERSION.to_string(),
        tool_version: tool_version.to_string(),
        report_id: uuid::Uuid::new_v4().to_string(),
        created_at: chrono::Utc::now().timestamp_millis(),
        repo_root: ctx.root.to_string_lossy().to_string(),
        repo_url: ctx.repo_url.clone(),
        commit_hash: ctx.git.commit_hash.clone(),
        branch: ctx.git.branch.clone(),
        has_local_changes: ctx.git.has_local_changes,
        has_non_remote_commits: ctx.git.has_non_remote_commits,
        apps: ctx.apps.clone(),
        report: results,
        criteria_meta: meta,
        levels: level_summary.levels.clone(),
        level_summary,
        signals,
        action_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CriterionId, find};
    use crate::types::{AppInfo, CiProvider, Pillar};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn defs(ids: &[&str]) -> Vec<CriterionDefinition> {
        ids.iter().map(|id| *find(id).unwrap()).collect()
    }

    fn synthetic(id: &str, level: u8, numerator: u32, denominator: u32) -> CriterionResult {
        CriterionResult {
            id: id.to_string(),
            title: id.to_string(),
            level,
            pillar: Pillar::Testing,
            scope: Scope::Repo,
            numerator,
            denominator,
            rationale: String::new(),
            evidence: None,
            failing_apps: None,
        }
    }

    fn two_apps(root: &Path) -> RepoContext {
        RepoContext::with_apps(
            root,
            vec![AppInfo::new("apps/api"), AppInfo::new("apps/web")],
            ReadinessOptions::default(),
        )
    }

    // --- evaluation ---

    #[test]
    fn repo_scope_maps_status_to_counts() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "AGENTS.md", "# Agents\n");
        let ctx = two_apps(tmp.path());
        let eval = evaluate_criteria(&ctx, &defs(&["agents_md", "readme", "fast_ci_feedback"]));

        assert_eq!((eval.results[0].numerator, eval.results[0].denominator), (1, 1));
        assert_eq!((eval.results[1].numerator, eval.results[1].denominator), (0, 1));
        assert_eq!((eval.results[2].numerator, eval.results[2].denominator), (0, 0));
        assert_eq!(eval.meta[0].status, Status::Pass);
        assert_eq!(eval.meta[1].status, Status::Fail);
        assert_eq!(eval.meta[2].status, Status::NotEvaluated);
        assert_eq!(eval.results[0].evidence, Some(vec!["AGENTS.md".to_string()]));
        assert!(eval.results[1].evidence.is_none());
    }

    #[test]
    fn app_scope_partial_failure() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "apps/api/package.json", r#"{"scripts": {"lint": "eslint ."}}"#);
        write(tmp.path(), "apps/web/package.json", r#"{"name": "web"}"#);
        let ctx = two_apps(tmp.path());

        let eval = evaluate_criteria(&ctx, &defs(&["lint_config"]));
        let result = &eval.results[0];
        assert_eq!((result.numerator, result.denominator), (1, 2));
        assert_eq!(result.failing_apps, Some(vec!["apps/web".to_string()]));
        assert_eq!(result.rationale, "Missing for: apps/web.");
        assert_eq!(eval.meta[0].status, Status::Fail);
    }

    #[test]
    fn app_scope_rationales() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "apps/api/go.mod", "module api\n");
        write(tmp.path(), "apps/web/go.mod", "module web\n");
        let ctx = two_apps(tmp.path());

        let eval = evaluate_criteria(&ctx, &defs(&["type_check", "unit_tests"]));
        assert_eq!(eval.results[0].rationale, "All apps satisfied this criterion.");
        assert!(eval.results[0].failing_apps.is_none());
        assert_eq!(
            eval.results[0].evidence,
            Some(vec!["apps/api/go.mod".to_string(), "apps/web/go.mod".to_string()])
        );
        assert_eq!(eval.results[1].rationale, "No apps satisfied this criterion.");
        assert_eq!(eval.results[1].failing_apps.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn app_scope_not_evaluated_everywhere() {
        let tmp = TempDir::new().unwrap();
        let ctx = two_apps(tmp.path());
        let eval = evaluate_criteria(&ctx, &defs(&["integration_tests_runnable"]));
        assert_eq!(eval.results[0].denominator, 0);
        assert_eq!(
            eval.results[0].rationale,
            "Not evaluated for apps (missing required signals)."
        );
        assert_eq!(eval.meta[0].status, Status::NotEvaluated);
    }

    #[test]
    fn no_apps_is_not_applicable() {
        let tmp = TempDir::new().unwrap();
        let ctx = RepoContext::with_apps(tmp.path(), Vec::new(), ReadinessOptions::default());
        let eval = evaluate_criteria(&ctx, &defs(&["lint_config"]));
        assert_eq!(eval.results[0].rationale, "No apps discovered.");
        assert_eq!(eval.results[0].denominator, 0);
        assert_eq!(eval.meta[0].status, Status::NotApplicable);
    }

    #[test]
    fn numerator_never_exceeds_denominator() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "apps/api/package.json", r#"{"scripts": {"test": "jest"}}"#);
        let ctx = two_apps(tmp.path());
        let eval = evaluate_criteria(&ctx, CRITERIA);
        assert_eq!(eval.results.len(), CRITERIA.len());
        assert!(eval.results.iter().all(|r| r.numerator <= r.denominator));
    }

    // --- scoring ---

    #[test]
    fn empty_level_is_not_complete() {
        let summary = score_levels(&[synthetic("a", 1, 1, 1)]);
        let two = &summary.levels[&2];
        assert_eq!(two.evaluated_count, 0);
        assert_eq!(two.completion, 0.0);
        assert!(!two.unlocked);
        assert_eq!(summary.achieved_level, 1);
        assert_eq!(summary.next_level, Some(2));
    }

    #[test]
    fn gate_is_inclusive() {
        let results = [synthetic("a", 1, 4, 5)];
        let summary = score_levels(&results);
        assert!(summary.levels[&1].unlocked);
        assert!((summary.levels[&1].completion - 0.8).abs() < f64::EPSILON);

        let results = [synthetic("a", 1, 3, 5)];
        assert!(!score_levels(&results).levels[&1].unlocked);
    }

    #[test]
    fn gap_caps_achieved_level() {
        let results = [
            synthetic("a", 1, 1, 1),
            synthetic("b", 2, 0, 1),
            synthetic("c", 3, 1, 1),
        ];
        let summary = score_levels(&results);
        assert!(summary.levels[&3].unlocked);
        assert_eq!(summary.achieved_level, 1);
        assert_eq!(summary.next_level, Some(2));
    }

    #[test]
    fn nothing_unlocked() {
        let summary = score_levels(&[synthetic("a", 1, 0, 1)]);
        assert_eq!(summary.achieved_level, 0);
        assert_eq!(summary.next_level, Some(1));
    }

    #[test]
    fn all_levels_achieved() {
        let results: Vec<_> = (1..=5).map(|l| synthetic("x", l, 2, 2)).collect();
        let summary = score_levels(&results);
        assert_eq!(summary.achieved_level, 5);
        assert_eq!(summary.next_level, None);
    }

    // --- action items ---

    #[test]
    fn action_items_ranked_and_capped() {
        let tmp = TempDir::new().unwrap();
        let ctx = two_apps(tmp.path());
        let criteria = defs(&["readme", "lint_config", "type_check", "unit_tests", "agents_md"]);
        let mut results = vec![
            synthetic("readme", 1, 0, 1),
            synthetic("lint_config", 1, 0, 2),
            synthetic("type_check", 1, 1, 2),
            synthetic("unit_tests", 1, 0, 2),
            synthetic("agents_md", 2, 0, 1),
        ];
        results[1].failing_apps = Some(vec!["apps/api".to_string(), "apps/web".to_string()]);
        let summary = score_levels(&results);

        let items = derive_action_items(&ctx, &criteria, &results, &summary);
        let ids: Vec<&str> = items.iter().map(|i| i.criterion_id.as_str()).collect();
        assert_eq!(ids, vec!["lint_config", "unit_tests", "readme"]);
        assert_eq!(
            items[0].details,
            "Add lint config or lint script for: apps/api, apps/web."
        );
        assert_eq!(
            items[1].details,
            recommendation_for(CriterionId::UnitTests, &ctx)
        );
    }

    fn recommendation_for(id: CriterionId, ctx: &RepoContext) -> String {
        criteria::recommendation(id, ctx, &[])
    }

    #[test]
    fn action_items_skip_unscored() {
        let tmp = TempDir::new().unwrap();
        let ctx = two_apps(tmp.path());
        let criteria = defs(&["readme", "lint_config"]);
        let results = vec![synthetic("readme", 1, 0, 0), synthetic("lint_config", 1, 0, 0)];
        let summary = score_levels(&results);
        assert!(derive_action_items(&ctx, &criteria, &results, &summary).is_empty());
    }

    #[test]
    fn no_action_items_when_complete() {
        let tmp = TempDir::new().unwrap();
        let ctx = two_apps(tmp.path());
        let results: Vec<_> = (1..=5).map(|l| synthetic("readme", l, 0, 1)).collect();
        let summary = LevelSummary {
            achieved_level: 5,
            next_level: None,
            ..score_levels(&results)
        };
        assert!(derive_action_items(&ctx, CRITERIA, &results, &summary).is_empty());
    }

    // --- reports ---

    #[test]
    fn bare_manifest_repo_scores_zero() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "package.json", r#"{"name": "root-app"}"#);
        let report = build_report(tmp.path(), "0.1.0-test", ReadinessOptions::default());

        assert_eq!(report.level_summary.achieved_level, 0);
        assert_eq!(report.level_summary.next_level, Some(1));
        assert!(!report.action_items.is_empty());
        let l1: Vec<&str> = CRITERIA
            .iter()
            .filter(|c| c.level == 1)
            .map(|c| c.id.as_str())
            .collect();
        assert!(report.action_items.iter().all(|i| l1.contains(&i.criterion_id.as_str())));
    }

    #[test]
    fn documented_repo_reaches_level_one() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "README.md", "# Sample\n\nRun: npm start\nTest: npm test\n");
        write(root, "AGENTS.md", "# Agent Instructions\n");
        write(
            root,
            "package.json",
            r#"{"name": "root-app", "scripts": {"lint": "eslint .", "test": "echo test"}}"#,
        );
        write(root, "tsconfig.json", r#"{"compilerOptions": {"strict": true}}"#);

        let report = build_report(root, "0.1.0-test", ReadinessOptions::default());
        for id in ["lint_config", "type_check", "unit_tests", "readme", "agents_md"] {
            let r = report.result(id).unwrap();
            assert_eq!((r.numerator, r.denominator), (1, 1), "{}", id);
        }
        assert!(report.level_summary.achieved_level >= 1);
        assert_eq!(report.levels, report.level_summary.levels);
        let ids: Vec<&str> = report.action_items.iter().map(|i| i.criterion_id.as_str()).collect();
        assert!(ids.contains(&"devcontainer") || ids.contains(&"precommit_hooks"));
    }

    #[test]
    fn rerun_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "package.json", r#"{"workspaces": ["apps/*"]}"#);
        write(root, "apps/api/package.json", r#"{"scripts": {"test": "jest"}}"#);
        write(root, "apps/web/package.json", "{}");

        let a = build_report(root, "t", ReadinessOptions::default());
        let b = build_report(root, "t", ReadinessOptions::default());
        assert_ne!(a.report_id, b.report_id);
        assert_eq!(a.report, b.report);
        assert_eq!(a.criteria_meta, b.criteria_meta);
        assert_eq!(a.levels, b.levels);
        assert_eq!(a.action_items, b.action_items);
    }

    #[test]
    fn signals_summary_only_when_opted_in() {
        let tmp = TempDir::new().unwrap();
        let plain = build_report(tmp.path(), "t", ReadinessOptions::default());
        assert!(plain.signals.is_none());

        let options = ReadinessOptions {
            ci_provider: Some(CiProvider::Github),
            ..Default::default()
        };
        let report = build_report(tmp.path(), "t", options);
        let signals = report.signals.unwrap();
        assert_eq!(signals.ci_provider, Some(CiProvider::Github));
        assert!(signals.deploy_source.is_none());
    }

    #[test]
    fn serialized_maps_follow_registry_order() {
        let tmp = TempDir::new().unwrap();
        let report = build_report(tmp.path(), "t", ReadinessOptions::default());
        let json = serde_json::to_string(&report).unwrap();
        let positions: Vec<usize> = CRITERIA
            .iter()
            .map(|c| json.find(&format!("\"{}\":{{\"id\"", c.id.as_str())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
