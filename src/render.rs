//! Markdown rendering of a finished report.

use crate::types::{LevelDetail, ReadinessReport, Status};
use std::collections::BTreeMap;

pub fn render_markdown(report: &ReadinessReport) -> String {
    let summary = &report.level_summary;
    let achieved = summary.achieved_level;
    let empty = LevelDetail {
        completion: 0.0,
        evaluated_count: 0,
        pass_count: 0,
        unlocked: false,
    };
    let current = report.levels.get(&achieved).unwrap_or(&empty);

    let mut lines: Vec<String> = vec!["# Agent Readiness Report".to_string(), String::new()];
    lines.push(format!("- Repo root: {}", report.repo_root));
    if let Some(url) = &report.repo_url {
        lines.push(format!("- Repo URL: {}", url));
    }
    lines.push(format!(
        "- Level achieved: {} ({} complete)",
        achieved,
        percent(current.completion)
    ));
    match summary.next_level.and_then(|n| report.levels.get(&n).map(|d| (n, d))) {
        Some((next, detail)) => lines.push(format!(
            "- Next gate: Level {} ({} / {} required)",
            next,
            percent(detail.completion),
            percent(summary.gate)
        )),
        None => lines.push("- Next gate: none (all levels achieved)".to_string()),
    }
    let apps: Vec<&str> = report.apps.iter().map(|a| a.id.as_str()).collect();
    lines.push(format!(
        "- Apps discovered: {}",
        if apps.is_empty() { "none".to_string() } else { apps.join(", ") }
    ));

    lines.push(String::new());
    lines.push("## Criteria".to_string());

    let mut grouped: BTreeMap<u8, Vec<_>> = BTreeMap::new();
    for result in &report.report {
        grouped.entry(result.level).or_default().push(result);
    }
    let max_visible = (achieved + 1).min(5);
    for (level, results) in grouped.range(..=max_visible) {
        let progress = report.levels.get(level).unwrap_or(&empty);
        let label = if progress.evaluated_count == 0 {
            "not evaluated".to_string()
        } else {
            format!(
                "{}/{} = {}",
                progress.pass_count,
                progress.evaluated_count,
                percent(progress.completion)
            )
        };
        lines.push(String::new());
        lines.push(format!("### Level {} ({})", level, label));
        for result in results {
            let status = report
                .meta(&result.id)
                .map(|m| status_label(m.status))
                .unwrap_or("UNKNOWN");
            let evidence = match &result.evidence {
                Some(items) if !items.is_empty() => format!(" [{}]", items.join(", ")),
                _ => String::new(),
            };
            lines.push(format!(
                "- [{}] {} ({}/{}): {}{}",
                status, result.id, result.numerator, result.denominator, result.rationale, evidence
            ));
        }
    }

    if !report.action_items.is_empty() {
        lines.push(String::new());
        lines.push("## Top action items".to_string());
        for item in &report.action_items {
            lines.push(format!("- {}: {}", item.title, item.details));
        }
    }

    lines.join("\n")
}

fn percent(value: f64) -> String {
    format!("{}%", (value * 100.0).round() as i64)
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::NotApplicable => "N/A",
        Status::NotEvaluated => "NOT EVALUATED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_report;
    use crate::types::ReadinessOptions;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn renders_level_zero() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"name": "root-app"}"#).unwrap();
        let report = build_report(tmp.path(), "0.1.0-test", ReadinessOptions::default());

        let output = render_markdown(&report);
        assert!(output.contains("Agent Readiness Report"));
        assert!(output.contains("Level achieved: 0 (0% complete)"));
        assert!(output.contains("- Next gate: Level 1 (0% / 80% required)"));
        assert!(output.contains("- Apps discovered: ."));
        assert!(output.contains("### Level 1 (0/4 = 0%)"));
        assert!(!output.contains("### Level 2"));
        assert!(output.contains("## Top action items"));
    }

    #[test]
    fn renders_status_and_evidence() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("README.md"), "Run: cargo run\nTest: cargo test\n").unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join("clippy.toml"), "").unwrap();
        let report = build_report(root, "0.1.0-test", ReadinessOptions::default());

        let output = render_markdown(&report);
        assert!(output.contains(
            "- [PASS] readme (1/1): README.md includes run/build/test guidance. [README.md]"
        ));
        assert!(output.contains("### Level 2"));
        assert!(output.contains("- [FAIL] agents_md (0/1): AGENTS.md not found."));
        assert!(!output.contains("### Level 3"));
    }
}
