//! Report validation against the embedded JSON schema, plus the count
//! invariant the schema cannot express.

use crate::error::{ReadinessError, Result};
use jsonschema::{Draft, Validator};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::Path;

const SCHEMA_SOURCE: &str = include_str!("../schemas/readiness-report.schema.json");

pub static REPORT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(SCHEMA_SOURCE).expect("embedded report schema is valid JSON")
});

static REPORT_VALIDATOR: Lazy<Validator> = Lazy::new(|| {
    compile(&REPORT_SCHEMA).expect("embedded report schema compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate a report against the embedded schema, then check count invariants.
pub fn validate_report(report: &Value) -> ValidationResult {
    run(&REPORT_VALIDATOR, report)
}

/// Validate against an arbitrary schema document.
pub fn validate_against(report: &Value, schema: &Value) -> Result<ValidationResult> {
    let validator = compile(schema)?;
    Ok(run(&validator, report))
}

/// Read a report file as JSON.
pub fn load_report(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReadinessError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ReadinessError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn compile(schema: &Value) -> Result<Validator> {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(schema)
        .map_err(|err| ReadinessError::Schema(err.to_string()))
}

fn run(validator: &Validator, report: &Value) -> ValidationResult {
    let mut errors: Vec<String> = validator
        .iter_errors(report)
        .map(|err| format!("{} {}", location(&err.instance_path().to_string()), err))
        .collect();
    if errors.is_empty() {
        check_counts(report, &mut errors);
    }
    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

fn location(path: &str) -> &str {
    if path.is_empty() { "(root)" } else { path }
}

/// Escape a key for use as a JSON pointer segment.
fn pointer(path: &str, key: &str) -> String {
    format!("{}/{}", path, key.replace('~', "~0").replace('/', "~1"))
}

fn check_counts(report: &Value, errors: &mut Vec<String>) {
    let Some(results) = report.get("report").and_then(Value::as_object) else {
        return;
    };
    for (id, result) in results {
        let numerator = result.get("numerator").and_then(Value::as_u64);
        let denominator = result.get("denominator").and_then(Value::as_u64);
        if let (Some(n), Some(d)) = (numerator, denominator)
            && n > d
        {
            errors.push(format!(
                "{} numerator must not exceed denominator",
                pointer("/report", id)
            ));
        }
    }
}
