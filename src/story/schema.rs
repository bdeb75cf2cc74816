//! Story document schema, version 1.
//!
//! Validation runs over a generic JSON value so that every field-level
//! violation is collected and reported together instead of stopping at the
//! first serde error. YAML documents are converted to the same value model
//! before validation.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::{AcceptanceCriterion, Criticality, Domain, Story};

/// Major schema version understood by this build.
pub const SCHEMA_VERSION: u64 = 1;

static STORY_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap());

/// Check that a story id is safe to use as a file name and signal address.
pub fn is_valid_story_id(id: &str) -> bool {
    STORY_ID_REGEX.is_match(id)
}

/// Validate a parsed story document and build a [`Story`] from it.
///
/// Returns every violation found, formatted as `<field>: <problem>`.
pub fn validate(doc: &Value) -> Result<Story, Vec<String>> {
    let mut violations = Vec::new();

    let Some(obj) = doc.as_object() else {
        return Err(vec!["document: expected a mapping at the top level".to_string()]);
    };

    check_schema_version(obj, &mut violations);

    let id = required_str(obj, "id", "id", &mut violations);
    if let Some(id) = &id
        && !is_valid_story_id(id)
    {
        violations.push(format!(
            "id: '{}' may only contain letters, digits, '.', '_' and '-'",
            id
        ));
    }
    let title = required_str(obj, "title", "title", &mut violations);
    let epic = required_str(obj, "epic", "epic", &mut violations);
    let status = required_str(obj, "status", "status", &mut violations);

    let criticality = match obj.get("criticality") {
        Some(Value::String(s)) => match s.parse::<Criticality>() {
            Ok(c) => Some(c),
            Err(e) => {
                violations.push(format!("criticality: {}", e));
                None
            }
        },
        Some(_) => {
            violations.push("criticality: expected a string (A-E)".to_string());
            None
        }
        None => {
            violations.push("criticality: required".to_string());
            None
        }
    };

    let wave = match obj.get("wave") {
        None | Some(Value::Null) => 0,
        Some(v) => match v.as_u64().and_then(|w| u32::try_from(w).ok()) {
            Some(w) => w,
            None => {
                violations.push("wave: expected a non-negative integer".to_string());
                0
            }
        },
    };

    let domain = match obj.get("domain") {
        None | Some(Value::Null) => Domain::Unspecified,
        Some(Value::String(s)) => Domain::classify(s),
        Some(_) => {
            violations.push("domain: expected a string".to_string());
            Domain::Unspecified
        }
    };

    let acceptance_criteria = validate_criteria(obj, &mut violations);

    if !violations.is_empty() {
        return Err(violations);
    }

    // Every required field was checked above; a missing one implies a violation.
    match (id, title, epic, status, criticality) {
        (Some(id), Some(title), Some(epic), Some(status), Some(criticality)) => Ok(Story {
            id,
            title,
            epic,
            domain,
            wave,
            criticality,
            status,
            acceptance_criteria,
        }),
        _ => Err(vec!["document: incomplete story".to_string()]),
    }
}

fn check_schema_version(obj: &Map<String, Value>, violations: &mut Vec<String>) {
    let supported = match obj.get("schema_version") {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n
            .as_f64()
            .is_some_and(|v| v.trunc() as u64 == SCHEMA_VERSION && v >= 0.0),
        Some(Value::String(s)) => s
            .split('.')
            .next()
            .and_then(|major| major.trim().parse::<u64>().ok())
            == Some(SCHEMA_VERSION),
        Some(_) => false,
    };
    if !supported {
        violations.push(format!(
            "schema_version: unsupported (this build understands version {})",
            SCHEMA_VERSION
        ));
    }
}

fn validate_criteria(
    obj: &Map<String, Value>,
    violations: &mut Vec<String>,
) -> Vec<AcceptanceCriterion> {
    let items = match obj.get("acceptance_criteria") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) => {
            violations.push("acceptance_criteria: at least one criterion is required".to_string());
            return Vec::new();
        }
        Some(_) => {
            violations.push("acceptance_criteria: expected a list".to_string());
            return Vec::new();
        }
        None => {
            violations.push("acceptance_criteria: required".to_string());
            return Vec::new();
        }
    };

    let mut criteria = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let prefix = format!("acceptance_criteria[{}]", i);
        let Some(ac) = item.as_object() else {
            violations.push(format!("{}: expected a mapping", prefix));
            continue;
        };

        let id = required_str(ac, "id", &format!("{}.id", prefix), violations);
        let kind = required_str(ac, "type", &format!("{}.type", prefix), violations);
        let behavior = required_str(ac, "behavior", &format!("{}.behavior", prefix), violations);
        let trigger = optional_str(ac, "trigger", &format!("{}.trigger", prefix), violations);
        let condition = optional_str(ac, "condition", &format!("{}.condition", prefix), violations);

        if let (Some(id), Some(kind), Some(behavior)) = (id, kind, behavior) {
            criteria.push(AcceptanceCriterion {
                id,
                kind,
                trigger,
                condition,
                behavior,
            });
        }
    }
    criteria
}

fn required_str(
    obj: &Map<String, Value>,
    key: &str,
    label: &str,
    violations: &mut Vec<String>,
) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) => {
            violations.push(format!("{}: must not be empty", label));
            None
        }
        Some(Value::Null) | None => {
            violations.push(format!("{}: required", label));
            None
        }
        Some(_) => {
            violations.push(format!("{}: expected a string", label));
            None
        }
    }
}

/// Optional clause; blank strings count as absent.
fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
    label: &str,
    violations: &mut Vec<String>,
) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) | Some(Value::Null) | None => None,
        Some(_) => {
            violations.push(format!("{}: expected a string", label));
            None
        }
    }
}
