//! TOML-driven attribute-based policy engine.
//!
//! `PolicyEngine` loads a `PolicyConfig` from a TOML string or file and
//! evaluates `PolicyInput`s against it.
//!
//! Evaluation algorithm:
//!
//! 1. Every rule is evaluated (no short-circuit): a rule applies when its
//!    action, resource, and role lists match and all of its conditions hold.
//! 2. Matching deny rules and allow rules are collected separately.
//! 3. Any deny → denied with reason "explicit deny", regardless of allows.
//! 4. Otherwise any allow → allowed.
//! 5. Otherwise → denied by default with reason "no matching allow".

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use assure_contracts::{AssureError, AssureResult, PolicyDecision, PolicyInput};

use crate::rule::{Condition, ConditionOp, PolicyConfig, RuleEffect};

/// The policy decision engine, constructed from a static rule file.
///
/// ```rust,ignore
/// use assure_policy::PolicyEngine;
///
/// let engine = PolicyEngine::from_file(Path::new("policies/policy.toml"))?;
/// let decision = engine.evaluate(&input);
/// ```
#[derive(Debug)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    /// Parse `s` as TOML and build an engine.
    ///
    /// Returns `AssureError::Config` when the TOML is malformed or does not
    /// match the `PolicyConfig` schema (including unknown effects or
    /// condition operators).
    pub fn from_toml_str(s: &str) -> AssureResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| AssureError::Config {
            reason: format!("failed to parse policy TOML: {e}"),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as a TOML policy configuration.
    pub fn from_file(path: &Path) -> AssureResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AssureError::Config {
            reason: format!("failed to read policy file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Evaluate `input` against the full rule set.
    ///
    /// Deny-by-default: the request is allowed only when at least one allow
    /// rule matches and no deny rule does.
    pub fn evaluate(&self, input: &PolicyInput) -> PolicyDecision {
        debug!(
            subject = %input.subject.id,
            action = %input.action,
            resource = %input.resource,
            "evaluating policy"
        );

        let mut decision = PolicyDecision {
            default_deny: true,
            ..PolicyDecision::default()
        };
        let mut allow_found = false;

        for rule in &self.config.rules {
            decision.evaluated_rules += 1;
            if !rule.applies_to(&input.action, &input.resource, &input.subject.roles) {
                continue;
            }
            if !conditions_match(&rule.conditions, input) {
                continue;
            }

            match rule.effect {
                RuleEffect::Deny => {
                    debug!(rule_id = %rule.id, "deny rule matched");
                    decision.denied_rules.push(rule.id.clone());
                }
                RuleEffect::Allow => {
                    debug!(rule_id = %rule.id, "allow rule matched");
                    allow_found = true;
                    decision.matched_rules.push(rule.id.clone());
                }
            }
        }

        if !decision.denied_rules.is_empty() {
            decision.allow = false;
            decision.reason = "explicit deny".to_string();
            return decision;
        }
        if allow_found {
            decision.allow = true;
            decision.reason = "allow".to_string();
            decision.default_deny = false;
            return decision;
        }

        warn!(
            action = %input.action,
            resource = %input.resource,
            subject = %input.subject.id,
            "no policy rule matched; denying by default"
        );
        decision.allow = false;
        decision.reason = "no matching allow".to_string();
        decision
    }
}

/// True when every condition holds against the input.
///
/// Conditions with an empty key are skipped; a key that does not resolve
/// fails its condition.
fn conditions_match(conditions: &[Condition], input: &PolicyInput) -> bool {
    for condition in conditions {
        if condition.key.is_empty() {
            continue;
        }
        let actual = match resolve_value(input, &condition.key) {
            Some(value) => value,
            None => return false,
        };
        if !compare(actual, condition.op, &condition.value) {
            return false;
        }
    }
    true
}

/// Resolve a dot-path rooted at `subject.` or `context.` against the input.
fn resolve_value<'v>(input: &'v PolicyInput, path: &str) -> Option<&'v Value> {
    let mut parts = path.split('.');
    let map = match parts.next()? {
        "subject" => &input.subject.attributes,
        "context" => &input.context,
        _ => return None,
    };
    let mut current = map.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Apply one condition operator.
fn compare(actual: &Value, op: ConditionOp, expected: &Value) -> bool {
    match op {
        ConditionOp::Eq => value_as_string(actual) == value_as_string(expected),
        ConditionOp::Neq => value_as_string(actual) != value_as_string(expected),
        ConditionOp::Gte => match (value_as_f64(actual), value_as_f64(expected)) {
            (Some(a), Some(e)) => a >= e,
            _ => false,
        },
        ConditionOp::Lte => match (value_as_f64(actual), value_as_f64(expected)) {
            (Some(a), Some(e)) => a <= e,
            _ => false,
        },
        ConditionOp::In => match expected.as_array() {
            Some(items) => {
                let actual = value_as_string(actual);
                items.iter().any(|item| value_as_string(item) == actual)
            }
            None => false,
        },
    }
}

/// Stringify a value for equality comparison: strings compare by content,
/// null as empty, everything else by its JSON rendering.
fn value_as_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a value to a number for ordered comparison; numeric strings count.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use assure_contracts::{PolicyInput, Subject};

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn engine(toml_src: &str) -> PolicyEngine {
        PolicyEngine::from_toml_str(toml_src).unwrap()
    }

    fn input(roles: &[&str], action: &str, resource: &str, context: serde_json::Value) -> PolicyInput {
        PolicyInput {
            subject: Subject {
                id: "u1".to_string(),
                roles: roles.iter().map(|s| s.to_string()).collect(),
                attributes: serde_json::Map::new(),
            },
            action: action.to_string(),
            resource: resource.to_string(),
            context: context.as_object().cloned().unwrap_or_default(),
        }
    }

    // ── Core verdict logic ────────────────────────────────────────────────────

    /// A matching allow rule with matching roles allows the request.
    #[test]
    fn allow_rule_allows() {
        let engine = engine(
            r#"
            [[rules]]
            id = "allow-ingest"
            effect = "allow"
            actions = ["audit.ingest"]
            resources = ["trade"]
            roles = ["backend"]
            "#,
        );

        let decision = engine.evaluate(&input(&["backend"], "audit.ingest", "trade", json!({})));

        assert!(decision.allow);
        assert!(!decision.default_deny);
        assert_eq!(decision.reason, "allow");
        assert_eq!(decision.matched_rules, vec!["allow-ingest"]);
        assert_eq!(decision.evaluated_rules, 1);
    }

    /// A deny rule whose condition fires overrides a matching allow rule.
    #[test]
    fn deny_overrides_allow() {
        let engine = engine(
            r#"
            [[rules]]
            id = "allow-swap"
            effect = "allow"
            actions = ["swap.execute"]
            resources = ["wallet"]
            roles = ["user"]

            [[rules]]
            id = "deny-large"
            effect = "deny"
            actions = ["swap.execute"]
            resources = ["wallet"]
            roles = ["user"]
            conditions = [{ key = "context.amount_usd", op = "gte", value = 1000 }]
            "#,
        );

        let decision = engine.evaluate(&input(
            &["user"],
            "swap.execute",
            "wallet",
            json!({ "amount_usd": 1500 }),
        ));

        assert!(!decision.allow);
        assert_eq!(decision.reason, "explicit deny");
        assert_eq!(decision.denied_rules, vec!["deny-large"]);
        assert_eq!(decision.matched_rules, vec!["allow-swap"]);
    }

    /// The same deny rule stays dormant below its threshold.
    #[test]
    fn deny_condition_below_threshold_allows() {
        let engine = engine(
            r#"
            [[rules]]
            id = "allow-swap"
            effect = "allow"
            actions = ["swap.execute"]

            [[rules]]
            id = "deny-large"
            effect = "deny"
            actions = ["swap.execute"]
            conditions = [{ key = "context.amount_usd", op = "gte", value = 1000 }]
            "#,
        );

        let decision = engine.evaluate(&input(
            &[],
            "swap.execute",
            "wallet",
            json!({ "amount_usd": 250 }),
        ));

        assert!(decision.allow);
        assert!(decision.denied_rules.is_empty());
    }

    /// With no matching rule the request is denied by default.
    #[test]
    fn default_deny_when_nothing_matches() {
        let engine = engine(
            r#"
            [[rules]]
            id = "allow-reads"
            effect = "allow"
            actions = ["audit.read"]
            "#,
        );

        let decision = engine.evaluate(&input(&[], "audit.write", "log", json!({})));

        assert!(!decision.allow);
        assert!(decision.default_deny);
        assert_eq!(decision.reason, "no matching allow");
        assert_eq!(decision.evaluated_rules, 1);
    }

    // ── Conditions ────────────────────────────────────────────────────────────

    /// A condition on a missing key fails the rule rather than the request.
    #[test]
    fn missing_condition_key_skips_rule() {
        let engine = engine(
            r#"
            [[rules]]
            id = "allow-tier"
            effect = "allow"
            actions = ["*"]
            conditions = [{ key = "subject.tier", op = "eq", value = "gold" }]
            "#,
        );

        let decision = engine.evaluate(&input(&[], "anything", "r", json!({})));
        assert!(!decision.allow);
        assert!(decision.default_deny);
    }

    /// Dot-paths resolve through nested subject attributes.
    #[test]
    fn nested_subject_attribute_resolves() {
        let engine = engine(
            r#"
            [[rules]]
            id = "allow-region"
            effect = "allow"
            conditions = [{ key = "subject.org.region", op = "eq", value = "eu" }]
            "#,
        );

        let mut subject = Subject {
            id: "u1".to_string(),
            ..Subject::default()
        };
        subject.attributes.insert("org".to_string(), json!({ "region": "eu" }));
        let decision = engine.evaluate(&PolicyInput {
            subject,
            action: "x".to_string(),
            resource: "y".to_string(),
            context: serde_json::Map::new(),
        });

        assert!(decision.allow);
    }

    /// `in` membership, `neq`, and `lte` operators behave as advertised.
    #[test]
    fn remaining_operators() {
        let engine = engine(
            r#"
            [[rules]]
            id = "ops"
            effect = "allow"
            conditions = [
                { key = "context.env", op = "in", value = ["staging", "prod"] },
                { key = "context.env", op = "neq", value = "dev" },
                { key = "context.retries", op = "lte", value = 3 },
            ]
            "#,
        );

        let allowed = engine.evaluate(&input(&[], "a", "r", json!({ "env": "prod", "retries": 2 })));
        assert!(allowed.allow);

        let too_many = engine.evaluate(&input(&[], "a", "r", json!({ "env": "prod", "retries": 5 })));
        assert!(!too_many.allow);

        let wrong_env = engine.evaluate(&input(&[], "a", "r", json!({ "env": "dev", "retries": 1 })));
        assert!(!wrong_env.allow);
    }

    /// Numeric strings coerce for ordered comparisons.
    #[test]
    fn numeric_strings_coerce() {
        let engine = engine(
            r#"
            [[rules]]
            id = "min-score"
            effect = "allow"
            conditions = [{ key = "context.score", op = "gte", value = "10" }]
            "#,
        );

        let decision = engine.evaluate(&input(&[], "a", "r", json!({ "score": 12 })));
        assert!(decision.allow);
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    /// Malformed TOML is a configuration error.
    #[test]
    fn malformed_toml_is_config_error() {
        match PolicyEngine::from_toml_str("rules = 3") {
            Err(AssureError::Config { reason }) => {
                assert!(reason.contains("policy TOML"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    /// An empty document is a valid, deny-everything policy.
    #[test]
    fn empty_policy_denies_everything() {
        let engine = PolicyEngine::from_toml_str("").unwrap();
        let decision = engine.evaluate(&input(&[], "a", "r", json!({})));
        assert!(!decision.allow);
        assert_eq!(decision.evaluated_rules, 0);
    }
}
