//! Policy rule types and configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML and holds a list of
//! `PolicyRule`s.  Unlike a first-match-wins chain, *every* rule is
//! evaluated for each request: any matching deny rule overrides any number
//! of matching allow rules, and a request with no matching allow rule is
//! denied by default.

use serde::{Deserialize, Serialize};

/// What a matching rule contributes to the decision.
///
/// Expressed as a plain lowercase string in TOML:
/// ```toml
/// effect = "allow"
/// effect = "deny"
/// ```
/// Anything else is rejected when the policy file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleEffect {
    Allow,
    Deny,
}

/// Comparison operator for a rule condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionOp {
    /// Stringified equality.
    Eq,
    /// Stringified inequality.
    Neq,
    /// Numeric greater-or-equal (both sides must coerce to a number).
    Gte,
    /// Numeric less-or-equal (both sides must coerce to a number).
    Lte,
    /// Membership in a list of values, compared stringified.
    In,
}

/// One attribute condition attached to a rule.
///
/// `key` is a dot-path rooted at `subject.` (subject attributes) or
/// `context.` (request context), e.g. `"context.amount_usd"`.  A rule only
/// matches when every condition holds; a missing key fails its condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub op: ConditionOp,
    pub value: serde_json::Value,
}

/// A single policy rule loaded from TOML.
///
/// Empty `actions`, `resources`, or `roles` lists match anything, and the
/// wildcard `"*"` entry matches any string.  Action and resource patterns
/// compare case-insensitively, as do roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Stable identifier echoed in decisions and audit lines.
    pub id: String,

    /// Whether a match allows or denies the request.
    pub effect: RuleEffect,

    /// Action patterns to match against `PolicyInput::action`.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Resource patterns to match against `PolicyInput::resource`.
    #[serde(default)]
    pub resources: Vec<String>,

    /// Roles the subject must intersect for this rule to apply.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Attribute conditions that must all hold.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl PolicyRule {
    /// Return true when this rule applies to the given action, resource, and
    /// subject roles (conditions are checked separately by the engine).
    pub fn applies_to(&self, action: &str, resource: &str, subject_roles: &[String]) -> bool {
        match_patterns(&self.actions, action)
            && match_patterns(&self.resources, resource)
            && (self.roles.is_empty() || intersects(&self.roles, subject_roles))
    }
}

/// Pattern list matching: empty means "any", `"*"` is a wildcard, otherwise
/// case-insensitive equality.
fn match_patterns(patterns: &[String], value: &str) -> bool {
    if patterns.is_empty() {
        return true;
    }
    patterns
        .iter()
        .any(|p| p == "*" || p.eq_ignore_ascii_case(value))
}

/// Case-insensitive role intersection.
fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter()
        .any(|x| b.iter().any(|y| x.eq_ignore_ascii_case(y)))
}

/// The top-level structure deserialized from a TOML policy file.
///
/// Example:
/// ```toml
/// [[rules]]
/// id = "allow-backend-ingest"
/// effect = "allow"
/// actions = ["audit.ingest"]
/// resources = ["trade"]
/// roles = ["backend"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// All rules; every one is evaluated for every request.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}
