//! Policy decision input and output types.
//!
//! The policy engine consumes a `PolicyInput` and produces a
//! `PolicyDecision`.  The service is deny-by-default: a request is allowed
//! only when at least one allow rule matches and no deny rule does.

use serde::{Deserialize, Serialize};

/// The principal a policy decision is being made about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    /// Stable identifier of the caller (service name, user id, …).
    #[serde(default)]
    pub id: String,

    /// Roles the subject holds.  Matched case-insensitively against rule
    /// role lists.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Arbitrary subject attributes, addressable from rule conditions via
    /// `subject.<path>`.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Everything the policy engine needs to make a decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyInput {
    /// Who is asking.
    #[serde(default)]
    pub subject: Subject,

    /// The action being attempted, e.g. `"audit.ingest"`.
    #[serde(default)]
    pub action: String,

    /// The resource the action targets, e.g. `"trade"`.
    #[serde(default)]
    pub resource: String,

    /// Request-scoped attributes, addressable from rule conditions via
    /// `context.<path>`.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// The decision emitted for one `PolicyInput`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// The final verdict.
    pub allow: bool,

    /// Ids of allow rules that matched.
    pub matched_rules: Vec<String>,

    /// Ids of deny rules that matched.  Any entry here forces `allow = false`.
    pub denied_rules: Vec<String>,

    /// Short human-readable explanation of the verdict.
    pub reason: String,

    /// True when no rule matched at all and the deny-by-default path fired.
    pub default_deny: bool,

    /// How many rules were evaluated.
    pub evaluated_rules: u32,
}
