//! # assure-policy
//!
//! Attribute-based policy decisions for the assurance service, driven by a
//! static TOML rule file.  Deny-by-default: a request passes only when an
//! allow rule matches it and no deny rule does.

pub mod engine;
pub mod rule;

pub use engine::PolicyEngine;
pub use rule::{Condition, ConditionOp, PolicyConfig, PolicyRule, RuleEffect};
