//! Split planning
//!
//! Turns a [`BooleanExpression`] into split assignments. Every assignment is
//! one XOR share of the DEK and lists the KAS servers that may unwrap it.
//!
//! - `allOf` (and `unspecified`): each value gets its own share, so all of
//!   them are needed to reconstruct the key.
//! - `anyOf` and `hierarchy`: the clause shares one split wrapped for every
//!   KAS of every value, so any one of them suffices.

use crate::error::KeySplitError;
use crate::expression::{AttributeClause, BooleanExpression};
use crate::grants::{resolve_attribute_grants, KasGrant};
use crate::policy::{AttributeRule, SimpleKasPublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// One share of the DEK and the KAS servers it is wrapped for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitAssignment {
    pub split_id: String,
    pub kas_urls: Vec<String>,
    #[serde(default)]
    pub keys: BTreeMap<String, SimpleKasPublicKey>,
}

/// Plan the splits needed to satisfy `expression`
///
/// Falls back to a single split on `default_kas` when no clause produces an
/// assignment. With no default KAS that fallback is an empty plan.
pub fn create_split_plan(
    expression: &BooleanExpression,
    default_kas: Option<&str>,
) -> Result<Vec<SplitAssignment>, KeySplitError> {
    if expression.clauses.is_empty() {
        return Ok(create_default_split_plan(default_kas));
    }

    let mut plan = Vec::new();
    for clause in &expression.clauses {
        plan.extend(process_boolean_clause(clause)?);
    }

    if plan.is_empty() {
        warn!(
            expression = %expression,
            "no attribute value resolved to a KAS, using default plan"
        );
        return Ok(create_default_split_plan(default_kas));
    }

    debug!(assignments = plan.len(), "created split plan");
    Ok(plan)
}

/// Assignments contributed by a single clause
pub fn process_boolean_clause(
    clause: &AttributeClause,
) -> Result<Vec<SplitAssignment>, KeySplitError> {
    match clause.rule {
        AttributeRule::AllOf | AttributeRule::Unspecified => Ok(process_all_of(clause)),
        AttributeRule::AnyOf | AttributeRule::Hierarchy => {
            Ok(process_any_of(clause).into_iter().collect())
        }
        AttributeRule::Unknown(_) => Err(KeySplitError::InvalidRule {
            fqn: clause.definition.fqn.clone(),
            rule: clause.rule,
        }),
    }
}

fn process_all_of(clause: &AttributeClause) -> Vec<SplitAssignment> {
    let mut assignments = Vec::with_capacity(clause.values.len());

    for value in &clause.values {
        let resolved = match resolve_attribute_grants(value) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(fqn = %value.fqn, error = %e, "skipping attribute value without KAS");
                continue;
            }
        };

        assignments.push(SplitAssignment {
            split_id: generate_split_id(),
            kas_urls: extract_kas_urls(&resolved.grants),
            keys: extract_kas_keys(&resolved.grants),
        });
    }

    assignments
}

fn process_any_of(clause: &AttributeClause) -> Option<SplitAssignment> {
    let mut grants: Vec<KasGrant> = Vec::new();

    for value in &clause.values {
        match resolve_attribute_grants(value) {
            Ok(resolved) => {
                for grant in resolved.grants {
                    if !grants.iter().any(|g| g.url == grant.url) {
                        grants.push(grant);
                    }
                }
            }
            Err(e) => {
                warn!(fqn = %value.fqn, error = %e, "skipping attribute value without KAS");
            }
        }
    }

    if grants.is_empty() {
        return None;
    }

    Some(SplitAssignment {
        split_id: generate_split_id(),
        kas_urls: extract_kas_urls(&grants),
        keys: extract_kas_keys(&grants),
    })
}

/// KAS URLs of `grants`, sorted
pub fn extract_kas_urls(grants: &[KasGrant]) -> Vec<String> {
    let mut urls: Vec<String> = grants.iter().map(|g| g.url.clone()).collect();
    urls.sort();
    urls
}

/// Public keys of the grants that carry one
pub fn extract_kas_keys(grants: &[KasGrant]) -> BTreeMap<String, SimpleKasPublicKey> {
    let mut keys = BTreeMap::new();
    for grant in grants {
        if let Some(key) = &grant.public_key {
            keys.entry(grant.url.clone()).or_insert_with(|| key.clone());
        }
    }
    keys
}

/// Single unnamed split on the default KAS, or nothing without one
pub fn create_default_split_plan(default_kas: Option<&str>) -> Vec<SplitAssignment> {
    match default_kas {
        Some(url) if !url.is_empty() => vec![SplitAssignment {
            split_id: String::new(),
            kas_urls: vec![url.to_string()],
            keys: BTreeMap::new(),
        }],
        _ => Vec::new(),
    }
}

/// Fresh random split identifier
pub fn generate_split_id() -> String {
    Uuid::new_v4().to_string()
}
