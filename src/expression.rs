//! Boolean expression over attribute clauses
//!
//! Values of the same definition form one clause combined by the definition's
//! rule; clauses are AND-ed together. Clauses are kept sorted by definition
//! FQN so that planning is deterministic.

use crate::error::KeySplitError;
use crate::fqn::{display_decode, validate_attribute_fqn};
use crate::policy::{AttributeDefinition, AttributeRule, AttributeValue};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Values of one attribute definition and the rule combining them
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeClause {
    pub definition: Arc<AttributeDefinition>,
    pub values: Vec<AttributeValue>,
    pub rule: AttributeRule,
}

impl AttributeClause {
    pub fn new(definition: Arc<AttributeDefinition>) -> Self {
        let rule = definition.rule;
        Self {
            definition,
            values: Vec::new(),
            rule,
        }
    }
}

impl fmt::Display for AttributeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values.as_slice() {
            [] => f.write_str(&self.definition.fqn),
            [only] => f.write_str(&only.fqn),
            values => {
                let names: Vec<String> = values.iter().map(value_name).collect();
                write!(
                    f,
                    "{}({}: {{{}}})",
                    self.rule,
                    self.definition.fqn,
                    names.join(", ")
                )
            }
        }
    }
}

fn value_name(value: &AttributeValue) -> String {
    match value.fqn.rsplit_once("/value/") {
        Some((_, raw)) => display_decode(raw),
        None => value.value.clone(),
    }
}

/// Conjunction of attribute clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanExpression {
    pub clauses: Vec<AttributeClause>,
}

impl BooleanExpression {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for BooleanExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("∅");
        }
        let parts: Vec<String> = self.clauses.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" ∧ "))
    }
}

/// Group attribute values into clauses keyed by definition FQN
///
/// Each value must carry a well-formed FQN, an attached definition and a
/// supported rule; the first violation aborts the build.
pub fn build_boolean_expression(
    values: &[AttributeValue],
) -> Result<BooleanExpression, KeySplitError> {
    let mut clauses: BTreeMap<String, AttributeClause> = BTreeMap::new();

    for value in values {
        validate_attribute_fqn(&value.fqn).map_err(|source| KeySplitError::InvalidAttributeFqn {
            fqn: value.fqn.clone(),
            source,
        })?;

        let definition = value
            .attribute
            .as_ref()
            .ok_or_else(|| KeySplitError::MissingDefinition {
                fqn: value.fqn.clone(),
            })?;

        validate_attribute_rule(definition.rule, &definition.fqn)?;

        clauses
            .entry(definition.fqn.clone())
            .or_insert_with(|| AttributeClause::new(Arc::clone(definition)))
            .values
            .push(value.clone());
    }

    let expression = BooleanExpression {
        clauses: clauses.into_values().collect(),
    };
    debug!(
        clauses = expression.clauses.len(),
        expression = %expression,
        "built boolean expression"
    );
    Ok(expression)
}

/// Reject rule codes the planner cannot handle
pub fn validate_attribute_rule(rule: AttributeRule, fqn: &str) -> Result<(), KeySplitError> {
    if rule.is_supported() {
        Ok(())
    } else {
        Err(KeySplitError::InvalidRule {
            fqn: fqn.to_string(),
            rule,
        })
    }
}
