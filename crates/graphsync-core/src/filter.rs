//! Asset filter engine.
//!
//! A filter is a two-level rule set: the outer level is combined with logical
//! OR, each inner group with logical AND. A resource passes the filter when at
//! least one group has every rule's regex matching the resource's
//! corresponding field. An empty rule set matches everything.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A single filter rule: a field name and the regex it must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// The filterable field the rule applies to (e.g. `building`).
    pub parameter: String,
    /// Regular expression matched against the field value.
    pub regex: String,
}

/// Errors raised while evaluating a filter.
///
/// A broken rule is an error, not a silent skip: the caller must know that a
/// resource was neither accepted nor rejected.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The rule references a field the resource does not expose.
    #[error("unknown filter field: {0}")]
    UnknownField(String),

    /// The rule's regex does not compile.
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Evaluates `groups` against the resource's flat field map.
///
/// Returns `Ok(true)` when some group has every rule matching, `Ok(false)`
/// when no group matches, and an error when any consulted rule is malformed
/// or references a missing field. Empty `groups` always match.
pub fn matches(
    fields: &HashMap<String, String>,
    groups: &[Vec<FilterRule>],
) -> Result<bool, FilterError> {
    if groups.is_empty() {
        return Ok(true);
    }

    for group in groups {
        let mut all = true;
        for rule in group {
            let value = fields
                .get(&rule.parameter)
                .ok_or_else(|| FilterError::UnknownField(rule.parameter.clone()))?;
            let re = Regex::new(&rule.regex).map_err(|source| FilterError::InvalidRegex {
                pattern: rule.regex.clone(),
                source,
            })?;
            if !re.is_match(value) {
                all = false;
                break;
            }
        }
        if all {
            return Ok(true);
        }
    }
    Ok(false)
}
