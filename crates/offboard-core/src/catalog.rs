//! The reference catalog: every known relation that can point at a staff
//! account, in the order the cascade must visit them.
//!
//! The catalog is pure data. It is validated once on construction and never
//! touches a store; it describes the store instead. It is written against a
//! superset schema, so a deployment may lack some of the relations it names.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
  Error, Result,
  rule::{Criticality, Policy, ReferenceRule},
};

/// An ordered, validated sequence of [`ReferenceRule`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
  rules: Vec<ReferenceRule>,
}

impl Catalog {
  /// Validate `rules` and build a catalog.
  ///
  /// Rejects duplicate `(relation, column)` pairs, names that are not plain
  /// SQL identifiers, empty reparent defaults, and any rewrite rule listed
  /// after a cascade-delete rule on the same relation (the rewrite would
  /// find nothing left to rewrite).
  pub fn new(rules: Vec<ReferenceRule>) -> Result<Self> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut cascaded: HashSet<&str> = HashSet::new();

    for rule in &rules {
      for ident in [&rule.relation, &rule.column] {
        if !is_identifier(ident) {
          return Err(Error::InvalidIdentifier(ident.clone()));
        }
      }

      if !seen.insert((rule.relation.as_str(), rule.column.as_str())) {
        return Err(Error::DuplicateRule {
          relation: rule.relation.clone(),
          column:   rule.column.clone(),
        });
      }

      if let Policy::ReparentTo { default } = &rule.policy
        && default.trim().is_empty()
      {
        return Err(Error::EmptyDefault {
          relation: rule.relation.clone(),
          column:   rule.column.clone(),
        });
      }

      if rule.policy.rewrites() && cascaded.contains(rule.relation.as_str())
      {
        return Err(Error::RuleAfterCascade {
          relation: rule.relation.clone(),
          column:   rule.column.clone(),
        });
      }

      if rule.policy == Policy::CascadeDelete {
        cascaded.insert(rule.relation.as_str());
      }
    }

    Ok(Self { rules })
  }

  /// The rules in visiting order. Calling this again restarts the sequence.
  pub fn rules(&self) -> &[ReferenceRule] { &self.rules }

  pub fn len(&self) -> usize { self.rules.len() }

  pub fn is_empty(&self) -> bool { self.rules.is_empty() }

  /// The catalog for staff accounts in the microfinance back office.
  ///
  /// Permission grants go first so a run that aborts later never leaves a
  /// half-deleted account holding privileges. Pointer columns that carry a
  /// foreign key to `profiles` are critical: if any survives, removing the
  /// profile row would fail anyway.
  pub fn staff_default() -> Self {
    use Criticality::{BestEffort, Critical};
    use Policy::{CascadeDelete, NullifyColumn};

    let rules = vec![
      ReferenceRule::new("user_roles", "user_id", CascadeDelete, Critical),
      ReferenceRule::new("notifications", "user_id", CascadeDelete, BestEffort),
      ReferenceRule::new("staff_sessions", "user_id", CascadeDelete, BestEffort),
      ReferenceRule::new("branches", "manager_id", NullifyColumn, Critical),
      ReferenceRule::new("clients", "assigned_officer_id", NullifyColumn, Critical),
      ReferenceRule::new("clients", "created_by", NullifyColumn, Critical),
      ReferenceRule::new("loans", "loan_officer_id", NullifyColumn, Critical),
      ReferenceRule::new("loans", "approved_by", NullifyColumn, Critical),
      ReferenceRule::new("repayments", "recorded_by", NullifyColumn, Critical),
      ReferenceRule::new(
        "savings_transactions",
        "recorded_by",
        NullifyColumn,
        BestEffort,
      ),
      ReferenceRule::new("audit_logs", "actor_id", NullifyColumn, BestEffort),
    ];

    Self { rules }
  }
}

impl Default for Catalog {
  fn default() -> Self { Self::staff_default() }
}

impl<'a> IntoIterator for &'a Catalog {
  type Item = &'a ReferenceRule;
  type IntoIter = std::slice::Iter<'a, ReferenceRule>;

  fn into_iter(self) -> Self::IntoIter { self.rules.iter() }
}

/// A plain SQL identifier: ASCII letter or underscore, then letters, digits,
/// or underscores.
pub fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
