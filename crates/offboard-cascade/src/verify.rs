//! Post-run verification. Side-effect free.

use offboard_core::{
  catalog::Catalog,
  report::{ResidualReference, Verification},
  rule::Policy,
  store::{Affected, DataStore, IdentityStore},
};
use uuid::Uuid;

use crate::{Error, Result};

pub struct Verifier<'s, D, I> {
  data:     &'s D,
  identity: &'s I,
  catalog:  &'s Catalog,
}

impl<'s, D, I> Verifier<'s, D, I>
where
  D: DataStore,
  I: IdentityStore,
{
  pub fn new(data: &'s D, identity: &'s I, catalog: &'s Catalog) -> Self {
    Self { data, identity, catalog }
  }

  /// Report whether either plane still holds a record for `target`, and
  /// which catalogued relations still point at it.
  pub async fn verify(&self, target: Uuid) -> Result<Verification> {
    let data_record_present = self
      .data
      .record_exists(target)
      .await
      .map_err(|e| Error::DataStore(Box::new(e)))?;

    let identity_record_present = self
      .identity
      .identity_exists(target)
      .await
      .map_err(|e| Error::IdentityStore(Box::new(e)))?;

    let mut residual_references = Vec::new();
    for rule in self.catalog {
      if rule.policy == Policy::Ignore {
        continue;
      }
      let affected = self
        .data
        .count_matching(&rule.relation, &rule.column, target)
        .await
        .map_err(|e| Error::DataStore(Box::new(e)))?;

      if let Affected::Rows(rows) = affected
        && rows > 0
      {
        residual_references.push(ResidualReference {
          relation: rule.relation.clone(),
          column: rule.column.clone(),
          rows,
        });
      }
    }

    Ok(Verification {
      target_id: target,
      data_record_present,
      identity_record_present,
      residual_references,
    })
  }
}
