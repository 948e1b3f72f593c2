use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comercio_core::{DomainError, DomainResult, SupplierId};

use crate::contact::ContactInfo;

/// A supplier products can be sourced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact: ContactInfo,
    pub tax_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating or replacing a supplier.
#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub contact: ContactInfo,
    pub tax_id: Option<String>,
}

impl NewSupplier {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(())
    }

    pub fn into_supplier(self, id: SupplierId, created_at: DateTime<Utc>) -> DomainResult<Supplier> {
        self.validate()?;
        Ok(Supplier {
            id,
            name: self.name,
            contact: self.contact,
            tax_id: self.tax_id,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let supplier = NewSupplier::default();
        assert!(supplier.validate().is_err());
    }
}
