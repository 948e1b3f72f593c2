use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comercio_core::{CustomerId, DomainError, DomainResult};

use crate::contact::ContactInfo;

/// A customer. Only the name is mandatory; everything else is best-effort
/// contact data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub tax_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating or replacing a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub contact: ContactInfo,
    pub tax_id: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(())
    }

    pub fn into_customer(self, id: CustomerId, created_at: DateTime<Utc>) -> DomainResult<Customer> {
        self.validate()?;
        Ok(Customer {
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
        let customer = NewCustomer {
            name: " ".to_string(),
            ..Default::default()
        };
        assert!(customer.validate().is_err());
    }

    #[test]
    fn minimal_customer_is_valid() {
        let customer = NewCustomer {
            name: "Ana".to_string(),
            ..Default::default()
        };
        let customer = customer.into_customer(CustomerId::new(), Utc::now()).unwrap();
        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.contact, ContactInfo::default());
    }
}
