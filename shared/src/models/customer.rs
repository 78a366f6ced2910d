//! Customer Model

use serde::{Deserialize, Serialize};

use super::record::{Editable, Record, Table, ValidationError};
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Customer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Free text, e.g. "Dell, Lenovo"
    #[serde(default)]
    pub preferred_brands: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Create customer payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub preferred_brands: Option<String>,
    pub budget_range: Option<String>,
    pub notes: Option<String>,
}

/// Update customer payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub preferred_brands: Option<String>,
    pub budget_range: Option<String>,
    pub notes: Option<String>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Customer {
    const TABLE: Table = Table::Customers;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::Customer(self.clone())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.customers
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.customers
    }
}

impl Editable for Customer {
    type Create = CustomerCreate;
    type Patch = CustomerUpdate;

    fn from_create(id: i64, c: CustomerCreate, now: i64) -> Self {
        Self {
            id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            address: c.address,
            preferred_brands: c.preferred_brands,
            budget_range: c.budget_range,
            notes: c.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, p: &CustomerUpdate, now: i64) {
        if let Some(v) = &p.first_name {
            self.first_name = v.clone();
        }
        if let Some(v) = &p.last_name {
            self.last_name = v.clone();
        }
        if p.email.is_some() {
            self.email = p.email.clone();
        }
        if p.phone.is_some() {
            self.phone = p.phone.clone();
        }
        if p.address.is_some() {
            self.address = p.address.clone();
        }
        if p.preferred_brands.is_some() {
            self.preferred_brands = p.preferred_brands.clone();
        }
        if p.budget_range.is_some() {
            self.budget_range = p.budget_range.clone();
        }
        if p.notes.is_some() {
            self.notes = p.notes.clone();
        }
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err(ValidationError::new("first_name", "customer name must not be empty"));
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.full_name()
    }
}
