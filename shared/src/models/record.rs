//! Table identity and the traits the store uses to treat collections generically

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Collection name as it appears in audit entries (`table_name`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Laptops,
    Customers,
    Users,
    RegistrationRequests,
    Sales,
    Installments,
    Repairs,
    AuditLogs,
    Backups,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Laptops => "laptops",
            Table::Customers => "customers",
            Table::Users => "users",
            Table::RegistrationRequests => "registration_requests",
            Table::Sales => "sales",
            Table::Installments => "installments",
            Table::Repairs => "repairs",
            Table::AuditLogs => "audit_logs",
            Table::Backups => "backups",
        }
    }

    /// Singular noun for messages ("laptop", "registration request")
    pub fn singular(&self) -> &'static str {
        match self {
            Table::Laptops => "laptop",
            Table::Customers => "customer",
            Table::Users => "user",
            Table::RegistrationRequests => "registration request",
            Table::Sales => "sale",
            Table::Installments => "installment",
            Table::Repairs => "repair",
            Table::AuditLogs => "audit entry",
            Table::Backups => "backup",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Maximum allowed money amount (price, cost, repair cost)
pub const MAX_AMOUNT: f64 = 1_000_000.0;
/// Maximum allowed stock count / threshold
pub const MAX_COUNT: i64 = 1_000_000;
/// Maximum units in a single sale
pub const MAX_SALE_QUANTITY: i64 = 9999;

/// Reject NaN/Infinity, negative and oversized amounts
pub fn require_amount(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError::new(
            field,
            format!("exceeds maximum allowed ({MAX_AMOUNT}), got {value}"),
        ));
    }
    Ok(())
}

/// Reject negative and oversized counts
pub fn require_count(value: i64, field: &'static str) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    if value > MAX_COUNT {
        return Err(ValidationError::new(
            field,
            format!("exceeds maximum allowed ({MAX_COUNT}), got {value}"),
        ));
    }
    Ok(())
}

/// A row in one of the document's collections
pub trait Record: Clone + std::fmt::Debug + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> i64;

    /// Audit payload for this record (secrets stripped)
    fn snapshot(&self) -> AuditSnapshot;

    fn collection(doc: &StoreDocument) -> &Vec<Self>;

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self>;
}

/// A record with plain create/patch semantics and no cross-table effects.
///
/// These are the tables the command history can wrap.
pub trait Editable: Record {
    type Create: Clone + Send + Sync;
    type Patch: Clone + Send + Sync;

    fn from_create(id: i64, create: Self::Create, now: i64) -> Self;

    fn apply_patch(&mut self, patch: &Self::Patch, now: i64);

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Non-blocking business warning (logged, the write still succeeds)
    fn advisory(&self) -> Option<String> {
        None
    }

    /// Short human label used in command descriptions
    fn label(&self) -> String;
}
