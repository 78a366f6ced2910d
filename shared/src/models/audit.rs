//! Audit log Model
//!
//! Entries are immutable once written. `old_values` / `new_values` carry full
//! record snapshots (not diffs) as a tagged union, one variant per table.

use serde::{Deserialize, Serialize};

use super::{
    Backup, Customer, Installment, Laptop, RegistrationRequest, Repair, Sale, Table, User,
};

/// Audit action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Restore,
    Generate,
    Backup,
    BackupDelete,
    ApproveRegistration,
    RejectRegistration,
    Login,
    LoginFail,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Restore => "RESTORE",
            AuditAction::Generate => "GENERATE",
            AuditAction::Backup => "BACKUP",
            AuditAction::BackupDelete => "BACKUP_DELETE",
            AuditAction::ApproveRegistration => "APPROVE_REGISTRATION",
            AuditAction::RejectRegistration => "REJECT_REGISTRATION",
            AuditAction::Login => "LOGIN",
            AuditAction::LoginFail => "LOGIN_FAIL",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured audit payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "record", rename_all = "snake_case")]
pub enum AuditSnapshot {
    Laptop(Laptop),
    Customer(Customer),
    Sale(Sale),
    Installment(Installment),
    Repair(Repair),
    RegistrationRequest(RegistrationRequest),
    User(User),
    Backup(Backup),
    /// Non-entity payloads (login attempts, report parameters, restore stats)
    Details(serde_json::Value),
}

impl AuditSnapshot {
    /// Table the payload belongs to (`None` for free-form details)
    pub fn table(&self) -> Option<Table> {
        match self {
            AuditSnapshot::Laptop(_) => Some(Table::Laptops),
            AuditSnapshot::Customer(_) => Some(Table::Customers),
            AuditSnapshot::Sale(_) => Some(Table::Sales),
            AuditSnapshot::Installment(_) => Some(Table::Installments),
            AuditSnapshot::Repair(_) => Some(Table::Repairs),
            AuditSnapshot::RegistrationRequest(_) => Some(Table::RegistrationRequests),
            AuditSnapshot::User(_) => Some(Table::Users),
            AuditSnapshot::Backup(_) => Some(Table::Backups),
            AuditSnapshot::Details(_) => None,
        }
    }
}

/// Audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    /// Acting user (None for anonymous/system events)
    #[serde(default)]
    pub user_id: Option<i64>,
    pub action: AuditAction,
    pub table_name: String,
    #[serde(default)]
    pub record_id: Option<i64>,
    #[serde(default)]
    pub old_values: Option<AuditSnapshot>,
    #[serde(default)]
    pub new_values: Option<AuditSnapshot>,
    pub timestamp: i64,
}
