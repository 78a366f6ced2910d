//! Installment Model

use serde::{Deserialize, Serialize};

use super::record::{Record, Table};
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Installment plan status (derived from paid_months vs months)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl InstallmentStatus {
    /// completed when fully paid, active once anything is paid, pending otherwise
    pub fn derive(paid_months: u32, months: u32) -> Self {
        if paid_months >= months {
            InstallmentStatus::Completed
        } else if paid_months > 0 {
            InstallmentStatus::Active
        } else {
            InstallmentStatus::Pending
        }
    }
}

/// Installment plan attached to an installment sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: i64,
    pub sale_id: i64,
    pub customer_id: i64,
    pub total_amount: f64,
    pub months: u32,
    /// total_amount / months
    pub monthly_amount: f64,
    #[serde(default)]
    pub paid_months: u32,
    /// Only recomputed by progress updates, never kept live
    #[serde(default)]
    pub status: InstallmentStatus,
    #[serde(default)]
    pub next_due_date: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Installment {
    pub fn remaining_amount(&self) -> f64 {
        let remaining_months = self.months.saturating_sub(self.paid_months);
        crate::money::line_total(self.monthly_amount, i64::from(remaining_months))
    }
}

impl Record for Installment {
    const TABLE: Table = Table::Installments;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::Installment(self.clone())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.installments
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.installments
    }
}
