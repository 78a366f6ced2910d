//! Sale Model

use serde::{Deserialize, Serialize};

use super::record::{Record, Table};
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Installment,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Installment => "installment",
        }
    }
}

/// Sale status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Completed,
    Refunded,
    Cancelled,
}

/// Sale entity
///
/// `laptop_id` / `customer_id` are plain references; the referenced rows may
/// have been deleted since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub laptop_id: i64,
    pub customer_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub sale_date: i64,
    /// sale_date + laptop.warranty_months
    pub warranty_expiry: i64,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// User who recorded the sale
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Record sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCreate {
    pub laptop_id: i64,
    pub customer_id: i64,
    pub quantity: i64,
    /// Defaults to the laptop's current price
    pub unit_price: Option<f64>,
    pub payment_method: PaymentMethod,
    /// Required when `payment_method` is `installment`
    pub installment_months: Option<u32>,
    /// Defaults to now
    pub sale_date: Option<i64>,
    pub notes: Option<String>,
}

/// Update sale payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub status: Option<SaleStatus>,
    pub notes: Option<String>,
}

impl Record for Sale {
    const TABLE: Table = Table::Sales;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::Sale(self.clone())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.sales
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.sales
    }
}
