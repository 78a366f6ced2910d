//! Laptop Model

use serde::{Deserialize, Serialize};

use super::record::{Editable, Record, Table, ValidationError, require_amount, require_count};
use super::AuditSnapshot;
use crate::document::StoreDocument;
use crate::money;

const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
const DEFAULT_WARRANTY_MONTHS: u32 = 12;

/// Laptop entity (inventory item)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laptop {
    pub id: i64,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub processor: String,
    #[serde(default)]
    pub ram_gb: u32,
    #[serde(default)]
    pub storage_gb: u32,
    #[serde(default)]
    pub gpu: Option<String>,
    /// Screen diagonal in inches
    #[serde(default)]
    pub screen_size: Option<f64>,
    pub price: f64,
    pub cost: f64,
    pub quantity: i64,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default = "default_warranty_months")]
    pub warranty_months: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_warranty_months() -> u32 {
    DEFAULT_WARRANTY_MONTHS
}

/// Create laptop payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaptopCreate {
    pub brand: String,
    pub model: String,
    pub processor: String,
    pub ram_gb: u32,
    pub storage_gb: u32,
    pub gpu: Option<String>,
    pub screen_size: Option<f64>,
    pub price: f64,
    pub cost: f64,
    pub quantity: i64,
    pub low_stock_threshold: Option<i64>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub warranty_months: Option<u32>,
    pub description: Option<String>,
}

/// Update laptop payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaptopUpdate {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub processor: Option<String>,
    pub ram_gb: Option<u32>,
    pub storage_gb: Option<u32>,
    pub gpu: Option<String>,
    pub screen_size: Option<f64>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub quantity: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub warranty_months: Option<u32>,
    pub description: Option<String>,
}

impl Laptop {
    /// quantity <= low_stock_threshold
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    /// `(price - cost) / price * 100`
    pub fn profit_margin(&self) -> f64 {
        money::profit_margin(self.price, self.cost)
    }
}

impl Record for Laptop {
    const TABLE: Table = Table::Laptops;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::Laptop(self.clone())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.laptops
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.laptops
    }
}

impl Editable for Laptop {
    type Create = LaptopCreate;
    type Patch = LaptopUpdate;

    fn from_create(id: i64, c: LaptopCreate, now: i64) -> Self {
        Self {
            id,
            brand: c.brand,
            model: c.model,
            processor: c.processor,
            ram_gb: c.ram_gb,
            storage_gb: c.storage_gb,
            gpu: c.gpu,
            screen_size: c.screen_size,
            price: c.price,
            cost: c.cost,
            quantity: c.quantity,
            low_stock_threshold: c.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            category: c.category,
            supplier: c.supplier,
            warranty_months: c.warranty_months.unwrap_or(DEFAULT_WARRANTY_MONTHS),
            description: c.description,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, p: &LaptopUpdate, now: i64) {
        if let Some(v) = &p.brand {
            self.brand = v.clone();
        }
        if let Some(v) = &p.model {
            self.model = v.clone();
        }
        if let Some(v) = &p.processor {
            self.processor = v.clone();
        }
        if let Some(v) = p.ram_gb {
            self.ram_gb = v;
        }
        if let Some(v) = p.storage_gb {
            self.storage_gb = v;
        }
        if p.gpu.is_some() {
            self.gpu = p.gpu.clone();
        }
        if p.screen_size.is_some() {
            self.screen_size = p.screen_size;
        }
        if let Some(v) = p.price {
            self.price = v;
        }
        if let Some(v) = p.cost {
            self.cost = v;
        }
        if let Some(v) = p.quantity {
            self.quantity = v;
        }
        if let Some(v) = p.low_stock_threshold {
            self.low_stock_threshold = v;
        }
        if p.category.is_some() {
            self.category = p.category.clone();
        }
        if p.supplier.is_some() {
            self.supplier = p.supplier.clone();
        }
        if let Some(v) = p.warranty_months {
            self.warranty_months = v;
        }
        if p.description.is_some() {
            self.description = p.description.clone();
        }
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.brand.trim().is_empty() {
            return Err(ValidationError::new("brand", "must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("model", "must not be empty"));
        }
        require_amount(self.price, "price")?;
        require_amount(self.cost, "cost")?;
        require_count(self.quantity, "quantity")?;
        require_count(self.low_stock_threshold, "low_stock_threshold")?;
        Ok(())
    }

    fn advisory(&self) -> Option<String> {
        (self.price <= self.cost).then(|| {
            format!(
                "price {} does not exceed cost {} for {} {}",
                self.price, self.cost, self.brand, self.model
            )
        })
    }

    fn label(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}
