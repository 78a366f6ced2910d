//! Laptop inventory operations

use shared::models::{Laptop, LaptopCreate, LaptopUpdate};
use shared::money;

use super::EntityStore;
use crate::utils::AppResult;

impl EntityStore {
    pub fn get_laptops(&self) -> Vec<Laptop> {
        self.list()
    }

    pub fn get_laptop(&self, id: i64) -> Option<Laptop> {
        self.get(id)
    }

    pub fn add_laptop(&self, create: LaptopCreate) -> AppResult<Laptop> {
        self.insert(create)
    }

    pub fn update_laptop(&self, id: i64, update: &LaptopUpdate) -> AppResult<Option<Laptop>> {
        Ok(self.patch::<Laptop>(id, update)?.map(|(_, after)| after))
    }

    pub fn delete_laptop(&self, id: i64) -> AppResult<Option<Laptop>> {
        Ok(self.remove::<Laptop>(id)?.map(|(removed, _)| removed))
    }

    /// `quantity <= low_stock_threshold`
    pub fn get_low_stock_laptops(&self) -> Vec<Laptop> {
        self.read(|doc| {
            doc.laptops
                .iter()
                .filter(|l| l.is_low_stock())
                .cloned()
                .collect()
        })
    }

    pub fn calculate_profit_margin(&self, laptop: &Laptop) -> f64 {
        laptop.profit_margin()
    }

    /// Σ `(unit_price - laptop.cost) * quantity`, skipping sales of deleted laptops
    pub fn calculate_total_profit(&self) -> f64 {
        self.read(|doc| {
            money::sum(doc.sales.iter().filter_map(|sale| {
                doc.laptops
                    .iter()
                    .find(|l| l.id == sale.laptop_id)
                    .map(|l| money::line_profit(sale.unit_price, l.cost, sale.quantity))
            }))
        })
    }
}
