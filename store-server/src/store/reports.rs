//! 报表（只读计算，`generate_report` 额外写一条 `GENERATE` 审计）

use serde::{Deserialize, Serialize};
use shared::models::{AuditAction, PaymentMethod, SaleStatus, Table};
use shared::{StoreDocument, money};

use super::EntityStore;
use crate::audit::AuditDraft;
use crate::utils::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Inventory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodTotal {
    pub payment_method: PaymentMethod,
    pub count: usize,
    pub total: f64,
}

/// 时间段内已完成销售的汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub sale_count: usize,
    pub units_sold: i64,
    pub revenue: f64,
    /// 已删除笔记本的销售不计利润
    pub profit: f64,
    pub by_payment_method: Vec<PaymentMethodTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub laptop_count: usize,
    pub total_units: i64,
    pub stock_cost: f64,
    pub stock_retail: f64,
    pub low_stock_count: usize,
}

fn sales_report(doc: &StoreDocument, from: Option<i64>, to: Option<i64>) -> SalesReport {
    let sales: Vec<_> = doc
        .sales
        .iter()
        .filter(|s| s.status == SaleStatus::Completed)
        .filter(|s| from.is_none_or(|f| s.sale_date >= f))
        .filter(|s| to.is_none_or(|t| s.sale_date <= t))
        .collect();

    let profit = money::sum(sales.iter().filter_map(|sale| {
        doc.laptops
            .iter()
            .find(|l| l.id == sale.laptop_id)
            .map(|l| money::line_profit(sale.unit_price, l.cost, sale.quantity))
    }));

    let by_payment_method = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Installment]
        .into_iter()
        .map(|method| {
            let matching: Vec<f64> = sales
                .iter()
                .filter(|s| s.payment_method == method)
                .map(|s| s.total_amount)
                .collect();
            PaymentMethodTotal {
                payment_method: method,
                count: matching.len(),
                total: money::sum(matching),
            }
        })
        .collect();

    SalesReport {
        from,
        to,
        sale_count: sales.len(),
        units_sold: sales.iter().map(|s| s.quantity).sum(),
        revenue: money::sum(sales.iter().map(|s| s.total_amount)),
        profit,
        by_payment_method,
    }
}

fn inventory_summary(doc: &StoreDocument) -> InventorySummary {
    InventorySummary {
        laptop_count: doc.laptops.len(),
        total_units: doc.laptops.iter().map(|l| l.quantity).sum(),
        stock_cost: money::sum(
            doc.laptops
                .iter()
                .map(|l| money::line_total(l.cost, l.quantity)),
        ),
        stock_retail: money::sum(
            doc.laptops
                .iter()
                .map(|l| money::line_total(l.price, l.quantity)),
        ),
        low_stock_count: doc.laptops.iter().filter(|l| l.is_low_stock()).count(),
    }
}

impl EntityStore {
    pub fn sales_report(&self, from: Option<i64>, to: Option<i64>) -> SalesReport {
        self.read(|doc| sales_report(doc, from, to))
    }

    pub fn inventory_summary(&self) -> InventorySummary {
        self.read(inventory_summary)
    }

    /// 生成报表并记录 `GENERATE`
    pub fn generate_report(
        &self,
        kind: ReportKind,
        from: Option<i64>,
        to: Option<i64>,
    ) -> AppResult<serde_json::Value> {
        self.mutate(|m| {
            let (table, report) = match kind {
                ReportKind::Sales => (
                    Table::Sales,
                    serde_json::to_value(sales_report(m.doc, from, to))?,
                ),
                ReportKind::Inventory => (
                    Table::Laptops,
                    serde_json::to_value(inventory_summary(m.doc))?,
                ),
            };
            m.audit(AuditDraft::new(AuditAction::Generate, table).details(serde_json::json!({
                "kind": kind,
                "from": from,
                "to": to,
            })));
            tracing::info!(kind = ?kind, "Report generated");
            Ok(report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CustomerCreate, LaptopCreate, SaleCreate};

    fn store_with_sales() -> EntityStore {
        let store = EntityStore::in_memory();
        let laptop = store
            .add_laptop(LaptopCreate {
                brand: "Dell".to_string(),
                model: "XPS 13".to_string(),
                price: 1000.0,
                cost: 600.0,
                quantity: 10,
                ..Default::default()
            })
            .unwrap();
        let customer = store
            .add_customer(CustomerCreate {
                first_name: "Ines".to_string(),
                last_name: "Costa".to_string(),
                ..Default::default()
            })
            .unwrap();
        for (method, date) in [(PaymentMethod::Cash, 1_000), (PaymentMethod::Card, 5_000)] {
            store
                .record_sale(SaleCreate {
                    laptop_id: laptop.id,
                    customer_id: customer.id,
                    quantity: 1,
                    unit_price: None,
                    payment_method: method,
                    installment_months: None,
                    sale_date: Some(date),
                    notes: None,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_sales_report_window() {
        let store = store_with_sales();
        let all = store.sales_report(None, None);
        assert_eq!(all.sale_count, 2);
        assert_eq!(all.revenue, 2000.0);
        assert_eq!(all.profit, 800.0);

        let early = store.sales_report(None, Some(2_000));
        assert_eq!(early.sale_count, 1);
        let cash = &early.by_payment_method[0];
        assert_eq!(cash.payment_method, PaymentMethod::Cash);
        assert_eq!(cash.count, 1);
    }

    #[test]
    fn test_generate_report_is_audited() {
        let store = store_with_sales();
        let before = store.audit_log_count();
        let report = store.generate_report(ReportKind::Inventory, None, None).unwrap();
        assert_eq!(report["total_units"], 8);
        assert_eq!(store.audit_log_count(), before + 1);
    }
}
