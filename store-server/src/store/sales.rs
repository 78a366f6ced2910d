//! 销售记录
//!
//! 记录销售是跨实体操作：扣减库存、计算保修期、分期付款时创建分期计划。
//! 全部在同一把写锁内完成，任一校验失败则不做任何修改。

use shared::models::{
    AuditAction, Customer, Installment, InstallmentStatus, Laptop, MAX_SALE_QUANTITY,
    PaymentMethod, Record, Sale, SaleCreate, SaleStatus, SaleUpdate, require_amount,
};
use shared::{money, util};

use super::{EntityStore, find_mut, position};
use crate::audit::AuditDraft;
use crate::utils::{AppError, AppResult};

impl EntityStore {
    pub fn get_sales(&self) -> Vec<Sale> {
        self.list()
    }

    pub fn get_sale(&self, id: i64) -> Option<Sale> {
        self.get(id)
    }

    pub fn get_sales_by_customer(&self, customer_id: i64) -> Vec<Sale> {
        self.read(|doc| {
            doc.sales
                .iter()
                .filter(|s| s.customer_id == customer_id)
                .cloned()
                .collect()
        })
    }

    /// 记录销售
    ///
    /// - `quantity` 必须 ≥ 1 且不超过当前库存
    /// - `warranty_expiry = sale_date + laptop.warranty_months`
    /// - 分期付款时同时创建分期计划（首期到期日为一个月后）
    ///
    /// 审计：一条 `sales` CREATE，分期时再加一条 `installments` CREATE。
    pub fn record_sale(&self, input: SaleCreate) -> AppResult<Sale> {
        self.mutate(|m| {
            if input.quantity < 1 {
                return Err(AppError::validation(format!(
                    "quantity: must be at least 1, got {}",
                    input.quantity
                )));
            }
            if input.quantity > MAX_SALE_QUANTITY {
                return Err(AppError::validation(format!(
                    "quantity: exceeds maximum allowed ({MAX_SALE_QUANTITY}), got {}",
                    input.quantity
                )));
            }
            if let Some(price) = input.unit_price {
                require_amount(price, "unit_price")?;
            }
            let months = match input.payment_method {
                PaymentMethod::Installment => match input.installment_months {
                    Some(months) if months > 0 => Some(months),
                    _ => {
                        return Err(AppError::validation(
                            "installment_months: required and must be positive for installment sales",
                        ));
                    }
                },
                _ => None,
            };
            if position::<Customer>(m.doc, input.customer_id).is_none() {
                return Err(AppError::record_not_found(
                    Customer::TABLE,
                    input.customer_id,
                ));
            }

            let sale_id = m.doc.next_id::<Sale>();
            let installment_id = m.doc.next_id::<Installment>();
            let now = m.now;

            let laptop = find_mut::<Laptop>(m.doc, input.laptop_id)
                .ok_or_else(|| AppError::record_not_found(Laptop::TABLE, input.laptop_id))?;
            if input.quantity > laptop.quantity {
                return Err(AppError::validation(format!(
                    "quantity: only {} of {} {} in stock, requested {}",
                    laptop.quantity, laptop.brand, laptop.model, input.quantity
                )));
            }

            let unit_price = input.unit_price.unwrap_or(laptop.price);
            let sale_date = input.sale_date.unwrap_or(now);
            let total_amount = money::line_total(unit_price, input.quantity);
            let warranty_expiry = util::add_months(sale_date, laptop.warranty_months);

            laptop.quantity -= input.quantity;
            laptop.updated_at = now;
            let remaining = laptop.quantity;
            let low_stock = laptop.is_low_stock();

            let sale = Sale {
                id: sale_id,
                laptop_id: input.laptop_id,
                customer_id: input.customer_id,
                quantity: input.quantity,
                unit_price,
                total_amount,
                payment_method: input.payment_method,
                sale_date,
                warranty_expiry,
                status: SaleStatus::Completed,
                notes: input.notes,
                created_by: m.actor,
                created_at: now,
                updated_at: now,
            };
            m.doc.sales.push(sale.clone());
            m.audit(
                AuditDraft::new(AuditAction::Create, Sale::TABLE)
                    .record(sale.id)
                    .new_values(sale.snapshot()),
            );

            if let Some(months) = months {
                let plan = Installment {
                    id: installment_id,
                    sale_id: sale.id,
                    customer_id: sale.customer_id,
                    total_amount,
                    months,
                    monthly_amount: money::monthly_amount(total_amount, months),
                    paid_months: 0,
                    status: InstallmentStatus::Pending,
                    next_due_date: Some(util::add_months(sale_date, 1)),
                    created_at: now,
                    updated_at: now,
                };
                m.doc.installments.push(plan.clone());
                m.audit(
                    AuditDraft::new(AuditAction::Create, Installment::TABLE)
                        .record(plan.id)
                        .new_values(plan.snapshot()),
                );
            }

            tracing::info!(
                sale_id = sale.id,
                laptop_id = sale.laptop_id,
                quantity = sale.quantity,
                total = sale.total_amount,
                payment = sale.payment_method.as_str(),
                "Sale recorded"
            );
            if low_stock {
                tracing::warn!(laptop_id = sale.laptop_id, remaining, "Laptop stock is low");
            }
            Ok(sale)
        })
    }

    /// 修改状态/备注（不影响库存）
    pub fn update_sale(&self, id: i64, update: &SaleUpdate) -> AppResult<Option<Sale>> {
        self.mutate(|m| {
            let now = m.now;
            let Some(sale) = find_mut::<Sale>(m.doc, id) else {
                return Ok(None);
            };
            let before = sale.clone();
            if let Some(status) = update.status {
                sale.status = status;
            }
            if update.notes.is_some() {
                sale.notes = update.notes.clone();
            }
            sale.updated_at = now;
            let after = sale.clone();
            m.audit(
                AuditDraft::new(AuditAction::Update, Sale::TABLE)
                    .record(id)
                    .old(before.snapshot())
                    .new_values(after.snapshot()),
            );
            Ok(Some(after))
        })
    }

    /// 删除销售记录（不回补库存，不删除分期计划）
    pub fn delete_sale(&self, id: i64) -> AppResult<Option<Sale>> {
        Ok(self.remove::<Sale>(id)?.map(|(removed, _)| removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditQuery;
    use shared::models::{CustomerCreate, LaptopCreate};

    fn setup(quantity: i64) -> (EntityStore, Laptop, Customer) {
        let store = EntityStore::in_memory();
        let laptop = store
            .add_laptop(LaptopCreate {
                brand: "Asus".to_string(),
                model: "Zenbook".to_string(),
                price: 750.0,
                cost: 500.0,
                quantity,
                warranty_months: Some(24),
                ..Default::default()
            })
            .unwrap();
        let customer = store
            .add_customer(CustomerCreate {
                first_name: "Kim".to_string(),
                last_name: "Park".to_string(),
                ..Default::default()
            })
            .unwrap();
        (store, laptop, customer)
    }

    fn sale(laptop: &Laptop, customer: &Customer, quantity: i64) -> SaleCreate {
        SaleCreate {
            laptop_id: laptop.id,
            customer_id: customer.id,
            quantity,
            unit_price: None,
            payment_method: PaymentMethod::Card,
            installment_months: None,
            sale_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_sale_decrements_stock_and_appends_one_sales_entry() {
        let (store, laptop, customer) = setup(10);
        let before = store.audit_log_count();

        let recorded = store.record_sale(sale(&laptop, &customer, 3)).unwrap();

        assert_eq!(store.get_laptop(laptop.id).unwrap().quantity, 7);
        assert_eq!(recorded.total_amount, 2250.0);
        assert_eq!(store.audit_log_count(), before + 1);
        let latest = &store.get_audit_logs(&AuditQuery::new()).items[0];
        assert_eq!(latest.table_name, "sales");
        assert_eq!(latest.action, AuditAction::Create);
    }

    #[test]
    fn test_warranty_expiry_uses_calendar_months() {
        let (store, laptop, customer) = setup(1);
        let mut input = sale(&laptop, &customer, 1);
        // 2024-01-31T00:00:00Z
        input.sale_date = Some(1_706_659_200_000);
        let recorded = store.record_sale(input).unwrap();
        assert_eq!(recorded.warranty_expiry, util::add_months(1_706_659_200_000, 24));
    }

    #[test]
    fn test_oversell_is_rejected_without_side_effects() {
        let (store, laptop, customer) = setup(2);
        let before = store.audit_log_count();
        let err = store.record_sale(sale(&laptop, &customer, 3)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.get_laptop(laptop.id).unwrap().quantity, 2);
        assert!(store.get_sales().is_empty());
        assert_eq!(store.audit_log_count(), before);
    }

    #[test]
    fn test_oversized_sale_quantity_and_price_are_rejected() {
        let (store, laptop, customer) = setup(20_000);
        let err = store
            .record_sale(sale(&laptop, &customer, MAX_SALE_QUANTITY + 1))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut input = sale(&laptop, &customer, 2);
        input.unit_price = Some(7e28);
        let err = store.record_sale(input).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.get_sales().is_empty());
        assert_eq!(store.get_laptop(laptop.id).unwrap().quantity, 20_000);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let (store, laptop, customer) = setup(2);
        let err = store.record_sale(sale(&laptop, &customer, 0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_missing_laptop_is_not_found() {
        let (store, laptop, customer) = setup(2);
        store.delete_laptop(laptop.id).unwrap();
        let err = store.record_sale(sale(&laptop, &customer, 1)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_installment_sale_creates_plan() {
        let (store, laptop, customer) = setup(5);
        let mut input = sale(&laptop, &customer, 2);
        input.payment_method = PaymentMethod::Installment;
        input.installment_months = Some(12);
        input.unit_price = Some(750.0);

        let recorded = store.record_sale(input).unwrap();
        let plan = store.get_installment_by_sale(recorded.id).unwrap();
        assert_eq!(plan.total_amount, 1500.0);
        assert_eq!(plan.monthly_amount, 125.0);
        assert_eq!(plan.status, InstallmentStatus::Pending);
        assert_eq!(
            plan.next_due_date,
            Some(util::add_months(recorded.sale_date, 1))
        );

        let logs = store.get_audit_logs(&AuditQuery::new());
        assert_eq!(logs.items[0].table_name, "installments");
        assert_eq!(logs.items[1].table_name, "sales");
    }

    #[test]
    fn test_installment_sale_requires_months() {
        let (store, laptop, customer) = setup(5);
        let mut input = sale(&laptop, &customer, 1);
        input.payment_method = PaymentMethod::Installment;
        let err = store.record_sale(input).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.get_laptop(laptop.id).unwrap().quantity, 5);
    }

    #[test]
    fn test_delete_sale_keeps_stock() {
        let (store, laptop, customer) = setup(5);
        let recorded = store.record_sale(sale(&laptop, &customer, 2)).unwrap();
        store.delete_sale(recorded.id).unwrap();
        assert_eq!(store.get_laptop(laptop.id).unwrap().quantity, 3);
        assert!(store.get_sales_by_customer(customer.id).is_empty());
    }
}
