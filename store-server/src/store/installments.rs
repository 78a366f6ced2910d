//! Installment plan progress

use shared::models::{AuditAction, Installment, InstallmentStatus, Record};
use shared::util;

use super::{EntityStore, find_mut};
use crate::audit::AuditDraft;
use crate::utils::{AppError, AppResult};

impl EntityStore {
    pub fn get_installments(&self) -> Vec<Installment> {
        self.list()
    }

    pub fn get_installment(&self, id: i64) -> Option<Installment> {
        self.get(id)
    }

    pub fn get_installment_by_sale(&self, sale_id: i64) -> Option<Installment> {
        self.read(|doc| {
            doc.installments
                .iter()
                .find(|i| i.sale_id == sale_id)
                .cloned()
        })
    }

    /// Set `paid_months` and recompute the status
    pub fn update_installment_progress(
        &self,
        id: i64,
        paid_months: u32,
    ) -> AppResult<Option<Installment>> {
        self.progress(id, |plan| {
            if paid_months > plan.months {
                return Err(AppError::validation(format!(
                    "paid_months: {} exceeds plan length {}",
                    paid_months, plan.months
                )));
            }
            plan.paid_months = paid_months;
            Ok(())
        })
    }

    /// Pay one month and move the due date one month forward
    pub fn record_installment_payment(&self, id: i64) -> AppResult<Option<Installment>> {
        self.progress(id, |plan| {
            if plan.paid_months >= plan.months {
                return Err(AppError::validation("installment plan is already fully paid"));
            }
            plan.paid_months += 1;
            plan.next_due_date = plan.next_due_date.map(|due| util::add_months(due, 1));
            Ok(())
        })
    }

    fn progress(
        &self,
        id: i64,
        apply: impl FnOnce(&mut Installment) -> AppResult<()>,
    ) -> AppResult<Option<Installment>> {
        self.mutate(|m| {
            let now = m.now;
            let Some(plan) = find_mut::<Installment>(m.doc, id) else {
                return Ok(None);
            };
            let before = plan.clone();
            let mut after = before.clone();
            apply(&mut after)?;
            after.status = InstallmentStatus::derive(after.paid_months, after.months);
            if after.status == InstallmentStatus::Completed {
                after.next_due_date = None;
            }
            after.updated_at = now;
            *plan = after.clone();

            m.audit(
                AuditDraft::new(AuditAction::Update, Installment::TABLE)
                    .record(id)
                    .old(before.snapshot())
                    .new_values(after.snapshot()),
            );
            tracing::info!(
                installment_id = id,
                paid = after.paid_months,
                months = after.months,
                status = ?after.status,
                "Installment progress updated"
            );
            Ok(Some(after))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CustomerCreate, LaptopCreate, PaymentMethod, SaleCreate};

    fn installment_store(months: u32) -> (EntityStore, Installment) {
        let store = EntityStore::in_memory();
        let laptop = store
            .add_laptop(LaptopCreate {
                brand: "HP".to_string(),
                model: "Spectre".to_string(),
                price: 1200.0,
                cost: 900.0,
                quantity: 3,
                ..Default::default()
            })
            .unwrap();
        let customer = store
            .add_customer(CustomerCreate {
                first_name: "Ola".to_string(),
                last_name: "Nord".to_string(),
                ..Default::default()
            })
            .unwrap();
        let sale = store
            .record_sale(SaleCreate {
                laptop_id: laptop.id,
                customer_id: customer.id,
                quantity: 1,
                unit_price: None,
                payment_method: PaymentMethod::Installment,
                installment_months: Some(months),
                sale_date: None,
                notes: None,
            })
            .unwrap();
        let plan = store.get_installment_by_sale(sale.id).unwrap();
        (store, plan)
    }

    #[test]
    fn test_status_derivation() {
        let (store, plan) = installment_store(3);
        let p = store.update_installment_progress(plan.id, 1).unwrap().unwrap();
        assert_eq!(p.status, InstallmentStatus::Active);
        let p = store.update_installment_progress(plan.id, 3).unwrap().unwrap();
        assert_eq!(p.status, InstallmentStatus::Completed);
        assert!(p.next_due_date.is_none());
        let p = store.update_installment_progress(plan.id, 0).unwrap().unwrap();
        assert_eq!(p.status, InstallmentStatus::Pending);
    }

    #[test]
    fn test_payment_advances_due_date() {
        let (store, plan) = installment_store(2);
        let due = plan.next_due_date.unwrap();
        let p = store.record_installment_payment(plan.id).unwrap().unwrap();
        assert_eq!(p.paid_months, 1);
        assert_eq!(p.next_due_date, Some(util::add_months(due, 1)));

        store.record_installment_payment(plan.id).unwrap();
        let err = store.record_installment_payment(plan.id).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_progress_beyond_plan_is_rejected() {
        let (store, plan) = installment_store(2);
        assert!(store.update_installment_progress(plan.id, 5).is_err());
        assert_eq!(store.get_installment(plan.id).unwrap().paid_months, 0);
    }
}
