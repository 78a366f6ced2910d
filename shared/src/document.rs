//! Full-state snapshot document
//!
//! The one shape shared by the local cache, both remote endpoints and backup
//! downloads. Missing collections deserialize as empty arrays.

use serde::{Deserialize, Serialize};

use crate::models::{
    AuditLog, Backup, Customer, Installment, Laptop, Record, RegistrationRequest, Repair, Sale,
    Table, User,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub laptops: Vec<Laptop>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub registration_requests: Vec<RegistrationRequest>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub repairs: Vec<Repair>,
    #[serde(default)]
    pub audit_logs: Vec<AuditLog>,
    #[serde(default)]
    pub backups: Vec<Backup>,
}

/// Replace `target` with `incoming` unless `incoming` is empty
fn take_non_empty<T>(target: &mut Vec<T>, incoming: Vec<T>, table: Table, replaced: &mut Vec<Table>) {
    if !incoming.is_empty() {
        *target = incoming;
        replaced.push(table);
    }
}

impl StoreDocument {
    /// Next id for a collection: `max(existing) + 1`, starting at 1
    pub fn next_id<R: Record>(&self) -> i64 {
        R::collection(self)
            .iter()
            .map(Record::id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Next audit entry id
    pub fn next_audit_id(&self) -> i64 {
        self.audit_logs.iter().map(|e| e.id).max().unwrap_or(0) + 1
    }

    /// Number of domain records (audit entries and backup metadata excluded)
    pub fn records_count(&self) -> usize {
        self.laptops.len()
            + self.customers.len()
            + self.users.len()
            + self.registration_requests.len()
            + self.sales.len()
            + self.installments.len()
            + self.repairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records_count() == 0 && self.audit_logs.is_empty() && self.backups.is_empty()
    }

    /// Overwrite each collection only where `incoming` has rows.
    ///
    /// Guards against an empty/uninitialized mirror wiping good data.
    /// Returns the tables that were replaced.
    pub fn merge_non_empty(&mut self, incoming: StoreDocument) -> Vec<Table> {
        let mut replaced = Vec::new();
        take_non_empty(&mut self.laptops, incoming.laptops, Table::Laptops, &mut replaced);
        take_non_empty(&mut self.customers, incoming.customers, Table::Customers, &mut replaced);
        take_non_empty(&mut self.users, incoming.users, Table::Users, &mut replaced);
        take_non_empty(
            &mut self.registration_requests,
            incoming.registration_requests,
            Table::RegistrationRequests,
            &mut replaced,
        );
        take_non_empty(&mut self.sales, incoming.sales, Table::Sales, &mut replaced);
        take_non_empty(
            &mut self.installments,
            incoming.installments,
            Table::Installments,
            &mut replaced,
        );
        take_non_empty(&mut self.repairs, incoming.repairs, Table::Repairs, &mut replaced);
        take_non_empty(&mut self.audit_logs, incoming.audit_logs, Table::AuditLogs, &mut replaced);
        take_non_empty(&mut self.backups, incoming.backups, Table::Backups, &mut replaced);
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Editable, LaptopCreate};

    fn laptop(id: i64, brand: &str) -> Laptop {
        Laptop::from_create(
            id,
            LaptopCreate {
                brand: brand.to_string(),
                model: "M".to_string(),
                price: 1000.0,
                cost: 600.0,
                quantity: 3,
                ..Default::default()
            },
            0,
        )
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let doc: StoreDocument = serde_json::from_str(r#"{"laptops": []}"#).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_wire_keys_are_camel_case() {
        let value = serde_json::to_value(StoreDocument::default()).unwrap();
        assert!(value.get("registrationRequests").is_some());
        assert!(value.get("auditLogs").is_some());
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let mut doc = StoreDocument::default();
        assert_eq!(doc.next_id::<Laptop>(), 1);
        doc.laptops = vec![laptop(1, "A"), laptop(5, "B")];
        assert_eq!(doc.next_id::<Laptop>(), 6);
    }

    #[test]
    fn test_merge_keeps_local_when_incoming_empty() {
        let mut doc = StoreDocument {
            laptops: vec![laptop(1, "Local")],
            ..Default::default()
        };
        let replaced = doc.merge_non_empty(StoreDocument::default());
        assert!(replaced.is_empty());
        assert_eq!(doc.laptops[0].brand, "Local");
    }

    #[test]
    fn test_merge_replaces_when_incoming_non_empty() {
        let mut doc = StoreDocument {
            laptops: vec![laptop(1, "Local"), laptop(2, "Local")],
            ..Default::default()
        };
        let incoming = StoreDocument {
            laptops: vec![laptop(9, "Mirror")],
            ..Default::default()
        };
        let replaced = doc.merge_non_empty(incoming);
        assert_eq!(replaced, vec![Table::Laptops]);
        assert_eq!(doc.laptops.len(), 1);
        assert_eq!(doc.laptops[0].brand, "Mirror");
    }
}
