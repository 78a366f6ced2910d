//! Customer operations

use shared::models::{Customer, CustomerCreate, CustomerUpdate};

use super::EntityStore;
use crate::utils::AppResult;

impl EntityStore {
    pub fn get_customers(&self) -> Vec<Customer> {
        self.list()
    }

    pub fn get_customer(&self, id: i64) -> Option<Customer> {
        self.get(id)
    }

    pub fn add_customer(&self, create: CustomerCreate) -> AppResult<Customer> {
        self.insert(create)
    }

    pub fn update_customer(
        &self,
        id: i64,
        update: &CustomerUpdate,
    ) -> AppResult<Option<Customer>> {
        Ok(self.patch::<Customer>(id, update)?.map(|(_, after)| after))
    }

    /// Non-cascading: sales and repairs keep the dangling `customer_id`
    pub fn delete_customer(&self, id: i64) -> AppResult<Option<Customer>> {
        Ok(self.remove::<Customer>(id)?.map(|(removed, _)| removed))
    }

    /// Case-insensitive match on name, email or phone
    pub fn search_customers(&self, term: &str) -> Vec<Customer> {
        let needle = term.trim().to_lowercase();
        self.read(|doc| {
            doc.customers
                .iter()
                .filter(|c| {
                    needle.is_empty()
                        || c.full_name().to_lowercase().contains(&needle)
                        || c.email
                            .as_deref()
                            .is_some_and(|e| e.to_lowercase().contains(&needle))
                        || c.phone.as_deref().is_some_and(|p| p.contains(&needle))
                })
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_customers() {
        let store = EntityStore::in_memory();
        store
            .add_customer(CustomerCreate {
                first_name: "Maria".to_string(),
                last_name: "Garcia".to_string(),
                email: Some("maria@example.com".to_string()),
                ..Default::default()
            })
            .unwrap();
        store
            .add_customer(CustomerCreate {
                first_name: "Tom".to_string(),
                last_name: "Baker".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(store.search_customers("garc").len(), 1);
        assert_eq!(store.search_customers("EXAMPLE.com").len(), 1);
        assert_eq!(store.search_customers("").len(), 2);
    }

    #[test]
    fn test_update_missing_customer_is_none() {
        let store = EntityStore::in_memory();
        let updated = store
            .update_customer(9, &CustomerUpdate::default())
            .unwrap();
        assert!(updated.is_none());
    }
}
