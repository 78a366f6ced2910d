//! Repair tickets

use shared::models::{Repair, RepairCreate, RepairStatus, RepairUpdate};

use super::EntityStore;
use crate::utils::AppResult;

impl EntityStore {
    pub fn get_repairs(&self) -> Vec<Repair> {
        self.list()
    }

    pub fn get_repair(&self, id: i64) -> Option<Repair> {
        self.get(id)
    }

    pub fn get_repairs_by_status(&self, status: RepairStatus) -> Vec<Repair> {
        self.read(|doc| {
            doc.repairs
                .iter()
                .filter(|r| r.status == status)
                .cloned()
                .collect()
        })
    }

    pub fn add_repair(&self, create: RepairCreate) -> AppResult<Repair> {
        self.insert(create)
    }

    /// Moving to `completed` stamps `completed_at`; any other status clears it
    pub fn update_repair(&self, id: i64, update: &RepairUpdate) -> AppResult<Option<Repair>> {
        Ok(self.patch::<Repair>(id, update)?.map(|(_, after)| after))
    }

    pub fn delete_repair(&self, id: i64) -> AppResult<Option<Repair>> {
        Ok(self.remove::<Repair>(id)?.map(|(removed, _)| removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_at_toggles_with_status() {
        let store = EntityStore::in_memory();
        let repair = store
            .add_repair(RepairCreate {
                laptop_id: 1,
                customer_id: 1,
                issue_description: "Broken hinge".to_string(),
                estimated_cost: 80.0,
                ..Default::default()
            })
            .unwrap();
        assert!(repair.completed_at.is_none());

        let done = store
            .update_repair(
                repair.id,
                &RepairUpdate {
                    status: Some(RepairStatus::Completed),
                    final_cost: Some(95.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(done.completed_at.is_some());
        assert_eq!(store.get_repairs_by_status(RepairStatus::Completed).len(), 1);

        let reopened = store
            .update_repair(
                repair.id,
                &RepairUpdate {
                    status: Some(RepairStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(reopened.completed_at.is_none());
    }
}
