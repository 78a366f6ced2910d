//! Repair Model

use serde::{Deserialize, Serialize};

use super::record::{Editable, Record, Table, ValidationError, require_amount};
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Repair ticket status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Repair ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub id: i64,
    pub laptop_id: i64,
    pub customer_id: i64,
    pub issue_description: String,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub final_cost: Option<f64>,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub status: RepairStatus,
    /// Set when status becomes completed, cleared otherwise
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Create repair payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairCreate {
    pub laptop_id: i64,
    pub customer_id: i64,
    pub issue_description: String,
    pub estimated_cost: f64,
    pub technician: Option<String>,
}

/// Update repair payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairUpdate {
    pub issue_description: Option<String>,
    pub diagnosis: Option<String>,
    pub estimated_cost: Option<f64>,
    pub final_cost: Option<f64>,
    pub technician: Option<String>,
    pub status: Option<RepairStatus>,
}

impl Record for Repair {
    const TABLE: Table = Table::Repairs;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::Repair(self.clone())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.repairs
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.repairs
    }
}

impl Editable for Repair {
    type Create = RepairCreate;
    type Patch = RepairUpdate;

    fn from_create(id: i64, c: RepairCreate, now: i64) -> Self {
        Self {
            id,
            laptop_id: c.laptop_id,
            customer_id: c.customer_id,
            issue_description: c.issue_description,
            diagnosis: None,
            estimated_cost: c.estimated_cost,
            final_cost: None,
            technician: c.technician,
            status: RepairStatus::Pending,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, p: &RepairUpdate, now: i64) {
        if let Some(v) = &p.issue_description {
            self.issue_description = v.clone();
        }
        if p.diagnosis.is_some() {
            self.diagnosis = p.diagnosis.clone();
        }
        if let Some(v) = p.estimated_cost {
            self.estimated_cost = v;
        }
        if p.final_cost.is_some() {
            self.final_cost = p.final_cost;
        }
        if p.technician.is_some() {
            self.technician = p.technician.clone();
        }
        if let Some(status) = p.status {
            self.completed_at = match status {
                RepairStatus::Completed => self.completed_at.or(Some(now)),
                _ => None,
            };
            self.status = status;
        }
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_amount(self.estimated_cost, "estimated_cost")?;
        if let Some(cost) = self.final_cost {
            require_amount(cost, "final_cost")?;
        }
        Ok(())
    }

    fn label(&self) -> String {
        format!("repair #{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_patch(status: RepairStatus) -> RepairUpdate {
        RepairUpdate {
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn test_completed_at_follows_status() {
        let mut repair = Repair::from_create(
            1,
            RepairCreate {
                laptop_id: 1,
                customer_id: 1,
                issue_description: "Broken hinge".to_string(),
                estimated_cost: 80.0,
                technician: None,
            },
            100,
        );
        assert_eq!(repair.completed_at, None);

        repair.apply_patch(&status_patch(RepairStatus::Completed), 200);
        assert_eq!(repair.completed_at, Some(200));

        // Already completed: timestamp is kept
        repair.apply_patch(&status_patch(RepairStatus::Completed), 300);
        assert_eq!(repair.completed_at, Some(200));

        repair.apply_patch(&status_patch(RepairStatus::InProgress), 400);
        assert_eq!(repair.completed_at, None);
        assert_eq!(repair.status, RepairStatus::InProgress);
    }
}
