//! Registration request Model (user onboarding)

use serde::{Deserialize, Serialize};

use super::record::{Record, Table};
use super::user::Role;
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Registration request status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Self-service registration awaiting review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub requested_role: Role,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub email_confirmed: bool,
    #[serde(default)]
    pub confirmation_token: String,
    #[serde(default)]
    pub status: RegistrationStatus,
    #[serde(default)]
    pub reviewed_by: Option<i64>,
    #[serde(default)]
    pub reviewed_at: Option<i64>,
    #[serde(default)]
    pub review_note: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Submit registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCreate {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub requested_role: Role,
    pub password: String,
}

impl RegistrationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RegistrationStatus::Pending
    }

    /// Copy without credentials or confirmation token, for audit payloads
    pub fn redacted(&self) -> Self {
        Self {
            password_hash: String::new(),
            confirmation_token: String::new(),
            ..self.clone()
        }
    }
}

impl Record for RegistrationRequest {
    const TABLE: Table = Table::RegistrationRequests;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::RegistrationRequest(self.redacted())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.registration_requests
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.registration_requests
    }
}
