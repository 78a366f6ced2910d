//! User Model

use serde::{Deserialize, Serialize};

use super::record::{Record, Table};
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Worker => "worker",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    /// Argon2 PHC string; empty in audit snapshots
    #[serde(default)]
    pub password_hash: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub password: String,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl User {
    /// Copy without credentials, for audit payloads
    pub fn redacted(&self) -> Self {
        Self {
            password_hash: String::new(),
            ..self.clone()
        }
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::User(self.redacted())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.users
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.users
    }
}
