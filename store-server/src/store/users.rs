//! 用户管理与登录
//!
//! 密码哈希（argon2）在写锁之外计算，锁内只做校验与写入。
//! 所有对外返回的 `User` 都已清除 `password_hash`。

use shared::models::{AuditAction, Record, Role, User, UserCreate, UserUpdate};
use shared::StoreDocument;

use super::{EntityStore, find_mut};
use crate::audit::AuditDraft;
use crate::auth::{hash_password, verify_password};
use crate::utils::{AppError, AppResult};

/// 用户名/邮箱是否已被已有用户或待审批申请占用
pub(crate) fn identity_conflict(
    doc: &StoreDocument,
    username: &str,
    email: &str,
    exclude_user: Option<i64>,
) -> Option<String> {
    let username = username.trim();
    let email = email.trim();
    let user_clash = doc.users.iter().filter(|u| Some(u.id) != exclude_user).find_map(|u| {
        if u.username.eq_ignore_ascii_case(username) {
            Some(format!("username '{username}' is already taken"))
        } else if !email.is_empty() && u.email.eq_ignore_ascii_case(email) {
            Some(format!("email '{email}' is already registered"))
        } else {
            None
        }
    });
    user_clash.or_else(|| {
        doc.registration_requests
            .iter()
            .filter(|r| r.is_pending())
            .find_map(|r| {
                if r.username.eq_ignore_ascii_case(username) {
                    Some(format!("username '{username}' has a pending registration"))
                } else if !email.is_empty() && r.email.eq_ignore_ascii_case(email) {
                    Some(format!("email '{email}' has a pending registration"))
                } else {
                    None
                }
            })
    })
}

fn require_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::validation("username: must not be empty"));
    }
    if password.is_empty() {
        return Err(AppError::validation("password: must not be empty"));
    }
    Ok(())
}

impl EntityStore {
    pub fn get_users(&self) -> Vec<User> {
        self.read(|doc| doc.users.iter().map(User::redacted).collect())
    }

    pub fn get_user(&self, id: i64) -> Option<User> {
        self.get::<User>(id).map(|u| u.redacted())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.read(|doc| {
            doc.users
                .iter()
                .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
                .map(User::redacted)
        })
    }

    pub fn add_user(&self, create: UserCreate) -> AppResult<User> {
        require_credentials(&create.username, &create.password)?;
        let password_hash = hash_password(&create.password)?;

        self.mutate(|m| {
            if let Some(reason) = identity_conflict(m.doc, &create.username, &create.email, None) {
                return Err(AppError::conflict(reason));
            }
            let user = User {
                id: m.doc.next_id::<User>(),
                username: create.username.trim().to_string(),
                email: create.email.trim().to_string(),
                full_name: create.full_name,
                phone: create.phone,
                role: create.role,
                password_hash,
                is_active: true,
                last_login: None,
                created_at: m.now,
                updated_at: m.now,
            };
            m.doc.users.push(user.clone());
            m.audit(
                AuditDraft::new(AuditAction::Create, User::TABLE)
                    .record(user.id)
                    .new_values(user.snapshot()),
            );
            tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User created");
            Ok(user.redacted())
        })
    }

    pub fn update_user(&self, id: i64, update: &UserUpdate) -> AppResult<Option<User>> {
        let password_hash = match &update.password {
            Some(password) if password.is_empty() => {
                return Err(AppError::validation("password: must not be empty"));
            }
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        self.mutate(|m| {
            let Some(current) = m.doc.users.iter().find(|u| u.id == id).cloned() else {
                return Ok(None);
            };
            if let Some(email) = &update.email {
                if let Some(reason) = identity_conflict(m.doc, &current.username, email, Some(id)) {
                    return Err(AppError::conflict(reason));
                }
            }
            let now = m.now;
            let Some(user) = find_mut::<User>(m.doc, id) else {
                return Ok(None);
            };
            if let Some(email) = &update.email {
                user.email = email.trim().to_string();
            }
            if let Some(full_name) = &update.full_name {
                user.full_name = full_name.clone();
            }
            if update.phone.is_some() {
                user.phone = update.phone.clone();
            }
            if let Some(role) = update.role {
                user.role = role;
            }
            if let Some(is_active) = update.is_active {
                user.is_active = is_active;
            }
            if let Some(hash) = password_hash {
                user.password_hash = hash;
            }
            user.updated_at = now;
            let after = user.clone();
            m.audit(
                AuditDraft::new(AuditAction::Update, User::TABLE)
                    .record(id)
                    .old(current.snapshot())
                    .new_values(after.snapshot()),
            );
            Ok(Some(after.redacted()))
        })
    }

    pub fn delete_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self
            .remove::<User>(id)?
            .map(|(removed, _)| removed.redacted()))
    }

    /// 用户名 + 密码登录
    ///
    /// 成功：写 `LOGIN`，更新 `last_login`，返回脱敏用户。
    /// 失败（用户不存在、已停用、密码错误）：写 `LOGIN_FAIL`，返回 `None`。
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let candidate = self.read(|doc| {
            doc.users
                .iter()
                .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
                .cloned()
        });

        let failure = match &candidate {
            None => Some("unknown user"),
            Some(user) if !user.is_active => Some("user is inactive"),
            Some(user) if !verify_password(password, &user.password_hash) => {
                Some("invalid password")
            }
            Some(_) => None,
        };

        self.mutate(|m| {
            let details = serde_json::json!({ "username": username });
            match (failure, &candidate) {
                (None, Some(user)) => {
                    let now = m.now;
                    let Some(stored) = find_mut::<User>(m.doc, user.id) else {
                        return Ok(None);
                    };
                    stored.last_login = Some(now);
                    let logged_in = stored.redacted();
                    m.audit(
                        AuditDraft::new(AuditAction::Login, User::TABLE)
                            .record(logged_in.id)
                            .details(details)
                            .by(Some(logged_in.id)),
                    );
                    tracing::info!(user_id = logged_in.id, "Login succeeded");
                    Ok(Some(logged_in))
                }
                (reason, user) => {
                    let reason = reason.unwrap_or("unknown user");
                    let mut draft = AuditDraft::new(AuditAction::LoginFail, User::TABLE)
                        .details(serde_json::json!({ "username": username, "reason": reason }))
                        .by(None);
                    if let Some(user) = user {
                        draft = draft.record(user.id);
                    }
                    m.audit(draft);
                    tracing::warn!(username, reason, "Login failed");
                    Ok(None)
                }
            }
        })
    }

    /// 是否至少存在一个启用的管理员
    pub fn has_active_admin(&self) -> bool {
        self.read(|doc| {
            doc.users
                .iter()
                .any(|u| u.role == Role::Admin && u.is_active)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditQuery;

    fn create(username: &str, role: Role) -> UserCreate {
        UserCreate {
            username: username.to_string(),
            email: format!("{username}@store.test"),
            full_name: username.to_string(),
            phone: None,
            role,
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn test_add_user_hashes_and_redacts() {
        let store = EntityStore::in_memory();
        let user = store.add_user(create("alice", Role::Admin)).unwrap();
        assert!(user.password_hash.is_empty());
        assert!(store.has_active_admin());

        let stored = store.get::<User>(user.id).unwrap();
        assert!(stored.password_hash.starts_with("$argon2"));

        let log = &store.get_audit_logs(&AuditQuery::new()).items[0];
        match &log.new_values {
            Some(shared::models::AuditSnapshot::User(u)) => assert!(u.password_hash.is_empty()),
            other => panic!("unexpected snapshot: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let store = EntityStore::in_memory();
        store.add_user(create("bob", Role::Worker)).unwrap();
        let err = store.add_user(create("BOB", Role::Worker)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_authenticate_logs_login_and_failure() {
        let store = EntityStore::in_memory();
        let user = store.add_user(create("carol", Role::Manager)).unwrap();

        assert!(store.authenticate("carol", "wrong").unwrap().is_none());
        let logged_in = store.authenticate("carol", "s3cret-pass").unwrap().unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(store.get_user(user.id).unwrap().last_login.is_some());

        let logs = store.get_audit_logs(&AuditQuery::new());
        assert_eq!(logs.items[0].action, AuditAction::Login);
        assert_eq!(logs.items[0].user_id, Some(user.id));
        assert_eq!(logs.items[1].action, AuditAction::LoginFail);
    }

    #[test]
    fn test_inactive_user_cannot_log_in() {
        let store = EntityStore::in_memory();
        let user = store.add_user(create("dave", Role::Worker)).unwrap();
        store
            .update_user(
                user.id,
                &UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.authenticate("dave", "s3cret-pass").unwrap().is_none());
    }
}
