//! 注册审批流程
//!
//! ```text
//! submit ──▶ pending ──confirm_email──▶ pending(email_confirmed)
//!               │                              │
//!               └──reject──▶ rejected          └──approve──▶ approved + User
//! ```
//!
//! - 只有 `pending` 可以流转
//! - 审批前必须确认邮箱（拒绝不需要）
//! - manager 只能审批 worker 申请；admin 可审批 worker/manager；worker 不能审批
//!
//! 流程类失败以 [`OperationResult`] 返回，不是错误。

use shared::models::{
    AuditAction, Record, RegistrationCreate, RegistrationRequest, RegistrationStatus, Role, User,
};
use shared::OperationResult;

use crate::audit::AuditDraft;
use crate::auth::hash_password;
use crate::store::{EntityStore, identity_conflict};
use crate::utils::{AppError, AppResult};

pub const MSG_ALREADY_PROCESSED: &str = "Registration request already processed";
pub const MSG_EMAIL_NOT_CONFIRMED: &str = "Email confirmation is required before approval";
pub const MSG_MANAGER_NEEDS_ADMIN: &str = "Only admins can approve manager registrations";
pub const MSG_WORKER_CANNOT_REVIEW: &str = "Workers cannot review registration requests";

/// 审批人角色规则
fn may_approve(approver: Role, requested: Role) -> Result<(), &'static str> {
    match (approver, requested) {
        (Role::Admin, Role::Worker | Role::Manager) => Ok(()),
        (Role::Manager, Role::Worker) => Ok(()),
        (Role::Manager, _) => Err(MSG_MANAGER_NEEDS_ADMIN),
        (Role::Worker, _) => Err(MSG_WORKER_CANNOT_REVIEW),
        (Role::Admin, Role::Admin) => Err("Admin accounts cannot be requested"),
    }
}

impl EntityStore {
    pub fn get_registration_requests(&self) -> Vec<RegistrationRequest> {
        self.read(|doc| {
            doc.registration_requests
                .iter()
                .map(RegistrationRequest::redacted)
                .collect()
        })
    }

    pub fn get_pending_registrations(&self) -> Vec<RegistrationRequest> {
        self.read(|doc| {
            doc.registration_requests
                .iter()
                .filter(|r| r.is_pending())
                .map(RegistrationRequest::redacted)
                .collect()
        })
    }

    /// 提交注册申请，返回带确认令牌的申请（令牌需通过邮件发给申请人）
    pub fn submit_registration(&self, input: RegistrationCreate) -> AppResult<RegistrationRequest> {
        if input.username.trim().is_empty() {
            return Err(AppError::validation("username: must not be empty"));
        }
        if input.email.trim().is_empty() {
            return Err(AppError::validation("email: must not be empty"));
        }
        if input.password.is_empty() {
            return Err(AppError::validation("password: must not be empty"));
        }
        if input.requested_role == Role::Admin {
            return Err(AppError::validation(
                "requested_role: admin accounts cannot be requested",
            ));
        }
        let password_hash = hash_password(&input.password)?;
        let token = uuid::Uuid::new_v4().to_string();

        self.mutate(|m| {
            if let Some(reason) = identity_conflict(m.doc, &input.username, &input.email, None) {
                return Err(AppError::conflict(reason));
            }
            let request = RegistrationRequest {
                id: m.doc.next_id::<RegistrationRequest>(),
                username: input.username.trim().to_string(),
                email: input.email.trim().to_string(),
                full_name: input.full_name,
                phone: input.phone,
                requested_role: input.requested_role,
                password_hash,
                email_confirmed: false,
                confirmation_token: token,
                status: RegistrationStatus::Pending,
                reviewed_by: None,
                reviewed_at: None,
                review_note: None,
                created_at: m.now,
                updated_at: m.now,
            };
            m.doc.registration_requests.push(request.clone());
            m.audit(
                AuditDraft::new(AuditAction::Create, RegistrationRequest::TABLE)
                    .record(request.id)
                    .new_values(request.snapshot())
                    .by(None),
            );
            tracing::info!(
                request_id = request.id,
                username = %request.username,
                role = %request.requested_role,
                "Registration submitted"
            );
            Ok(RegistrationRequest {
                password_hash: String::new(),
                ..request
            })
        })
    }

    /// 通过令牌确认邮箱
    pub fn confirm_email(&self, token: &str) -> AppResult<OperationResult> {
        self.mutate(|m| {
            let now = m.now;
            let Some(request) = m
                .doc
                .registration_requests
                .iter_mut()
                .find(|r| !token.is_empty() && r.confirmation_token == token)
            else {
                return Ok(OperationResult::fail("Invalid confirmation token"));
            };
            if !request.is_pending() {
                return Ok(OperationResult::fail(MSG_ALREADY_PROCESSED));
            }
            if request.email_confirmed {
                return Ok(OperationResult::ok("Email already confirmed"));
            }
            let before = request.clone();
            request.email_confirmed = true;
            request.updated_at = now;
            let after = request.clone();
            m.audit(
                AuditDraft::new(AuditAction::Update, RegistrationRequest::TABLE)
                    .record(after.id)
                    .old(before.snapshot())
                    .new_values(after.snapshot())
                    .by(None),
            );
            tracing::info!(request_id = after.id, "Registration email confirmed");
            Ok(OperationResult::ok("Email confirmed"))
        })
    }

    /// 审批通过：创建启用的用户，写 `APPROVE_REGISTRATION` + users `CREATE`
    pub fn approve_registration(
        &self,
        request_id: i64,
        approver: &User,
    ) -> AppResult<OperationResult> {
        self.mutate(|m| {
            let now = m.now;
            let user_id = m.doc.next_id::<User>();
            let Some(request) = m
                .doc
                .registration_requests
                .iter()
                .find(|r| r.id == request_id)
                .cloned()
            else {
                return Err(AppError::record_not_found(
                    RegistrationRequest::TABLE,
                    request_id,
                ));
            };

            if !request.is_pending() {
                return Ok(OperationResult::fail(MSG_ALREADY_PROCESSED));
            }
            if !request.email_confirmed {
                return Ok(OperationResult::fail(MSG_EMAIL_NOT_CONFIRMED));
            }
            if let Err(reason) = may_approve(approver.role, request.requested_role) {
                return Ok(OperationResult::fail(reason));
            }
            if m.doc
                .users
                .iter()
                .any(|u| u.username.eq_ignore_ascii_case(&request.username))
            {
                return Ok(OperationResult::fail(format!(
                    "username '{}' is already taken",
                    request.username
                )));
            }

            let mut approved = request.clone();
            approved.status = RegistrationStatus::Approved;
            approved.reviewed_by = Some(approver.id);
            approved.reviewed_at = Some(now);
            approved.updated_at = now;

            let user = User {
                id: user_id,
                username: request.username.clone(),
                email: request.email.clone(),
                full_name: request.full_name.clone(),
                phone: request.phone.clone(),
                role: request.requested_role,
                password_hash: request.password_hash.clone(),
                is_active: true,
                last_login: None,
                created_at: now,
                updated_at: now,
            };

            if let Some(stored) = m
                .doc
                .registration_requests
                .iter_mut()
                .find(|r| r.id == request_id)
            {
                *stored = approved.clone();
            }
            m.doc.users.push(user.clone());

            m.audit(
                AuditDraft::new(AuditAction::ApproveRegistration, RegistrationRequest::TABLE)
                    .record(request_id)
                    .old(request.snapshot())
                    .new_values(approved.snapshot())
                    .by(Some(approver.id)),
            );
            m.audit(
                AuditDraft::new(AuditAction::Create, User::TABLE)
                    .record(user.id)
                    .new_values(user.snapshot())
                    .by(Some(approver.id)),
            );
            tracing::info!(
                request_id,
                user_id = user.id,
                role = %user.role,
                approver = approver.id,
                "Registration approved"
            );
            Ok(OperationResult::ok(format!(
                "Registration approved, user {} created",
                user.username
            )))
        })
    }

    /// 拒绝：只写 `REJECT_REGISTRATION`，不创建用户
    pub fn reject_registration(
        &self,
        request_id: i64,
        reviewer: &User,
        note: Option<String>,
    ) -> AppResult<OperationResult> {
        self.mutate(|m| {
            let now = m.now;
            let Some(request) = m
                .doc
                .registration_requests
                .iter_mut()
                .find(|r| r.id == request_id)
            else {
                return Err(AppError::record_not_found(
                    RegistrationRequest::TABLE,
                    request_id,
                ));
            };
            if !request.is_pending() {
                return Ok(OperationResult::fail(MSG_ALREADY_PROCESSED));
            }
            if reviewer.role == Role::Worker {
                return Ok(OperationResult::fail(MSG_WORKER_CANNOT_REVIEW));
            }

            let before = request.clone();
            request.status = RegistrationStatus::Rejected;
            request.reviewed_by = Some(reviewer.id);
            request.reviewed_at = Some(now);
            request.review_note = note;
            request.updated_at = now;
            let after = request.clone();

            m.audit(
                AuditDraft::new(AuditAction::RejectRegistration, RegistrationRequest::TABLE)
                    .record(request_id)
                    .old(before.snapshot())
                    .new_values(after.snapshot())
                    .by(Some(reviewer.id)),
            );
            tracing::info!(request_id, reviewer = reviewer.id, "Registration rejected");
            Ok(OperationResult::ok("Registration rejected"))
        })
    }
}
