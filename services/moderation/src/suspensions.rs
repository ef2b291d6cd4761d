use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use boardkeeper_common::{AppError, Principal};
use crate::{
    audit::{deliver, AuditEvent, AuditSink},
    directory::Directory,
    models::{
        ActingStaff, CreateSuspensionRequest, Suspension, SuspensionQuery,
        SuspensionView,
    },
    policy::SuspensionPolicy,
    store::ModerationStore,
};

#[derive(Clone)]
pub struct SuspensionService {
    store: ModerationStore,
    directory: Arc<dyn Directory>,
    audit: Arc<dyn AuditSink>,
    policy: Arc<SuspensionPolicy>,
}

impl SuspensionService {
    pub fn new(
        store: ModerationStore,
        directory: Arc<dyn Directory>,
        audit: Arc<dyn AuditSink>,
        policy: SuspensionPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            audit,
            policy: Arc::new(policy),
        }
    }

    pub async fn create_suspension(
        &self,
        principal: &Principal,
        request: CreateSuspensionRequest,
    ) -> Result<SuspensionView, AppError> {
        let issuer = ActingStaff::from_principal(principal)?;
        request.validate()?;
        self.policy.check(issuer.role(), request.scope.kind(), request.term)?;
        self.directory.require_member(request.member_id).await?;

        let now = Utc::now();
        let view = {
            let mut state = self.store.write().await;

            if let Some(action_id) = request.moderation_action_id {
                let action = state.action(action_id)?;
                if !action.action_type.is_sanction() {
                    return Err(AppError::Validation(format!(
                        "Moderation action {} is {:?}, not a suspension or ban",
                        action_id, action.action_type
                    )));
                }
                if action.target_member_id != request.member_id {
                    return Err(AppError::Validation(format!(
                        "Moderation action {} targets a different member",
                        action_id
                    )));
                }
                if state.is_reversed(action_id) {
                    return Err(AppError::InvalidState(format!(
                        "Moderation action {} has been reversed",
                        action_id
                    )));
                }
            }

            let suspension = Suspension::new(
                request.member_id,
                issuer,
                request.scope,
                request.term,
                request.reason_category,
                request.reason,
                request.moderation_action_id,
                request.internal_notes,
                now,
            )?;
            let view = suspension.observe(now);
            state.insert_suspension(suspension);
            view
        };

        tracing::info!(
            "Suspension {} ({:?}, {:?}) issued to {} by {} {}",
            view.id, view.scope.kind(), request.term, view.member_id, issuer.role(), issuer.id()
        );
        deliver(self.audit.as_ref(), AuditEvent::SuspensionCreated(view.clone())).await;

        Ok(view)
    }

    /// Direct leniency, allowed for any scope the caller's role may issue in.
    pub async fn lift_early(
        &self,
        principal: &Principal,
        suspension_id: Uuid,
        reason: &str,
    ) -> Result<SuspensionView, AppError> {
        let lifter = ActingStaff::from_principal(principal)?;
        if reason.trim().is_empty() {
            return Err(AppError::Validation("reason must not be blank".to_string()));
        }

        let now = Utc::now();
        let (view, changed) = {
            let mut state = self.store.write().await;
            let scope = state.suspension(suspension_id)?.scope.kind();
            if !self.policy.may_lift(lifter.role(), scope) {
                return Err(AppError::Forbidden(format!(
                    "{} may not lift {:?} suspensions",
                    lifter.role(),
                    scope
                )));
            }
            state.lift_suspension(suspension_id, reason.trim(), Some(principal.user_id), now)?
        };

        if changed {
            tracing::info!("Suspension {} lifted early by {}", suspension_id, principal.user_id);
            deliver(self.audit.as_ref(), AuditEvent::SuspensionLifted(view.clone())).await;
        } else {
            tracing::debug!("Suspension {} was already lifted", suspension_id);
        }

        Ok(view)
    }

    pub async fn get_suspension(
        &self,
        viewer: &Principal,
        suspension_id: Uuid,
    ) -> Result<SuspensionView, AppError> {
        let view = self.store.read().await.suspension(suspension_id)?.observe(Utc::now());
        if viewer.is_staff() {
            Ok(view)
        } else if view.member_id == viewer.user_id {
            Ok(view.redacted())
        } else {
            Err(AppError::Forbidden("Cannot access another member's suspensions".to_string()))
        }
    }

    pub async fn list_for_member(
        &self,
        viewer: &Principal,
        member_id: Uuid,
        query: SuspensionQuery,
    ) -> Result<Vec<SuspensionView>, AppError> {
        if !viewer.is_staff() && viewer.user_id != member_id {
            return Err(AppError::Forbidden("Cannot access another member's suspensions".to_string()));
        }

        let now = Utc::now();
        let views = self
            .store
            .read()
            .await
            .suspensions_for_member(member_id)
            .map(|s| s.observe(now))
            .filter(|v| query.active.map_or(true, |active| v.is_active == active))
            .map(|v| if viewer.is_staff() { v } else { v.redacted() })
            .collect();

        Ok(views)
    }

    /// Stamps natural expiry on every lapsed suspension.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let expired = self.store.write().await.expire_due(now);
        for id in &expired {
            tracing::info!("Suspension {} expired", id);
        }
        expired
    }

    /// Runs [`Self::expire_due`] on a fixed interval until the task is dropped.
    pub fn spawn_expiry_sweep(&self, interval_seconds: u64) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
            loop {
                interval.tick().await;
                let expired = service.expire_due(Utc::now()).await;
                if !expired.is_empty() {
                    tracing::debug!("Expiry sweep closed {} suspension(s)", expired.len());
                }
            }
        })
    }
}
