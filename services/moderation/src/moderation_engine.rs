use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use boardkeeper_common::{AppError, Page, PageRequest, Principal};
use crate::{
    audit::{deliver, AuditEvent, AuditSink},
    directory::Directory,
    models::{
        ActingStaff, ActionQuery, CreateActionRequest, ModerationAction, ModerationActionView,
    },
    reputation::ReputationService,
    store::ModerationStore,
};

/// The moderation action ledger.
#[derive(Clone)]
pub struct ModerationEngine {
    store: ModerationStore,
    directory: Arc<dyn Directory>,
    audit: Arc<dyn AuditSink>,
    reputation: ReputationService,
    min_reason_length: usize,
}

impl ModerationEngine {
    pub fn new(
        store: ModerationStore,
        directory: Arc<dyn Directory>,
        audit: Arc<dyn AuditSink>,
        reputation: ReputationService,
        min_reason_length: usize,
    ) -> Self {
        Self {
            store,
            directory,
            audit,
            reputation,
            min_reason_length,
        }
    }

    pub async fn execute_moderation_action(
        &self,
        principal: &Principal,
        request: CreateActionRequest,
    ) -> Result<ModerationActionView, AppError> {
        let actor = ActingStaff::from_principal(principal)?;
        request.validate()?;

        let reason = request.reason.trim().to_string();
        if reason.chars().count() < self.min_reason_length {
            return Err(AppError::Validation(format!(
                "reason must be at least {} characters",
                self.min_reason_length
            )));
        }
        if request.action_type.changes_content() && request.content_ref.is_none() {
            return Err(AppError::Validation(format!(
                "{:?} requires a content reference",
                request.action_type
            )));
        }
        if request.reputation_penalty == Some(0) {
            return Err(AppError::Validation("reputation_penalty must be non-zero".to_string()));
        }

        self.directory.require_member(request.target_member_id).await?;
        let content_snapshot = self.capture_snapshot(&request).await?;

        let view = {
            let mut state = self.store.write().await;
            if let Some(report_id) = request.related_report_id {
                state.report(report_id)?;
            }

            state.append_action(ModerationAction {
                id: Uuid::new_v4(),
                actor,
                target_member_id: request.target_member_id,
                related_report_id: request.related_report_id,
                content_ref: request.content_ref,
                action_type: request.action_type,
                reason,
                category: request.category,
                content_snapshot,
                reputation_penalty: request.reputation_penalty,
                created_at: Utc::now(),
            })
        };
        let action = &view.action;

        tracing::info!(
            "Moderation action {} ({:?}) by {} {} against member {}",
            action.id, action.action_type, actor.role(), actor.id(), action.target_member_id
        );

        if let Some(delta) = action.reputation_penalty {
            self.reputation
                .record_moderation_penalty(
                    action.target_member_id,
                    delta,
                    format!("{:?}: {}", action.action_type, action.reason),
                    Some(action.id),
                )
                .await?;
        }

        deliver(self.audit.as_ref(), AuditEvent::ActionCreated(view.clone())).await;
        Ok(view)
    }

    /// A caller-supplied snapshot is stored verbatim. Otherwise the current
    /// body is frozen, which also checks the content belongs to the target.
    async fn capture_snapshot(&self, request: &CreateActionRequest) -> Result<Option<String>, AppError> {
        if request.content_snapshot.is_some() {
            return Ok(request.content_snapshot.clone());
        }
        let Some(target) = request.content_ref else {
            return Ok(None);
        };

        let content = self.directory.require_content(target).await?;
        if content.owner_id != request.target_member_id {
            return Err(AppError::Validation(format!(
                "Content {} does not belong to member {}",
                target, request.target_member_id
            )));
        }
        Ok(Some(content.body))
    }

    /// Follow-up for an action whose reversal has just committed.
    pub(crate) async fn on_reversed(&self, view: &ModerationActionView) -> Result<(), AppError> {
        tracing::info!("Moderation action {} reversed", view.action.id);

        if view.action.reputation_penalty.is_some() {
            self.reputation
                .compensate_action(view.action.target_member_id, view.action.id)
                .await?;
        }

        deliver(self.audit.as_ref(), AuditEvent::ActionReversed(view.clone())).await;
        Ok(())
    }

    /// Visible to staff and to the sanctioned member.
    pub async fn get_action(
        &self,
        viewer: &Principal,
        action_id: Uuid,
    ) -> Result<ModerationActionView, AppError> {
        let view = self.store.read().await.action_view(action_id)?;

        if !viewer.is_staff() && view.action.target_member_id != viewer.user_id {
            return Err(AppError::Forbidden(
                "Cannot access moderation actions against other members".to_string(),
            ));
        }

        Ok(view)
    }

    /// Staff query over the ledger, newest first.
    pub async fn list_actions(
        &self,
        viewer: &Principal,
        query: ActionQuery,
    ) -> Result<Page<ModerationActionView>, AppError> {
        if !viewer.is_staff() {
            return Err(AppError::Forbidden("Only staff may query the moderation ledger".to_string()));
        }

        let mut actions: Vec<ModerationActionView> = {
            let state = self.store.read().await;
            state
                .actions()
                .filter(|v| query.member_id.map_or(true, |id| v.action.target_member_id == id))
                .filter(|v| query.action_type.map_or(true, |t| v.action.action_type == t))
                .filter(|v| query.reversed.map_or(true, |r| v.is_reversed == r))
                .collect()
        };
        actions.reverse();

        Ok(Page::from_vec(actions, PageRequest::new(query.page, query.per_page)))
    }
}
