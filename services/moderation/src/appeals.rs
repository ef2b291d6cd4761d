use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use boardkeeper_common::{AppError, Page, PageRequest, Principal, Role};
use crate::{
    audit::{deliver, AuditEvent, AuditSink},
    models::{
        ActingStaff, Appeal, AppealDecision, AppealStage, AppealStatus, AppealView,
        ReviewAppealRequest, Review, SubmitAppealRequest,
    },
    moderation_engine::ModerationEngine,
    store::ModerationStore,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppealQuery {
    pub status: Option<AppealStatus>,
    pub escalated: Option<bool>,
    pub open: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Clone)]
pub struct AppealService {
    store: ModerationStore,
    audit: Arc<dyn AuditSink>,
    moderation_engine: ModerationEngine,
}

impl AppealService {
    pub fn new(
        store: ModerationStore,
        audit: Arc<dyn AuditSink>,
        moderation_engine: ModerationEngine,
    ) -> Self {
        Self {
            store,
            audit,
            moderation_engine,
        }
    }

    /// Opens an appeal against an action taken against the caller.
    pub async fn submit_appeal(
        &self,
        appellant: &Principal,
        request: SubmitAppealRequest,
    ) -> Result<AppealView, AppError> {
        request.validate()?;

        let view = {
            let mut state = self.store.write().await;
            let action = state.action(request.moderation_action_id)?;

            if action.target_member_id != appellant.user_id {
                return Err(AppError::Forbidden(
                    "Only the sanctioned member may appeal this action".to_string(),
                ));
            }
            if state.is_reversed(action.id) {
                return Err(AppError::InvalidState(format!(
                    "Moderation action {} has already been reversed",
                    action.id
                )));
            }
            if let Some(open) = state.open_appeal_for(action.id) {
                tracing::warn!(
                    "Rejected appeal on action {}: appeal {} still open",
                    action.id, open.id
                );
                return Err(AppError::Conflict(format!(
                    "Appeal {} is already open for this action",
                    open.id
                )));
            }

            let now = Utc::now();
            let appeal = Appeal {
                id: Uuid::new_v4(),
                moderation_action_id: request.moderation_action_id,
                appellant_id: appellant.user_id,
                appeal_type: request.appeal_type,
                appeal_text: request.appeal_text,
                stage: AppealStage::AwaitingReview,
                created_at: now,
                updated_at: now,
            };
            let view = appeal.view();
            state.insert_appeal(appeal);
            view
        };

        tracing::info!(
            "Appeal {} submitted by {} against action {}",
            view.id, view.appellant_id, view.moderation_action_id
        );
        deliver(self.audit.as_ref(), AuditEvent::AppealSubmitted(view.clone())).await;

        Ok(view)
    }

    /// Records a decision. An overturn reverses the appealed action and lifts
    /// every still-active suspension derived from it, in the same commit.
    pub async fn review_appeal(
        &self,
        reviewer: &Principal,
        appeal_id: Uuid,
        request: ReviewAppealRequest,
    ) -> Result<AppealView, AppError> {
        let actor = ActingStaff::from_principal(reviewer)?;
        request.validate()?;

        let now = Utc::now();
        let (view, reversed, lifted) = {
            let mut state = self.store.write().await;
            let appeal = state.appeal(appeal_id)?;
            let action_id = appeal.moderation_action_id;
            let review = Review {
                reviewer: actor,
                decision: request.decision,
                explanation: request.explanation.trim().to_string(),
                reviewed_at: now,
            };

            let next_stage = match &appeal.stage {
                AppealStage::AwaitingReview => AppealStage::Decided { review },
                AppealStage::Escalated { first_review, escalated_at } => {
                    if actor.role() != Role::Administrator {
                        return Err(AppError::Forbidden(
                            "Escalated appeals are reviewed by administrators".to_string(),
                        ));
                    }
                    AppealStage::Resolved {
                        first_review: first_review.clone(),
                        escalated_at: *escalated_at,
                        final_review: review,
                    }
                }
                AppealStage::Decided { .. } | AppealStage::Resolved { .. } => {
                    tracing::warn!("Rejected review of appeal {}: already decided", appeal_id);
                    return Err(AppError::InvalidState(format!(
                        "Appeal {} has already been decided",
                        appeal_id
                    )));
                }
            };

            // Checked up front so the mutations below cannot fail halfway
            state.action(action_id)?;

            if request.decision == AppealDecision::Uphold && state.is_reversed(action_id) {
                // Reversal facts are never withdrawn; the upheld status is recorded as is
                tracing::info!(
                    "Appeal {} upheld after action {} was already reversed",
                    appeal_id, action_id
                );
            }

            let mut reversed = None;
            let mut lifted = Vec::new();
            if request.decision == AppealDecision::Overturn {
                let (action_view, newly_reversed) =
                    state.reverse_action(action_id, Some(appeal_id), now)?;
                if newly_reversed {
                    reversed = Some(action_view);
                }

                let lift_reason = format!("Appeal {} overturned the originating action", appeal_id);
                for suspension_id in state.suspensions_for_action(action_id) {
                    let active = state
                        .suspension(suspension_id)
                        .map(|s| s.is_active_at(now))
                        .unwrap_or(false);
                    if active {
                        let (lifted_view, _) =
                            state.lift_suspension(suspension_id, &lift_reason, Some(actor.id()), now)?;
                        lifted.push(lifted_view);
                    }
                }
            }

            let appeal = state.appeal_mut(appeal_id)?;
            appeal.stage = next_stage;
            appeal.updated_at = now;
            (appeal.view(), reversed, lifted)
        };

        tracing::info!(
            "Appeal {} {:?} by {} {}",
            appeal_id, view.status, actor.role(), actor.id()
        );

        if let Some(action_view) = reversed {
            self.moderation_engine.on_reversed(&action_view).await?;
        }
        for suspension in lifted {
            tracing::info!("Suspension {} lifted by appeal {}", suspension.id, appeal_id);
            deliver(self.audit.as_ref(), AuditEvent::SuspensionLifted(suspension)).await;
        }
        deliver(self.audit.as_ref(), AuditEvent::AppealReviewed(view.clone())).await;

        Ok(view)
    }

    /// Sends a moderator's decision, either way, to administrator review.
    /// Only the appellant may escalate, and only once.
    pub async fn escalate(&self, appellant: &Principal, appeal_id: Uuid) -> Result<AppealView, AppError> {
        let view = {
            let mut state = self.store.write().await;
            let appeal = state.appeal(appeal_id)?;

            if appeal.appellant_id != appellant.user_id {
                return Err(AppError::Forbidden("Only the appellant may escalate an appeal".to_string()));
            }

            let first_review = match &appeal.stage {
                AppealStage::AwaitingReview => {
                    return Err(AppError::InvalidState(
                        "Appeal has not been reviewed yet".to_string(),
                    ));
                }
                AppealStage::Escalated { .. } | AppealStage::Resolved { .. } => {
                    return Err(AppError::InvalidState(
                        "Appeal has already been escalated".to_string(),
                    ));
                }
                AppealStage::Decided { review } if review.reviewer.role() == Role::Administrator => {
                    return Err(AppError::InvalidState(
                        "Administrator decisions are final".to_string(),
                    ));
                }
                AppealStage::Decided { review } => review.clone(),
            };

            // A later appeal on the same action may already be awaiting review
            if let Some(open) = state.open_appeal_for(appeal.moderation_action_id) {
                tracing::warn!(
                    "Rejected escalation of appeal {}: appeal {} still open",
                    appeal_id, open.id
                );
                return Err(AppError::Conflict(format!(
                    "Appeal {} is already open for this action",
                    open.id
                )));
            }

            let now = Utc::now();
            let appeal = state.appeal_mut(appeal_id)?;
            appeal.stage = AppealStage::Escalated {
                first_review,
                escalated_at: now,
            };
            appeal.updated_at = now;
            appeal.view()
        };

        tracing::info!("Appeal {} escalated to administrator review", appeal_id);
        deliver(self.audit.as_ref(), AuditEvent::AppealEscalated(view.clone())).await;

        Ok(view)
    }

    /// Visible to the appellant and to staff.
    pub async fn get_appeal(&self, viewer: &Principal, appeal_id: Uuid) -> Result<AppealView, AppError> {
        let state = self.store.read().await;
        let appeal = state.appeal(appeal_id)?;

        if !viewer.is_staff() && appeal.appellant_id != viewer.user_id {
            return Err(AppError::Forbidden("Cannot access another member's appeal".to_string()));
        }

        Ok(appeal.view())
    }

    /// Staff review queue, oldest first.
    pub async fn list_appeals(
        &self,
        viewer: &Principal,
        query: AppealQuery,
    ) -> Result<Page<AppealView>, AppError> {
        if !viewer.is_staff() {
            return Err(AppError::Forbidden("Only staff may list appeals".to_string()));
        }

        let appeals: Vec<AppealView> = {
            let state = self.store.read().await;
            state
                .appeals()
                .filter(|a| query.status.map_or(true, |s| a.status() == s))
                .filter(|a| query.escalated.map_or(true, |e| a.is_escalated() == e))
                .filter(|a| query.open.map_or(true, |o| a.is_open() == o))
                .map(Appeal::view)
                .collect()
        };

        Ok(Page::from_vec(appeals, PageRequest::new(query.page, query.per_page)))
    }
}
