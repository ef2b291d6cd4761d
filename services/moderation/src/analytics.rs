use chrono::Utc;
use uuid::Uuid;

use boardkeeper_common::{AppError, Principal};
use crate::{
    models::{ActionType, AppealStatus, MemberStanding, ModerationStats, ReportStatus},
    reputation::ReputationService,
    store::ModerationStore,
};

/// Read-only rollups over the moderation records.
#[derive(Clone)]
pub struct ModerationAnalytics {
    store: ModerationStore,
    reputation: ReputationService,
}

impl ModerationAnalytics {
    pub fn new(store: ModerationStore, reputation: ReputationService) -> Self {
        Self { store, reputation }
    }

    pub async fn member_standing(
        &self,
        viewer: &Principal,
        member_id: Uuid,
    ) -> Result<MemberStanding, AppError> {
        if !viewer.is_staff() && viewer.user_id != member_id {
            return Err(AppError::Forbidden("Cannot access another member's standing".to_string()));
        }

        let now = Utc::now();
        let mut standing = {
            let state = self.store.read().await;

            let mut actions_in_force = 0;
            let mut warnings_in_force = 0;
            let mut actions_reversed = 0;
            for view in state.actions().filter(|v| v.action.target_member_id == member_id) {
                if view.is_reversed {
                    actions_reversed += 1;
                } else {
                    actions_in_force += 1;
                    if view.action.action_type == ActionType::IssueWarning {
                        warnings_in_force += 1;
                    }
                }
            }

            MemberStanding {
                member_id,
                active_suspensions: state
                    .suspensions_for_member(member_id)
                    .filter(|s| s.is_active_at(now))
                    .map(|s| s.observe(now))
                    .collect(),
                actions_in_force,
                warnings_in_force,
                actions_reversed,
                open_appeals: state
                    .appeals()
                    .filter(|a| a.appellant_id == member_id && a.is_open())
                    .count(),
                reputation: self.reputation.get_reputation(member_id).await,
            }
        };

        if !viewer.is_staff() {
            standing.active_suspensions = standing
                .active_suspensions
                .into_iter()
                .map(|s| s.redacted())
                .collect();
        }

        Ok(standing)
    }

    pub async fn moderation_stats(&self, viewer: &Principal) -> Result<ModerationStats, AppError> {
        if !viewer.is_staff() {
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }

        let now = Utc::now();
        let state = self.store.read().await;
        let mut stats = ModerationStats::default();

        for report in state.reports() {
            match report.status {
                ReportStatus::Pending => stats.reports_pending += 1,
                ReportStatus::Resolved => stats.reports_resolved += 1,
                ReportStatus::Dismissed => stats.reports_dismissed += 1,
            }
        }

        for view in state.actions() {
            stats.actions_total += 1;
            if view.is_reversed {
                stats.actions_reversed += 1;
            }
        }

        stats.suspensions_active = state.suspensions().filter(|s| s.is_active_at(now)).count();

        for appeal in state.appeals() {
            match appeal.status() {
                AppealStatus::Pending => stats.appeals_pending += 1,
                AppealStatus::Upheld => stats.appeals_upheld += 1,
                AppealStatus::Overturned => stats.appeals_overturned += 1,
            }
            if appeal.is_escalated() {
                stats.appeals_escalated += 1;
            }
        }

        Ok(stats)
    }
}
