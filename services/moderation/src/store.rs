use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use boardkeeper_common::AppError;

use crate::models::{
    Appeal, ModerationAction, ModerationActionView, Report, Reversal, Suspension,
    SuspensionState, SuspensionView,
};

/// Shared handle to the moderation records.
///
/// Every transition takes the write guard for its whole read-check-write
/// sequence, so concurrent attempts on the same entity serialize and a
/// rejected call never leaves a partial update behind.
#[derive(Clone, Default)]
pub struct ModerationStore {
    state: Arc<RwLock<ModerationState>>,
}

impl ModerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ModerationState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, ModerationState> {
        self.state.write().await
    }
}

#[derive(Default)]
pub struct ModerationState {
    reports: HashMap<Uuid, Report>,
    report_order: Vec<Uuid>,
    // Append-only action log plus an id index and the reversal facts
    actions: Vec<ModerationAction>,
    action_index: HashMap<Uuid, usize>,
    reversals: HashMap<Uuid, Reversal>,
    suspensions: HashMap<Uuid, Suspension>,
    suspension_order: Vec<Uuid>,
    appeals: HashMap<Uuid, Appeal>,
    appeal_order: Vec<Uuid>,
}

impl ModerationState {
    // Reports

    pub fn insert_report(&mut self, report: Report) {
        self.report_order.push(report.id);
        self.reports.insert(report.id, report);
    }

    pub fn report(&self, id: Uuid) -> Result<&Report, AppError> {
        self.reports
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    pub fn report_mut(&mut self, id: Uuid) -> Result<&mut Report, AppError> {
        self.reports
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.report_order.iter().filter_map(|id| self.reports.get(id))
    }

    // Moderation actions

    pub fn append_action(&mut self, action: ModerationAction) -> ModerationActionView {
        let view = ModerationActionView::new(action.clone(), None);
        self.action_index.insert(action.id, self.actions.len());
        self.actions.push(action);
        view
    }

    pub fn action(&self, id: Uuid) -> Result<&ModerationAction, AppError> {
        self.action_index
            .get(&id)
            .and_then(|&slot| self.actions.get(slot))
            .ok_or_else(|| AppError::NotFound(format!("Moderation action {} not found", id)))
    }

    pub fn action_view(&self, id: Uuid) -> Result<ModerationActionView, AppError> {
        let action = self.action(id)?;
        Ok(ModerationActionView::new(action.clone(), self.reversals.get(&id)))
    }

    pub fn actions(&self) -> impl Iterator<Item = ModerationActionView> + '_ {
        self.actions
            .iter()
            .map(|action| ModerationActionView::new(action.clone(), self.reversals.get(&action.id)))
    }

    pub fn is_reversed(&self, id: Uuid) -> bool {
        self.reversals.contains_key(&id)
    }

    /// Records the reversal fact. Reversing twice is a no-op; the flag in the
    /// result tells whether this call made the change.
    pub fn reverse_action(
        &mut self,
        id: Uuid,
        appeal_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(ModerationActionView, bool), AppError> {
        self.action(id)?;
        let newly_reversed = !self.reversals.contains_key(&id);
        if newly_reversed {
            self.reversals.insert(id, Reversal { reversed_at: now, appeal_id });
        }
        Ok((self.action_view(id)?, newly_reversed))
    }

    // Suspensions

    pub fn insert_suspension(&mut self, suspension: Suspension) {
        self.suspension_order.push(suspension.id);
        self.suspensions.insert(suspension.id, suspension);
    }

    pub fn suspension(&self, id: Uuid) -> Result<&Suspension, AppError> {
        self.suspensions
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Suspension {} not found", id)))
    }

    pub fn suspensions(&self) -> impl Iterator<Item = &Suspension> {
        self.suspension_order.iter().filter_map(|id| self.suspensions.get(id))
    }

    pub fn suspensions_for_member(&self, member_id: Uuid) -> impl Iterator<Item = &Suspension> {
        self.suspensions().filter(move |s| s.member_id == member_id)
    }

    pub fn suspensions_for_action(&self, action_id: Uuid) -> Vec<Uuid> {
        self.suspensions()
            .filter(|s| s.moderation_action_id == Some(action_id))
            .map(|s| s.id)
            .collect()
    }

    /// Ends an active suspension early.
    ///
    /// Lifting one that was already lifted early returns it unchanged; one
    /// that ran out on its own cannot be lifted.
    pub fn lift_suspension(
        &mut self,
        id: Uuid,
        reason: &str,
        lifted_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(SuspensionView, bool), AppError> {
        let suspension = self
            .suspensions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Suspension {} not found", id)))?;

        match suspension.state {
            SuspensionState::LiftedEarly { .. } => Ok((suspension.observe(now), false)),
            SuspensionState::Expired { .. } => Err(AppError::InvalidState(format!(
                "Suspension {} has already expired",
                id
            ))),
            SuspensionState::Active if suspension.has_lapsed(now) => Err(AppError::InvalidState(
                format!("Suspension {} has already expired", id),
            )),
            SuspensionState::Active => {
                suspension.state = SuspensionState::LiftedEarly {
                    lifted_at: now,
                    lifted_reason: reason.to_string(),
                    lifted_by,
                };
                suspension.updated_at = now;
                Ok((suspension.observe(now), true))
            }
        }
    }

    /// Marks every lapsed suspension as expired; returns their ids.
    pub fn expire_due(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        self.suspensions
            .values_mut()
            .filter_map(|s| s.expire(now).then_some(s.id))
            .collect()
    }

    // Appeals

    pub fn insert_appeal(&mut self, appeal: Appeal) {
        self.appeal_order.push(appeal.id);
        self.appeals.insert(appeal.id, appeal);
    }

    pub fn appeal(&self, id: Uuid) -> Result<&Appeal, AppError> {
        self.appeals
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Appeal {} not found", id)))
    }

    pub fn appeal_mut(&mut self, id: Uuid) -> Result<&mut Appeal, AppError> {
        self.appeals
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Appeal {} not found", id)))
    }

    pub fn appeals(&self) -> impl Iterator<Item = &Appeal> {
        self.appeal_order.iter().filter_map(|id| self.appeals.get(id))
    }

    pub fn open_appeal_for(&self, action_id: Uuid) -> Option<&Appeal> {
        self.appeals()
            .find(|a| a.moderation_action_id == action_id && a.is_open())
    }
}
