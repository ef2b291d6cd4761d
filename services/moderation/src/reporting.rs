use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use boardkeeper_common::{AppError, Page, PageRequest, Principal};
use crate::{
    audit::{deliver, AuditEvent, AuditSink},
    directory::Directory,
    models::{
        ActingStaff, CreateReportRequest, Report, ReportPriority, ReportQuery, ReportStatus,
        ResolveReportRequest,
    },
    store::ModerationStore,
};

#[derive(Clone)]
pub struct ReportingService {
    store: ModerationStore,
    directory: Arc<dyn Directory>,
    audit: Arc<dyn AuditSink>,
}

impl ReportingService {
    pub fn new(
        store: ModerationStore,
        directory: Arc<dyn Directory>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            directory,
            audit,
        }
    }

    pub async fn submit_report(
        &self,
        reporter: &Principal,
        request: CreateReportRequest,
    ) -> Result<Report, AppError> {
        request.validate()?;
        if request.explanation.trim().is_empty() {
            return Err(AppError::Validation("explanation must not be blank".to_string()));
        }

        let content = self.directory.require_content(request.target).await?;
        let now = Utc::now();

        let report = Report {
            id: Uuid::new_v4(),
            reporter_id: reporter.user_id,
            reported_member_id: content.owner_id,
            target: request.target,
            category: request.category,
            explanation: request.explanation,
            priority: ReportPriority::from(request.category),
            status: ReportStatus::Pending,
            resolution_notes: None,
            assigned_moderator_id: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };

        self.store.write().await.insert_report(report.clone());

        tracing::info!(
            "Report {} filed by {} against {} ({:?}, {:?} priority)",
            report.id, report.reporter_id, report.target, report.category, report.priority
        );

        Ok(report)
    }

    /// Moves a pending report to its terminal status.
    pub async fn resolve_report(
        &self,
        moderator: &Principal,
        report_id: Uuid,
        request: ResolveReportRequest,
    ) -> Result<Report, AppError> {
        ActingStaff::from_principal(moderator)?;
        request.validate()?;

        let report = {
            let mut state = self.store.write().await;
            let report = state.report_mut(report_id)?;

            if report.status.is_terminal() {
                tracing::warn!(
                    "Rejected resolution of report {}: already {:?}",
                    report_id, report.status
                );
                return Err(AppError::InvalidState(format!(
                    "Report {} is already {:?}",
                    report_id, report.status
                )));
            }

            let now = Utc::now();
            report.status = ReportStatus::from(request.outcome);
            report.resolution_notes = request.notes;
            report.assigned_moderator_id = Some(moderator.user_id);
            report.resolved_at = Some(now);
            report.updated_at = now;
            report.clone()
        };

        tracing::info!(
            "Report {} marked {:?} by {}",
            report.id, report.status, moderator.user_id
        );
        deliver(self.audit.as_ref(), AuditEvent::ReportResolved(report.clone())).await;

        Ok(report)
    }

    /// Visible to the reporter and to staff.
    pub async fn get_report(&self, viewer: &Principal, report_id: Uuid) -> Result<Report, AppError> {
        let state = self.store.read().await;
        let report = state.report(report_id)?;

        if !viewer.is_staff() && report.reporter_id != viewer.user_id {
            return Err(AppError::Forbidden("Cannot access another member's report".to_string()));
        }

        Ok(report.clone())
    }

    /// Staff queue: pending first, then by priority, oldest first.
    pub async fn list_reports(
        &self,
        viewer: &Principal,
        query: ReportQuery,
    ) -> Result<Page<Report>, AppError> {
        if !viewer.is_staff() {
            return Err(AppError::Forbidden("Only staff may list reports".to_string()));
        }

        let mut reports: Vec<Report> = {
            let state = self.store.read().await;
            state
                .reports()
                .filter(|r| query.status.map_or(true, |status| r.status == status))
                .cloned()
                .collect()
        };

        reports.sort_by(|a, b| {
            a.status
                .is_terminal()
                .cmp(&b.status.is_terminal())
                .then(b.priority.cmp(&a.priority))
                .then(a.created_at.cmp(&b.created_at))
        });

        tracing::debug!("Listing {} reports", reports.len());
        Ok(Page::from_vec(reports, PageRequest::new(query.page, query.per_page)))
    }
}
