use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use boardkeeper_common::{AppError, RedisKeys, RedisService};

use crate::models::{AppealView, ModerationActionView, Report, SuspensionView};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum AuditEvent {
    ReportResolved(Report),
    ActionCreated(ModerationActionView),
    ActionReversed(ModerationActionView),
    SuspensionCreated(SuspensionView),
    SuspensionLifted(SuspensionView),
    AppealSubmitted(AppealView),
    AppealReviewed(AppealView),
    AppealEscalated(AppealView),
    ReputationPenalty {
        member_id: Uuid,
        delta: i64,
        moderation_action_id: Option<Uuid>,
        recorded_at: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::ReportResolved(_) => "report_resolved",
            AuditEvent::ActionCreated(_) => "action_created",
            AuditEvent::ActionReversed(_) => "action_reversed",
            AuditEvent::SuspensionCreated(_) => "suspension_created",
            AuditEvent::SuspensionLifted(_) => "suspension_lifted",
            AuditEvent::AppealSubmitted(_) => "appeal_submitted",
            AuditEvent::AppealReviewed(_) => "appeal_reviewed",
            AuditEvent::AppealEscalated(_) => "appeal_escalated",
            AuditEvent::ReputationPenalty { .. } => "reputation_penalty",
        }
    }
}

/// Receives a copy of every moderation decision for external audit.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn publish(&self, event: &AuditEvent) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Delivers an event after its transition has committed. Failures are logged
/// and swallowed so the transition itself always stands.
pub async fn deliver(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(e) = sink.publish(&event).await {
        tracing::warn!("Audit delivery of {} failed: {}", event.kind(), e);
    }
}

pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn publish(&self, _event: &AuditEvent) -> Result<(), AppError> {
        Ok(())
    }
}

pub struct RedisAuditSink {
    redis_service: RedisService,
    channel_prefix: String,
}

impl RedisAuditSink {
    pub fn new(redis_service: RedisService, channel_prefix: impl Into<String>) -> Self {
        Self {
            redis_service,
            channel_prefix: channel_prefix.into(),
        }
    }
}

#[async_trait]
impl AuditSink for RedisAuditSink {
    async fn publish(&self, event: &AuditEvent) -> Result<(), AppError> {
        let channel = RedisKeys::audit_channel(&self.channel_prefix, event.kind());
        self.redis_service.publish_json(&channel, event).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.redis_service.health_check().await
    }
}

/// Keeps every event in memory; used by tests and local runs.
#[derive(Clone, Default)]
pub struct RecordingAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(AuditEvent::kind).collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn publish(&self, event: &AuditEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .map_err(|_| AppError::Internal("Audit recorder lock poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
