pub mod analytics;
pub mod appeals;
pub mod audit;
pub mod config;
pub mod directory;
pub mod handlers;
pub mod models;
pub mod moderation_engine;
pub mod policy;
pub mod reporting;
pub mod reputation;
pub mod routes;
pub mod store;
pub mod suspensions;

use std::sync::Arc;

use axum::extract::FromRef;

use boardkeeper_auth::JwtService;

use crate::analytics::ModerationAnalytics;
use crate::appeals::AppealService;
use crate::audit::AuditSink;
use crate::config::ModerationConfig;
use crate::directory::Directory;
use crate::moderation_engine::ModerationEngine;
use crate::policy::SuspensionPolicy;
use crate::reporting::ReportingService;
use crate::reputation::ReputationService;
use crate::store::ModerationStore;
use crate::suspensions::SuspensionService;

#[derive(Clone)]
pub struct AppState {
    pub config: ModerationConfig,
    pub jwt_service: JwtService,
    pub reporting_service: ReportingService,
    pub moderation_engine: ModerationEngine,
    pub suspension_service: SuspensionService,
    pub appeal_service: AppealService,
    pub reputation_service: ReputationService,
    pub analytics: ModerationAnalytics,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    /// Wires every service over one shared store.
    pub fn new(
        config: ModerationConfig,
        directory: Arc<dyn Directory>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let store = ModerationStore::new();
        let rules = &config.rules;

        let reputation_service = ReputationService::new(
            directory.clone(),
            audit.clone(),
            rules.weights,
            rules.downvote_threshold,
        );
        let moderation_engine = ModerationEngine::new(
            store.clone(),
            directory.clone(),
            audit.clone(),
            reputation_service.clone(),
            rules.min_reason_length,
        );
        let suspension_service = SuspensionService::new(
            store.clone(),
            directory.clone(),
            audit.clone(),
            SuspensionPolicy::from(&config.suspension_policy),
        );
        let appeal_service = AppealService::new(store.clone(), audit.clone(), moderation_engine.clone());
        let reporting_service = ReportingService::new(store.clone(), directory, audit.clone());
        let analytics = ModerationAnalytics::new(store, reputation_service.clone());

        Self {
            jwt_service: JwtService::new(&config.jwt),
            config,
            reporting_service,
            moderation_engine,
            suspension_service,
            appeal_service,
            reputation_service,
            analytics,
            audit,
        }
    }
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_service.clone()
    }
}
