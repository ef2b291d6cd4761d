use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use boardkeeper_auth::AuthenticatedUser;
use boardkeeper_common::{ApiResponse, AppError, Page, Role};

use crate::{
    appeals::AppealQuery,
    models::{
        ActionQuery, AppealView, CreateActionRequest, CreateReportRequest,
        CreateSuspensionRequest, LiftSuspensionRequest, MemberStanding, ModerationActionView,
        ModerationStats, PenaltyEntry, PenaltyRequest, RecordVoteRequest, Report, ReportQuery,
        ReputationRecord, ResolveReportRequest, ReviewAppealRequest, SubmitAppealRequest,
        SuspensionQuery, SuspensionView, VoteOutcome,
    },
    AppState,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

// Reports
pub async fn submit_report(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<CreateReportRequest>,
) -> ApiResult<Report> {
    let report = state.reporting_service.submit_report(&principal, request).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn list_reports(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Page<Report>> {
    let reports = state.reporting_service.list_reports(&principal, query).await?;
    Ok(Json(ApiResponse::success(reports)))
}

pub async fn get_report(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Report> {
    let report = state.reporting_service.get_report(&principal, report_id).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn resolve_report(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(report_id): Path<Uuid>,
    Json(request): Json<ResolveReportRequest>,
) -> ApiResult<Report> {
    let report = state
        .reporting_service
        .resolve_report(&principal, report_id, request)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

// Moderation actions
pub async fn execute_moderation_action(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<CreateActionRequest>,
) -> ApiResult<ModerationActionView> {
    let action = state
        .moderation_engine
        .execute_moderation_action(&principal, request)
        .await?;
    Ok(Json(ApiResponse::success(action)))
}

pub async fn list_actions(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<ActionQuery>,
) -> ApiResult<Page<ModerationActionView>> {
    let actions = state.moderation_engine.list_actions(&principal, query).await?;
    Ok(Json(ApiResponse::success(actions)))
}

pub async fn get_action(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(action_id): Path<Uuid>,
) -> ApiResult<ModerationActionView> {
    let action = state.moderation_engine.get_action(&principal, action_id).await?;
    Ok(Json(ApiResponse::success(action)))
}

// Suspensions
pub async fn create_suspension(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<CreateSuspensionRequest>,
) -> ApiResult<SuspensionView> {
    let suspension = state
        .suspension_service
        .create_suspension(&principal, request)
        .await?;
    Ok(Json(ApiResponse::success(suspension)))
}

pub async fn get_suspension(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(suspension_id): Path<Uuid>,
) -> ApiResult<SuspensionView> {
    let suspension = state
        .suspension_service
        .get_suspension(&principal, suspension_id)
        .await?;
    Ok(Json(ApiResponse::success(suspension)))
}

pub async fn lift_suspension(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(suspension_id): Path<Uuid>,
    Json(request): Json<LiftSuspensionRequest>,
) -> ApiResult<SuspensionView> {
    request.validate()?;
    let suspension = state
        .suspension_service
        .lift_early(&principal, suspension_id, &request.reason)
        .await?;
    Ok(Json(ApiResponse::success(suspension)))
}

pub async fn list_member_suspensions(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
    Query(query): Query<SuspensionQuery>,
) -> ApiResult<Vec<SuspensionView>> {
    let suspensions = state
        .suspension_service
        .list_for_member(&principal, member_id, query)
        .await?;
    Ok(Json(ApiResponse::success(suspensions)))
}

// Appeals
pub async fn submit_appeal(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<SubmitAppealRequest>,
) -> ApiResult<AppealView> {
    let appeal = state.appeal_service.submit_appeal(&principal, request).await?;
    Ok(Json(ApiResponse::success(appeal)))
}

pub async fn list_appeals(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<AppealQuery>,
) -> ApiResult<Page<AppealView>> {
    let appeals = state.appeal_service.list_appeals(&principal, query).await?;
    Ok(Json(ApiResponse::success(appeals)))
}

pub async fn get_appeal(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(appeal_id): Path<Uuid>,
) -> ApiResult<AppealView> {
    let appeal = state.appeal_service.get_appeal(&principal, appeal_id).await?;
    Ok(Json(ApiResponse::success(appeal)))
}

pub async fn review_appeal(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(appeal_id): Path<Uuid>,
    Json(request): Json<ReviewAppealRequest>,
) -> ApiResult<AppealView> {
    let appeal = state
        .appeal_service
        .review_appeal(&principal, appeal_id, request)
        .await?;
    Ok(Json(ApiResponse::success(appeal)))
}

pub async fn escalate_appeal(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(appeal_id): Path<Uuid>,
) -> ApiResult<AppealView> {
    let appeal = state.appeal_service.escalate(&principal, appeal_id).await?;
    Ok(Json(ApiResponse::success(appeal)))
}

// Reputation
pub async fn record_vote(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<RecordVoteRequest>,
) -> ApiResult<VoteOutcome> {
    let outcome = state.reputation_service.record_vote(&principal, request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn get_reputation(
    State(state): State<AppState>,
    AuthenticatedUser(_principal): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
) -> ApiResult<ReputationRecord> {
    let record = state.reputation_service.get_reputation(member_id).await;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn list_penalties(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Vec<PenaltyEntry>> {
    if !principal.is_staff() && principal.user_id != member_id {
        return Err(AppError::Forbidden("Cannot access another member's penalties".to_string()));
    }

    let penalties = state.reputation_service.penalties(member_id).await;
    Ok(Json(ApiResponse::success(penalties)))
}

pub async fn apply_penalty(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
    Json(request): Json<PenaltyRequest>,
) -> ApiResult<ReputationRecord> {
    let record = state
        .reputation_service
        .apply_penalty(&principal, member_id, request)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn recompute_reputation(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
) -> ApiResult<ReputationRecord> {
    if principal.role != Role::Administrator {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }

    let record = state.reputation_service.recompute(member_id).await;
    Ok(Json(ApiResponse::success(record)))
}

// Standing and analytics
pub async fn get_member_standing(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
) -> ApiResult<MemberStanding> {
    let standing = state.analytics.member_standing(&principal, member_id).await?;
    Ok(Json(ApiResponse::success(standing)))
}

pub async fn get_moderation_stats(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> ApiResult<ModerationStats> {
    let stats = state.analytics.moderation_stats(&principal).await?;
    Ok(Json(ApiResponse::success(stats)))
}

// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<String> {
    if let Err(e) = state.audit.health_check().await {
        tracing::error!("Audit sink health check failed: {}", e);
        return Err(e);
    }
    Ok(Json(ApiResponse::success("Moderation service is healthy".to_string())))
}
