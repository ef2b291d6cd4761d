use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use boardkeeper_common::ApiResponse;

use crate::{handlers, AppState};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Reporting endpoints
        .route("/reports", post(handlers::submit_report).get(handlers::list_reports))
        .route("/reports/:id", get(handlers::get_report))
        .route("/reports/:id/resolve", post(handlers::resolve_report))

        // Moderation action ledger
        .route(
            "/moderation/actions",
            post(handlers::execute_moderation_action).get(handlers::list_actions),
        )
        .route("/moderation/actions/:id", get(handlers::get_action))

        // Suspensions
        .route("/suspensions", post(handlers::create_suspension))
        .route("/suspensions/:id", get(handlers::get_suspension))
        .route("/suspensions/:id/lift", post(handlers::lift_suspension))

        // Appeals
        .route("/appeals", post(handlers::submit_appeal).get(handlers::list_appeals))
        .route("/appeals/:id", get(handlers::get_appeal))
        .route("/appeals/:id/review", post(handlers::review_appeal))
        .route("/appeals/:id/escalate", post(handlers::escalate_appeal))

        // Reputation
        .route("/votes", post(handlers::record_vote))

        // Member views
        .route("/members/:id/suspensions", get(handlers::list_member_suspensions))
        .route("/members/:id/reputation", get(handlers::get_reputation))
        .route(
            "/members/:id/reputation/penalties",
            get(handlers::list_penalties).post(handlers::apply_penalty),
        )
        .route("/members/:id/reputation/recompute", post(handlers::recompute_reputation))
        .route("/members/:id/standing", get(handlers::get_member_standing))

        // Analytics endpoints
        .route("/analytics", get(handlers::get_moderation_stats))
}

pub async fn handler_404() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}
