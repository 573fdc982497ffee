use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicationId, ApplicationSubmission, BankDetails, LoanStatus, NotificationId, ProfileUpdate,
    RegistrationForm, User, UserId,
};
use super::error::PortalError;
use super::service::LoanPortalService;

/// Header carrying the id of the user a request acts on behalf of.
pub const ACTING_USER_HEADER: &str = "x-user-id";

/// Optional `?q=` filter on the application list.
#[derive(Debug, Default, Deserialize)]
pub struct ApplicationQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: LoanStatus,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Router exposing the portal operations over HTTP.
pub fn portal_router(service: Arc<LoanPortalService>) -> Router {
    Router::new()
        .route("/api/v1/session", post(session_handler))
        .route(
            "/api/v1/applications",
            get(list_applications_handler).post(submit_handler),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(status_handler),
        )
        .route(
            "/api/v1/applications/:application_id/messages",
            post(message_handler),
        )
        .route(
            "/api/v1/applications/:application_id/bank-details",
            put(bank_details_handler),
        )
        .route(
            "/api/v1/applications/:application_id/analysis",
            get(analysis_handler),
        )
        .route("/api/v1/notifications", get(notifications_handler))
        .route("/api/v1/notifications/read-all", post(read_all_handler))
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(read_handler),
        )
        .route("/api/v1/users", get(users_handler).post(register_handler))
        .route("/api/v1/users/:user_id", put(profile_handler))
        .route("/api/v1/users/:user_id/trust-score", get(trust_score_handler))
        .route(
            "/api/v1/users/:user_id/bvn-verification",
            post(verify_bvn_handler),
        )
        .route("/api/v1/dashboard", get(dashboard_handler))
        .with_state(service)
}

/// HTTP rendering of a portal failure.
pub fn portal_error_response(error: &PortalError) -> Response {
    let status = match error {
        PortalError::NotFound(_) => StatusCode::NOT_FOUND,
        PortalError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        PortalError::InvalidTransition { .. } => StatusCode::CONFLICT,
        PortalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn unauthenticated(reason: &str) -> Response {
    let payload = json!({ "error": reason });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, PortalError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => portal_error_response(&error),
    }
}

fn acting_user(service: &LoanPortalService, headers: &HeaderMap) -> Result<User, Response> {
    let raw = headers
        .get(ACTING_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unauthenticated("missing x-user-id header"))?;

    service
        .user(&UserId::from(raw))
        .map_err(|_| unauthenticated("unknown acting user"))
}

pub(crate) async fn session_handler(
    State(service): State<Arc<LoanPortalService>>,
    Json(request): Json<SessionRequest>,
) -> Response {
    match service.login(&request.email) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(PortalError::NotFound(_)) => unauthenticated("no account for that e-mail address"),
        Err(other) => portal_error_response(&other),
    }
}

pub(crate) async fn list_applications_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Query(query): Query<ApplicationQuery>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let applications = match query.q {
        Some(term) => service.search_applications(&actor, &term),
        None => service.visible_applications(&actor),
    };
    (StatusCode::OK, Json(applications)).into_response()
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Json(submission): Json<ApplicationSubmission>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::CREATED,
        service.submit_application(&actor, submission),
    )
}

pub(crate) async fn application_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    respond(StatusCode::OK, service.application_for(&actor, &id))
}

pub(crate) async fn status_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<StatusChangeRequest>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    respond(
        StatusCode::OK,
        service.transition_status(&id, request.status, &actor),
    )
}

pub(crate) async fn message_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    respond(
        StatusCode::CREATED,
        service.send_message(&id, &actor, &request.content),
    )
}

pub(crate) async fn bank_details_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(details): Json<BankDetails>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    respond(
        StatusCode::OK,
        service.update_bank_details(&actor, &id, details),
    )
}

pub(crate) async fn analysis_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    respond(StatusCode::OK, service.analyze(&actor, &id))
}

pub(crate) async fn notifications_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let payload = json!({
        "unread": service.unread_count(&actor),
        "notifications": service.visible_notifications(&actor),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn read_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.mark_read(&NotificationId(notification_id), &actor) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => portal_error_response(&error),
    }
}

pub(crate) async fn read_all_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service
            .mark_all_read(&actor.id)
            .map(|changed| json!({ "marked_read": changed })),
    )
}

pub(crate) async fn register_handler(
    State(service): State<Arc<LoanPortalService>>,
    Json(form): Json<RegistrationForm>,
) -> Response {
    respond(StatusCode::CREATED, service.register(form))
}

pub(crate) async fn users_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    (StatusCode::OK, Json(service.visible_users(&actor))).into_response()
}

pub(crate) async fn profile_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.update_profile(&actor, &UserId(user_id), update),
    )
}

pub(crate) async fn trust_score_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let subject = UserId(user_id);
    if subject != actor.id && !actor.role.is_staff() {
        let error = PortalError::unauthorized("view another user's trust score", actor.role);
        return portal_error_response(&error);
    }
    respond(StatusCode::OK, service.trust_score(&subject))
}

pub(crate) async fn verify_bvn_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.verify_bvn(&actor, &UserId(user_id)))
}

pub(crate) async fn dashboard_handler(
    State(service): State<Arc<LoanPortalService>>,
    headers: HeaderMap,
) -> Response {
    let actor = match acting_user(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    (StatusCode::OK, Json(service.dashboard(&actor))).into_response()
}
