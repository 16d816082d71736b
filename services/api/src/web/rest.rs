//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints. Every handler answers
//! with the same `{ success, data?, error? }` envelope; internal failure details
//! are logged and never returned to the client.

use crate::web::{middleware::CurrentUser, state::AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use matching_core::{Interaction, NearbyUser, PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The envelope wrapped around every REST response.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Body of a create-like / create-dislike request.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TargetRequest {
    pub user_id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NearbyQuery {
    pub radius_km: Option<f64>,
}

/// A like or dislike edge as returned to clients.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub id: Uuid,
    pub kind: &'static str,
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Interaction> for InteractionResponse {
    fn from(edge: Interaction) -> Self {
        Self {
            id: edge.id,
            kind: edge.kind.as_str(),
            user_id: edge.actor_id,
            target_user_id: edge.target_id,
            created_at: edge.created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NearbyUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub lat: f64,
    pub lon: f64,
    pub images: Vec<String>,
    pub distance_km: f64,
}

impl From<NearbyUser> for NearbyUserResponse {
    fn from(nearby: NearbyUser) -> Self {
        let user = nearby.user;
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            lat: user.position.latitude,
            lon: user.position.longitude,
            images: user.images,
            distance_km: nearby.distance_km,
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a core error onto a status code and the failure envelope.
pub fn error_response(err: PortError) -> (StatusCode, Json<ApiResponse<()>>) {
    let (status, message) = match err {
        PortError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Internal(msg) => {
            error!("Internal error while handling request: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
}

fn respond<T: Serialize>(status: StatusCode, result: PortResult<T>) -> Response {
    match result {
        Ok(data) => (status, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

fn body_error(rejection: JsonRejection) -> PortError {
    PortError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// POST /likes - like another user and notify them if they are connected.
pub async fn create_like_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Result<Json<TargetRequest>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(req)) => state
            .gateway
            .like(user.id, req.user_id.as_deref())
            .await
            .map(InteractionResponse::from),
        Err(rejection) => Err(body_error(rejection)),
    };
    respond(StatusCode::CREATED, result)
}

/// GET /likes - the caller's likes, newest first.
pub async fn list_likes_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let result = state
        .gateway
        .likes_of(user.id)
        .await
        .map(|edges| edges.into_iter().map(InteractionResponse::from).collect::<Vec<_>>());
    respond(StatusCode::OK, result)
}

/// DELETE /likes/{id}
pub async fn delete_like_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(like_id): Path<String>,
) -> Response {
    let result = state.gateway.remove_like(user.id, Some(like_id.as_str())).await;
    respond(StatusCode::OK, result)
}

/// POST /dislikes - dislike another user. A repeat dislike is a 409.
pub async fn create_dislike_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Result<Json<TargetRequest>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(req)) => state
            .gateway
            .dislike(user.id, req.user_id.as_deref())
            .await
            .map(InteractionResponse::from),
        Err(rejection) => Err(body_error(rejection)),
    };
    respond(StatusCode::CREATED, result)
}

/// GET /dislikes - the caller's dislikes, newest first.
pub async fn list_dislikes_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let result = state
        .gateway
        .dislikes_of(user.id)
        .await
        .map(|edges| edges.into_iter().map(InteractionResponse::from).collect::<Vec<_>>());
    respond(StatusCode::OK, result)
}

/// DELETE /dislikes/{id}
pub async fn delete_dislike_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(dislike_id): Path<String>,
) -> Response {
    let result = state.gateway.remove_dislike(user.id, Some(dislike_id.as_str())).await;
    respond(StatusCode::OK, result)
}

/// GET /users/nearby - users within `radius_km` (or the configured default)
/// of the caller, nearest first.
pub async fn find_nearby_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(q)) => state
            .proximity
            .find_nearby(user.id, q.radius_km)
            .await
            .map(|found| found.into_iter().map(NearbyUserResponse::from).collect::<Vec<_>>()),
        Err(rejection) => Err(PortError::InvalidInput(format!(
            "Invalid query: {}",
            rejection.body_text()
        ))),
    };
    respond(StatusCode::OK, result)
}
