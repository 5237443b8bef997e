use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{messagedb::MessageExt, rentaldb::RentalExt, userdb::UserExt},
    dtos::messagedtos::{ConversationQueryDto, SendMessageDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::usermodel::{User, UserRole},
    AppState,
};

pub fn messages_handler() -> Router {
    Router::new()
        .route("/", get(get_inbox).post(send_message))
        .route("/unread", get(get_unread_count))
        .route("/:user_id", get(get_conversation))
        .route("/:user_id/read", put(mark_read))
}

/// Strips markup from a message body. Returns `None` when nothing is left.
fn sanitize_body(body: &str) -> Option<String> {
    let cleaned = ammonia::clean(body.trim());
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Landlords and tenants may only talk across a rental they share.
/// Admins can reach and be reached by anyone.
async fn may_message(app_state: &AppState, sender: &User, recipient: &User) -> Result<bool, HttpError> {
    if sender.role == UserRole::Admin || recipient.role == UserRole::Admin {
        return Ok(true);
    }

    app_state
        .db_client
        .share_tenancy(sender.id, recipient.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    if body.recipient_id == user.user.id {
        return Err(HttpError::bad_request("You cannot message yourself"));
    }

    let text = sanitize_body(&body.body)
        .ok_or_else(|| HttpError::bad_request("Message cannot be empty"))?;

    let recipient = app_state
        .db_client
        .get_user(Some(body.recipient_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Recipient not found"))?;

    if !may_message(&app_state, &user.user, &recipient).await? {
        return Err(HttpError::forbidden(
            "You can only message people you share a rental with",
        ));
    }

    let message = app_state
        .db_client
        .send_message(user.user.id, recipient.id, text)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": message }))))
}

pub async fn get_inbox(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let conversations = app_state
        .db_client
        .get_inbox(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": conversations })))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread = app_state
        .db_client
        .get_unread_count(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": { "unread": unread } })))
}

pub async fn get_conversation(
    Path(other_id): Path<Uuid>,
    Query(query_params): Query<ConversationQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(HttpError::validation)?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(50);
    let offset = (page as i64 - 1) * limit as i64;

    let messages = app_state
        .db_client
        .get_conversation(user.user.id, other_id, limit as i64, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": messages,
        "page": page,
        "limit": limit,
    })))
}

pub async fn mark_read(
    Path(other_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .db_client
        .mark_conversation_read(user.user.id, other_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": { "updated": updated } })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_from_messages() {
        let cleaned = sanitize_body("Hi <script>alert(1)</script><b>there</b>").unwrap();
        assert!(!cleaned.contains("<script>"));
        assert!(cleaned.contains("there"));
    }

    #[test]
    fn markup_only_messages_are_empty() {
        assert_eq!(sanitize_body("  <script>x</script> "), None);
        assert_eq!(sanitize_body("   "), None);
    }
}
