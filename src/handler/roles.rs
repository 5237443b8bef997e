use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{roledb::RoleExt, userdb::UserExt},
    dtos::{
        roledtos::{CreatePermissionDto, CreateRoleDto, SetPermissionsDto, SetUserRolesDto},
        userdtos::Response,
    },
    error::HttpError,
    middleware::require_permission,
    models::rolemodel::permissions,
    AppState,
};

/// Role membership of one user, mounted under `/users`.
pub fn user_roles_handler() -> Router {
    Router::new()
        .route("/:user_id/roles", get(get_user_roles).put(set_user_roles))
        .layer(middleware::from_fn(|state, req, next| {
            require_permission(state, req, next, permissions::MANAGE_ROLES)
        }))
}

fn map_write_error(e: sqlx::Error, what: &str) -> HttpError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            HttpError::unique_constraint_violation(format!("{} already exists", what))
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            HttpError::unprocessable(format!("{} references an unknown id", what))
        }
        e => HttpError::server_error(e.to_string()),
    }
}

/// Role and permission administration, mounted at the API root.
pub fn roles_handler() -> Router {
    Router::new()
        .route("/roles", get(get_roles).post(create_role))
        .route("/roles/:role_id", delete(delete_role))
        .route(
            "/roles/:role_id/permissions",
            get(get_role_permissions).put(set_role_permissions),
        )
        .route("/permissions", get(get_permissions).post(create_permission))
        .route("/permissions/:permission_id", delete(delete_permission))
        .layer(middleware::from_fn(|state, req, next| {
            require_permission(state, req, next, permissions::MANAGE_ROLES)
        }))
}

pub async fn get_roles(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let roles = app_state
        .db_client
        .get_roles()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": roles })))
}

pub async fn create_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateRoleDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let role = app_state
        .db_client
        .create_role(body.name.trim().to_lowercase(), body.description)
        .await
        .map_err(|e| map_write_error(e, "Role"))?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": role }))))
}

pub async fn delete_role(
    Path(role_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let role = app_state
        .db_client
        .get_role(role_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Role not found"))?;

    if matches!(role.name.as_str(), "admin" | "landlord" | "tenant") {
        return Err(HttpError::bad_request("Built-in roles cannot be deleted"));
    }

    app_state
        .db_client
        .delete_role(role_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state.permission_service.clear_all().await;

    Ok(Json(Response {
        status: "success",
        message: format!("Role {} deleted", role.name),
    }))
}

pub async fn get_role_permissions(
    Path(role_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let perms = app_state
        .db_client
        .get_role_permissions(role_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": perms })))
}

pub async fn set_role_permissions(
    Path(role_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SetPermissionsDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    app_state
        .db_client
        .get_role(role_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Role not found"))?;

    let perms = app_state
        .db_client
        .set_role_permissions(role_id, &body.permission_ids)
        .await
        .map_err(|e| map_write_error(e, "Permission"))?;

    // Every member of the role may now hold a stale set.
    app_state.permission_service.clear_all().await;

    Ok(Json(json!({ "status": "success", "data": perms })))
}

pub async fn get_permissions(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let perms = app_state
        .db_client
        .get_permissions()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": perms })))
}

pub async fn create_permission(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreatePermissionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let permission = app_state
        .db_client
        .create_permission(body.name.trim().to_lowercase(), body.description)
        .await
        .map_err(|e| map_write_error(e, "Permission"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": permission })),
    ))
}

pub async fn delete_permission(
    Path(permission_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_permission(permission_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !deleted {
        return Err(HttpError::not_found("Permission not found"));
    }

    app_state.permission_service.clear_all().await;

    Ok(Json(Response {
        status: "success",
        message: "Permission deleted".to_string(),
    }))
}

pub async fn get_user_roles(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let roles = app_state
        .db_client
        .get_user_roles(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": roles })))
}

pub async fn set_user_roles(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SetUserRolesDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    let roles = app_state
        .db_client
        .set_user_roles(user_id, &body.role_ids)
        .await
        .map_err(|e| map_write_error(e, "Role"))?;

    app_state.permission_service.clear(user_id).await;

    Ok(Json(json!({ "status": "success", "data": roles })))
}
