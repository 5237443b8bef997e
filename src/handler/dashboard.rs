use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};
use chrono::Utc;
use serde_json::json;

use crate::{
    db::dashboarddb::DashboardExt,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::usermodel::UserRole,
    AppState,
};

pub fn dashboard_handler() -> Router {
    Router::new().route("/", get(get_dashboard))
}

/// Summary figures for the caller's role.
pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let db = &app_state.db_client;

    let stats = match user.user.role {
        UserRole::Admin => db.get_admin_stats().await.map(|s| json!(s)),
        UserRole::Landlord => db.get_landlord_stats(user.user.id).await.map(|s| json!(s)),
        UserRole::Tenant => db
            .get_tenant_stats(user.user.id, Utc::now().date_naive())
            .await
            .map(|s| json!(s)),
    }
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "role": user.user.role.to_str(),
            "stats": stats,
        }
    })))
}
