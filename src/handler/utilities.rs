use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::utilitydb::UtilityExt,
    dtos::utilitydtos::{CreatePriceDto, CreateUtilityDto},
    error::HttpError,
    middleware::require_permission,
    models::rolemodel::permissions,
    AppState,
};

pub fn utilities_handler() -> Router {
    let manage_routes = Router::new()
        .route("/", post(create_utility))
        .route("/:utility_id/prices", post(add_price))
        .layer(middleware::from_fn(|state, req, next| {
            require_permission(state, req, next, permissions::MANAGE_UTILITIES)
        }));

    Router::new()
        .route("/", get(get_utilities))
        .route("/:utility_id/prices", get(get_prices))
        .merge(manage_routes)
}

pub async fn get_utilities(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let utilities = app_state
        .db_client
        .get_utilities()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": utilities })))
}

pub async fn create_utility(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateUtilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let utility = app_state
        .db_client
        .create_utility(body.name.trim().to_string(), body.unit.trim().to_string())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::unique_constraint_violation("Utility already exists")
            }
            e => HttpError::server_error(e.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": utility }))))
}

pub async fn get_prices(
    Path(utility_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let utility = app_state
        .db_client
        .get_utility(utility_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Utility not found"))?;

    let prices = app_state
        .db_client
        .get_utility_prices(utility.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "utility": utility, "prices": prices }
    })))
}

pub async fn add_price(
    Path(utility_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreatePriceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    app_state
        .db_client
        .get_utility(utility_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Utility not found"))?;

    let price = app_state
        .db_client
        .add_utility_price(utility_id, body.price, body.effective_date)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(
        "Price {} for utility {} effective {}",
        price.price,
        utility_id,
        price.effective_date
    );

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": price }))))
}
