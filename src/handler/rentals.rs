use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{rentaldb::RentalExt, userdb::UserExt},
    dtos::propertydtos::{CreateRentalDto, EndRentalDto, RentalFilterDto},
    error::HttpError,
    handler::properties::{ensure_owner, load_owned_room},
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn rentals_handler() -> Router {
    let landlord_routes = Router::new()
        .route("/", get(get_rentals).post(create_rental))
        .route("/:rental_id/end", put(end_rental))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Landlord, UserRole::Admin])
        }));

    let tenant_routes = Router::new()
        .route("/mine", get(get_my_rentals))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Tenant])
        }));

    Router::new().merge(landlord_routes).merge(tenant_routes)
}

pub async fn get_rentals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let rentals = app_state
        .db_client
        .get_rentals_by_landlord(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data: Vec<RentalFilterDto> = rentals.iter().map(RentalFilterDto::from_detail).collect();

    Ok(Json(json!({ "status": "success", "data": data })))
}

pub async fn create_rental(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateRentalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;
    body.validate_dates()
        .map_err(|e| HttpError::unprocessable(e.message.map(|m| m.to_string()).unwrap_or_default()))?;

    let (room, _) = load_owned_room(&app_state, &user.user, body.room_id).await?;
    if !room.is_available {
        return Err(HttpError::unique_constraint_violation("Room is already rented"));
    }

    let tenant = app_state
        .db_client
        .get_user(Some(body.tenant_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Tenant not found"))?;

    if tenant.role != UserRole::Tenant {
        return Err(HttpError::unprocessable("Rentals can only be assigned to tenant accounts"));
    }

    let rental = app_state
        .db_client
        .create_rental(room.id, tenant.id, body.start_date, body.end_date)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("Rental {} created for room {} and tenant {}", rental.id, room.id, tenant.id);

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": rental }))))
}

pub async fn end_rental(
    Path(rental_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<EndRentalDto>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state
        .db_client
        .get_rental_detail(rental_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Rental not found"))?;

    ensure_owner(&user.user, detail.landlord_id)?;

    let end_date = body.end_date.unwrap_or_else(|| Utc::now().date_naive());
    if end_date < detail.start_date {
        return Err(HttpError::unprocessable("End date cannot be before start date"));
    }

    let rental = app_state
        .db_client
        .end_rental(rental_id, end_date)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": rental })))
}

pub async fn get_my_rentals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let rentals = app_state
        .db_client
        .get_rentals_by_tenant(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data: Vec<RentalFilterDto> = rentals.iter().map(RentalFilterDto::from_detail).collect();

    Ok(Json(json!({ "status": "success", "data": data })))
}
