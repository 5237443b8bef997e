use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::utilitydtos::{ReadingReceiptDto, SubmitReadingsDto, UsageDto},
    error::HttpError,
    middleware::{require_permission, JWTAuthMiddeware},
    models::{rolemodel::permissions, usermodel::UserRole},
    service::reading_service::{ReadingService, SubmitReadings},
    utils::money::format_amount,
    AppState,
};

pub fn readings_handler() -> Router {
    Router::new()
        .route("/", post(submit_readings))
        .layer(middleware::from_fn(|state, req, next| {
            require_permission(state, req, next, permissions::SUBMIT_READINGS)
        }))
}

/// Turns a set of meter readings into usage rows plus one invoice for the
/// room's current tenant.
pub async fn submit_readings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitReadingsDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let today = Utc::now().date_naive();
    let owner_id = (user.user.role != UserRole::Admin).then_some(user.user.id);

    let service = ReadingService::new(app_state.db_client.clone());
    let receipt = service
        .submit_readings(
            SubmitReadings {
                room_id: body.room_id,
                readings: body.readings,
                reading_date: body.reading_date.unwrap_or(today),
                payment_method: body.payment_method,
                owner_id,
            },
            today,
        )
        .await?;

    let notifications = app_state.notification_service.clone();
    let invoice_id = receipt.invoice.id;
    tokio::spawn(async move {
        if let Err(e) = notifications.notify_invoice_generated(invoice_id).await {
            tracing::error!("Failed to notify tenant about invoice {}: {}", invoice_id, e);
        }
    });

    let amount_due = format_amount(&receipt.invoice.amount_due);
    let data = ReadingReceiptDto {
        usages: UsageDto::from_usages(&receipt.usages),
        utility_total: format_amount(&receipt.utility_total),
        amount_due,
        invoice: receipt.invoice,
    };

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": data }))))
}
