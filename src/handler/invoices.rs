use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::invoicedb::{InvoiceExt, InvoiceScope},
    dtos::invoicedtos::{InvoiceListResponseDto, InvoiceQueryDto, InvoiceSummaryDto, MarkPaidDto},
    error::{ErrorMessage, HttpError},
    handler::properties::ensure_owner,
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        invoicemodel::{Invoice, InvoiceDetail, PaymentStatus},
        usermodel::{User, UserRole},
    },
    AppState,
};

pub fn invoices_handler() -> Router {
    let landlord_routes = Router::new()
        .route("/:invoice_id/pay", put(mark_paid))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Landlord, UserRole::Admin])
        }));

    Router::new()
        .route("/", get(get_invoices))
        .route("/:invoice_id", get(get_invoice))
        .merge(landlord_routes)
}

fn scope_for(user: &User) -> InvoiceScope {
    match user.role {
        UserRole::Admin => InvoiceScope::All,
        UserRole::Landlord => InvoiceScope::Landlord(user.id),
        UserRole::Tenant => InvoiceScope::Tenant(user.id),
    }
}

fn can_view(user: &User, detail: &InvoiceDetail) -> bool {
    user.role == UserRole::Admin || user.id == detail.tenant_id || user.id == detail.landlord_id
}

/// The UPDATE only matches unpaid rows, so a missing row means a concurrent
/// request already settled the invoice.
fn paid_or_conflict(updated: Option<Invoice>) -> Result<Invoice, HttpError> {
    updated.ok_or_else(already_paid)
}

fn already_paid() -> HttpError {
    HttpError::unique_constraint_violation("Invoice is already paid")
}

async fn load_invoice(app_state: &AppState, invoice_id: Uuid) -> Result<InvoiceDetail, HttpError> {
    app_state
        .db_client
        .get_invoice_detail(invoice_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Invoice not found"))
}

pub async fn get_invoices(
    Query(query_params): Query<InvoiceQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(HttpError::validation)?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let invoices = app_state
        .db_client
        .get_invoices(scope_for(&user.user), query_params.status, page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(InvoiceListResponseDto {
        status: "success".to_string(),
        invoices: InvoiceSummaryDto::from_details(&invoices),
        page,
        limit,
    }))
}

pub async fn get_invoice(
    Path(invoice_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = load_invoice(&app_state, invoice_id).await?;

    if !can_view(&user.user, &detail) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(Json(json!({ "status": "success", "data": detail })))
}

pub async fn mark_paid(
    Path(invoice_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    body: Option<Json<MarkPaidDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate().map_err(HttpError::validation)?;

    let mut detail = load_invoice(&app_state, invoice_id).await?;
    ensure_owner(&user.user, detail.landlord_id)?;

    if detail.invoice.payment_status == PaymentStatus::Paid {
        return Err(already_paid());
    }

    let updated = app_state
        .db_client
        .mark_invoice_paid(invoice_id, body.payment_method)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    let invoice = paid_or_conflict(updated)?;

    tracing::info!("Invoice {} marked paid by {}", invoice.id, user.user.id);
    detail.invoice = invoice;

    if let Err(e) = app_state.notification_service.notify_invoice_paid(&detail).await {
        tracing::error!("Failed to notify tenant about payment of {}: {}", invoice_id, e);
    }

    Ok(Json(json!({
        "status": "success",
        "data": InvoiceSummaryDto::from_detail(&detail),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, Utc};

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Jo".into(),
            email: "jo@example.com".into(),
            password: String::new(),
            phone: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn detail(tenant_id: Uuid, landlord_id: Uuid) -> InvoiceDetail {
        InvoiceDetail {
            invoice: Invoice {
                id: Uuid::new_v4(),
                rental_id: Uuid::new_v4(),
                rent_amount: BigDecimal::from(500),
                utility_amount: BigDecimal::from(45),
                amount_due: BigDecimal::from(545),
                due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                paid: false,
                payment_status: PaymentStatus::Pending,
                payment_method: "cash".into(),
                paid_at: None,
                created_at: Utc::now(),
            },
            tenant_id,
            tenant_name: "Tess".into(),
            tenant_email: "tess@example.com".into(),
            landlord_id,
            room_id: Uuid::new_v4(),
            room_number: "A1".into(),
            property_name: "Elm House".into(),
        }
    }

    #[test]
    fn listing_scope_follows_role() {
        let tenant = user(UserRole::Tenant);
        assert!(matches!(scope_for(&tenant), InvoiceScope::Tenant(id) if id == tenant.id));

        let landlord = user(UserRole::Landlord);
        assert!(matches!(scope_for(&landlord), InvoiceScope::Landlord(id) if id == landlord.id));

        assert!(matches!(scope_for(&user(UserRole::Admin)), InvoiceScope::All));
    }

    #[test]
    fn only_parties_and_admins_see_an_invoice() {
        let tenant = user(UserRole::Tenant);
        let landlord = user(UserRole::Landlord);
        let invoice = detail(tenant.id, landlord.id);

        assert!(can_view(&tenant, &invoice));
        assert!(can_view(&landlord, &invoice));
        assert!(can_view(&user(UserRole::Admin), &invoice));
        assert!(!can_view(&user(UserRole::Tenant), &invoice));
        assert!(!can_view(&user(UserRole::Landlord), &invoice));
    }

    #[test]
    fn settling_an_already_paid_invoice_conflicts() {
        let err = paid_or_conflict(None).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);

        let invoice = detail(Uuid::new_v4(), Uuid::new_v4()).invoice;
        let id = invoice.id;
        assert_eq!(paid_or_conflict(Some(invoice)).unwrap().id, id);
    }
}
