// service/notification_service.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{invoicedb::InvoiceExt, notificationdb::NotificationExt, userdb::UserExt, DBClient},
    mail::{
        mails::{send_due_readings_email, send_invoice_email, InvoiceEmail},
        sendmail::Mailer,
    },
    models::{invoicemodel::InvoiceDetail, propertymodel::{Property, RentalDetail}},
    service::{due_reading_service::LandlordNotifier, error::ServiceError},
    utils::money::format_amount,
};

pub mod kinds {
    pub const DUE_READINGS: &str = "due_readings";
    pub const INVOICE_GENERATED: &str = "invoice_generated";
    pub const INVOICE_PAID: &str = "invoice_paid";
}

/// Stores in-app notifications and mirrors them by email.
#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
    mailer: Mailer,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>, mailer: Mailer) -> Self {
        Self { db_client, mailer }
    }

    /// Tells the tenant a new invoice is waiting. Mail failures are logged only.
    pub async fn notify_invoice_generated(&self, invoice_id: Uuid) -> Result<(), ServiceError> {
        let detail = self
            .db_client
            .get_invoice_detail(invoice_id)
            .await?
            .ok_or(ServiceError::InvoiceNotFound(invoice_id))?;
        let invoice = &detail.invoice;

        self.db_client
            .create_notification(
                detail.tenant_id,
                kinds::INVOICE_GENERATED,
                format!(
                    "New invoice of {} for room {} is due on {}",
                    format_amount(&invoice.amount_due),
                    detail.room_number,
                    invoice.due_date
                ),
                Some(serde_json::json!({
                    "invoice_id": invoice.id,
                    "rental_id": invoice.rental_id,
                    "amount_due": format_amount(&invoice.amount_due),
                    "due_date": invoice.due_date,
                })),
            )
            .await?;

        self.mail_invoice(&detail).await;
        Ok(())
    }

    /// Confirms to the tenant that their payment was recorded.
    pub async fn notify_invoice_paid(&self, detail: &InvoiceDetail) -> Result<(), ServiceError> {
        self.db_client
            .create_notification(
                detail.tenant_id,
                kinds::INVOICE_PAID,
                format!(
                    "Payment of {} for room {} was recorded",
                    format_amount(&detail.invoice.amount_due),
                    detail.room_number
                ),
                Some(serde_json::json!({ "invoice_id": detail.invoice.id })),
            )
            .await?;
        Ok(())
    }

    async fn mail_invoice(&self, detail: &InvoiceDetail) {
        let invoice = &detail.invoice;
        let email = InvoiceEmail {
            tenant_name: &detail.tenant_name,
            room_number: &detail.room_number,
            property_name: &detail.property_name,
            rent_amount: format_amount(&invoice.rent_amount),
            utility_amount: format_amount(&invoice.utility_amount),
            amount_due: format_amount(&invoice.amount_due),
            due_date: invoice.due_date.to_string(),
            payment_method: &invoice.payment_method,
        };

        if let Err(e) = send_invoice_email(&self.mailer, &detail.tenant_email, email).await {
            tracing::error!("Failed to email invoice {} to tenant: {}", invoice.id, e);
        }
    }
}

#[async_trait]
impl LandlordNotifier for NotificationService {
    async fn notify_due_readings(
        &self,
        property: &Property,
        due: &[RentalDetail],
    ) -> Result<(), ServiceError> {
        let rooms: Vec<String> = due.iter().map(|r| r.room_number.clone()).collect();
        let month = Utc::now().format("%B %Y").to_string();

        self.db_client
            .create_notification(
                property.landlord_id,
                kinds::DUE_READINGS,
                format!(
                    "{} room(s) at {} need meter readings for {}",
                    rooms.len(),
                    property.name,
                    month
                ),
                Some(serde_json::json!({
                    "property_id": property.id,
                    "rooms": rooms,
                    "rental_ids": due.iter().map(|r| r.rental_id).collect::<Vec<_>>(),
                })),
            )
            .await?;

        let landlord = self
            .db_client
            .get_user(Some(property.landlord_id), None)
            .await?
            .ok_or(ServiceError::UserNotFound(property.landlord_id))?;

        send_due_readings_email(
            &self.mailer,
            &landlord.email,
            &landlord.name,
            &property.name,
            &month,
            &rooms,
        )
        .await
        .map_err(|e| ServiceError::Notification(e.to_string()))
    }
}
