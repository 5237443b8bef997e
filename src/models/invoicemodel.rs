use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::BigDecimal, FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Invoice {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub rent_amount: BigDecimal,
    pub utility_amount: BigDecimal,
    pub amount_due: BigDecimal,
    pub due_date: NaiveDate,
    pub paid: bool,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Invoice produced by the generator, not yet persisted.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewInvoice {
    pub rental_id: Uuid,
    pub rent_amount: BigDecimal,
    pub utility_amount: BigDecimal,
    pub amount_due: BigDecimal,
    pub due_date: NaiveDate,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub paid: bool,
}

/// An invoice with the parties and room it bills.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct InvoiceDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub invoice: Invoice,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub tenant_email: String,
    pub landlord_id: Uuid,
    pub room_id: Uuid,
    pub room_number: String,
    pub property_name: String,
}
