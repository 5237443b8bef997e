use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::invoicemodel::{InvoiceDetail, PaymentStatus};
use crate::utils::money::format_amount;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InvoiceQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct MarkPaidDto {
    #[validate(length(min = 1, max = 30, message = "Payment method cannot be empty"))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceSummaryDto {
    pub id: uuid::Uuid,
    pub rental_id: uuid::Uuid,
    pub tenant_name: String,
    pub room_number: String,
    pub property_name: String,
    pub rent_amount: String,
    pub utility_amount: String,
    pub amount_due: String,
    pub due_date: chrono::NaiveDate,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
}

impl InvoiceSummaryDto {
    pub fn from_detail(detail: &InvoiceDetail) -> Self {
        let invoice = &detail.invoice;
        Self {
            id: invoice.id,
            rental_id: invoice.rental_id,
            tenant_name: detail.tenant_name.clone(),
            room_number: detail.room_number.clone(),
            property_name: detail.property_name.clone(),
            rent_amount: format_amount(&invoice.rent_amount),
            utility_amount: format_amount(&invoice.utility_amount),
            amount_due: format_amount(&invoice.amount_due),
            due_date: invoice.due_date,
            payment_status: invoice.payment_status,
            payment_method: invoice.payment_method.clone(),
        }
    }

    pub fn from_details(details: &[InvoiceDetail]) -> Vec<Self> {
        details.iter().map(Self::from_detail).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceListResponseDto {
    pub status: String,
    pub invoices: Vec<InvoiceSummaryDto>,
    pub page: u32,
    pub limit: usize,
}
