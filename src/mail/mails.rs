// mail/mails.rs
use super::sendmail::{MailResult, Mailer};

const DUE_READINGS_TEMPLATE: &str = include_str!("templates/due-readings-email.html");
const INVOICE_TEMPLATE: &str = include_str!("templates/invoice-email.html");

pub async fn send_due_readings_email(
    mailer: &Mailer,
    to_email: &str,
    landlord_name: &str,
    property_name: &str,
    month: &str,
    rooms: &[String],
) -> MailResult {
    let subject = format!("Meter readings due at {}", property_name);
    let placeholders = vec![
        ("landlord_name", landlord_name.to_string()),
        ("property_name", property_name.to_string()),
        ("month", month.to_string()),
        ("rooms", rooms.join(", ")),
    ];

    mailer
        .send_email(to_email, &subject, DUE_READINGS_TEMPLATE, &placeholders)
        .await
}

pub struct InvoiceEmail<'a> {
    pub tenant_name: &'a str,
    pub room_number: &'a str,
    pub property_name: &'a str,
    pub rent_amount: String,
    pub utility_amount: String,
    pub amount_due: String,
    pub due_date: String,
    pub payment_method: &'a str,
}

pub async fn send_invoice_email(mailer: &Mailer, to_email: &str, invoice: InvoiceEmail<'_>) -> MailResult {
    let subject = format!("Invoice for room {}", invoice.room_number);
    let placeholders = vec![
        ("tenant_name", invoice.tenant_name.to_string()),
        ("room_number", invoice.room_number.to_string()),
        ("property_name", invoice.property_name.to_string()),
        ("rent_amount", invoice.rent_amount),
        ("utility_amount", invoice.utility_amount),
        ("amount_due", invoice.amount_due),
        ("due_date", invoice.due_date),
        ("payment_method", invoice.payment_method.to_string()),
    ];

    mailer
        .send_email(to_email, &subject, INVOICE_TEMPLATE, &placeholders)
        .await
}
