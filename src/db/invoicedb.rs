// db/invoicedb.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    invoicemodel::{Invoice, InvoiceDetail, NewInvoice, PaymentStatus},
    utilitymodel::{NewUtilityUsage, UtilityUsage},
};

const INVOICE_COLUMNS: &str = "id, rental_id, rent_amount, utility_amount, amount_due, due_date, paid, payment_status, payment_method, paid_at, created_at";

const INVOICE_DETAIL_SELECT: &str = r#"
    SELECT i.id, i.rental_id, i.rent_amount, i.utility_amount, i.amount_due, i.due_date,
           i.paid, i.payment_status, i.payment_method, i.paid_at, i.created_at,
           r.tenant_id, u.name AS tenant_name, u.email AS tenant_email,
           p.landlord_id, rm.id AS room_id, rm.room_number, p.name AS property_name
    FROM invoices i
    JOIN rentals r ON r.id = i.rental_id
    JOIN users u ON u.id = r.tenant_id
    JOIN rooms rm ON rm.id = r.room_id
    JOIN properties p ON p.id = rm.property_id
"#;

/// Which invoices a listing may return.
#[derive(Debug, Clone, Copy)]
pub enum InvoiceScope {
    All,
    Landlord(Uuid),
    Tenant(Uuid),
}

#[async_trait]
pub trait InvoiceExt {
    /// Writes the usage rows and the invoice in one transaction.
    async fn save_reading_submission(
        &self,
        usages: &[NewUtilityUsage],
        invoice: &NewInvoice,
    ) -> Result<(Vec<UtilityUsage>, Invoice), sqlx::Error>;

    async fn get_invoice_detail(&self, invoice_id: Uuid) -> Result<Option<InvoiceDetail>, sqlx::Error>;

    async fn get_invoices(
        &self,
        scope: InvoiceScope,
        status: Option<PaymentStatus>,
        page: u32,
        limit: usize,
    ) -> Result<Vec<InvoiceDetail>, sqlx::Error>;

    /// Returns `None` when the invoice is already paid (or gone).
    async fn mark_invoice_paid(
        &self,
        invoice_id: Uuid,
        payment_method: Option<String>,
    ) -> Result<Option<Invoice>, sqlx::Error>;

    /// Flips pending invoices due before `today` to overdue.
    async fn mark_overdue_invoices(&self, today: NaiveDate) -> Result<u64, sqlx::Error>;

    /// Rentals among `rental_ids` with an invoice created in `[start, end)`.
    async fn get_invoiced_rental_ids(
        &self,
        rental_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, sqlx::Error>;
}

#[async_trait]
impl InvoiceExt for DBClient {
    async fn save_reading_submission(
        &self,
        usages: &[NewUtilityUsage],
        invoice: &NewInvoice,
    ) -> Result<(Vec<UtilityUsage>, Invoice), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(usages.len());

        for usage in usages {
            let row = sqlx::query_as::<_, UtilityUsage>(
                r#"
                INSERT INTO utility_usages
                    (room_id, utility_id, usage_date, old_reading, new_reading, amount_used, unit_price, cost)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, room_id, utility_id, usage_date, old_reading, new_reading,
                          amount_used, unit_price, cost, created_at
                "#,
            )
            .bind(usage.room_id)
            .bind(usage.utility_id)
            .bind(usage.usage_date)
            .bind(&usage.old_reading)
            .bind(&usage.new_reading)
            .bind(&usage.amount_used)
            .bind(&usage.unit_price)
            .bind(&usage.cost)
            .fetch_one(&mut *tx)
            .await?;

            saved.push(row);
        }

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices
                (rental_id, rent_amount, utility_amount, amount_due, due_date, paid, payment_status, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice.rental_id)
        .bind(&invoice.rent_amount)
        .bind(&invoice.utility_amount)
        .bind(&invoice.amount_due)
        .bind(invoice.due_date)
        .bind(invoice.paid)
        .bind(invoice.payment_status)
        .bind(&invoice.payment_method)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((saved, invoice))
    }

    async fn get_invoice_detail(&self, invoice_id: Uuid) -> Result<Option<InvoiceDetail>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceDetail>(&format!("{} WHERE i.id = $1", INVOICE_DETAIL_SELECT))
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_invoices(
        &self,
        scope: InvoiceScope,
        status: Option<PaymentStatus>,
        page: u32,
        limit: usize,
    ) -> Result<Vec<InvoiceDetail>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let (landlord_id, tenant_id) = match scope {
            InvoiceScope::All => (None, None),
            InvoiceScope::Landlord(id) => (Some(id), None),
            InvoiceScope::Tenant(id) => (None, Some(id)),
        };

        sqlx::query_as::<_, InvoiceDetail>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR p.landlord_id = $1)
              AND ($2::uuid IS NULL OR r.tenant_id = $2)
              AND ($3::payment_status IS NULL OR i.payment_status = $3)
            ORDER BY i.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            INVOICE_DETAIL_SELECT
        ))
        .bind(landlord_id)
        .bind(tenant_id)
        .bind(status)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_invoice_paid(
        &self,
        invoice_id: Uuid,
        payment_method: Option<String>,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET paid = TRUE,
                payment_status = 'paid',
                payment_method = COALESCE($1, payment_method),
                paid_at = NOW()
            WHERE id = $2 AND paid = FALSE
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(payment_method)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_overdue_invoices(&self, today: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET payment_status = 'overdue'
            WHERE payment_status = 'pending' AND paid = FALSE AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_invoiced_rental_ids(
        &self,
        rental_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT rental_id
            FROM invoices
            WHERE rental_id = ANY($1) AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(rental_ids)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }
}
