// db/dashboarddb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::db::DBClient;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminStats {
    pub total_users: i64,
    pub admins: i64,
    pub landlords: i64,
    pub tenants: i64,
    pub properties: i64,
    pub rooms: i64,
    pub invoices: i64,
    pub amount_invoiced: BigDecimal,
    pub amount_paid: BigDecimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LandlordStats {
    pub properties: i64,
    pub rooms: i64,
    pub occupied_rooms: i64,
    pub pending_invoices: i64,
    pub overdue_invoices: i64,
    pub outstanding_amount: BigDecimal,
    pub collected_amount: BigDecimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TenantStats {
    pub active_rentals: i64,
    pub unpaid_invoices: i64,
    pub unpaid_amount: BigDecimal,
    pub next_due_date: Option<NaiveDate>,
    pub unread_messages: i64,
}

#[async_trait]
pub trait DashboardExt {
    async fn get_admin_stats(&self) -> Result<AdminStats, sqlx::Error>;

    async fn get_landlord_stats(&self, landlord_id: Uuid) -> Result<LandlordStats, sqlx::Error>;

    async fn get_tenant_stats(&self, tenant_id: Uuid, today: NaiveDate) -> Result<TenantStats, sqlx::Error>;
}

#[async_trait]
impl DashboardExt for DBClient {
    async fn get_admin_stats(&self) -> Result<AdminStats, sqlx::Error> {
        sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS admins,
                (SELECT COUNT(*) FROM users WHERE role = 'landlord') AS landlords,
                (SELECT COUNT(*) FROM users WHERE role = 'tenant') AS tenants,
                (SELECT COUNT(*) FROM properties) AS properties,
                (SELECT COUNT(*) FROM rooms) AS rooms,
                (SELECT COUNT(*) FROM invoices) AS invoices,
                (SELECT COALESCE(SUM(amount_due), 0) FROM invoices) AS amount_invoiced,
                (SELECT COALESCE(SUM(amount_due), 0) FROM invoices WHERE paid) AS amount_paid
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    async fn get_landlord_stats(&self, landlord_id: Uuid) -> Result<LandlordStats, sqlx::Error> {
        sqlx::query_as::<_, LandlordStats>(
            r#"
            WITH landlord_invoices AS (
                SELECT i.*
                FROM invoices i
                JOIN rentals r ON r.id = i.rental_id
                JOIN rooms rm ON rm.id = r.room_id
                JOIN properties p ON p.id = rm.property_id
                WHERE p.landlord_id = $1
            )
            SELECT
                (SELECT COUNT(*) FROM properties WHERE landlord_id = $1) AS properties,
                (SELECT COUNT(*) FROM rooms rm JOIN properties p ON p.id = rm.property_id
                    WHERE p.landlord_id = $1) AS rooms,
                (SELECT COUNT(*) FROM rooms rm JOIN properties p ON p.id = rm.property_id
                    WHERE p.landlord_id = $1 AND rm.is_available = FALSE) AS occupied_rooms,
                (SELECT COUNT(*) FROM landlord_invoices WHERE payment_status = 'pending') AS pending_invoices,
                (SELECT COUNT(*) FROM landlord_invoices WHERE payment_status = 'overdue') AS overdue_invoices,
                (SELECT COALESCE(SUM(amount_due), 0) FROM landlord_invoices WHERE NOT paid) AS outstanding_amount,
                (SELECT COALESCE(SUM(amount_due), 0) FROM landlord_invoices WHERE paid) AS collected_amount
            "#,
        )
        .bind(landlord_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_tenant_stats(&self, tenant_id: Uuid, today: NaiveDate) -> Result<TenantStats, sqlx::Error> {
        sqlx::query_as::<_, TenantStats>(
            r#"
            WITH tenant_invoices AS (
                SELECT i.*
                FROM invoices i
                JOIN rentals r ON r.id = i.rental_id
                WHERE r.tenant_id = $1
            )
            SELECT
                (SELECT COUNT(*) FROM rentals
                    WHERE tenant_id = $1 AND start_date <= $2
                      AND (end_date IS NULL OR end_date >= $2)) AS active_rentals,
                (SELECT COUNT(*) FROM tenant_invoices WHERE NOT paid) AS unpaid_invoices,
                (SELECT COALESCE(SUM(amount_due), 0) FROM tenant_invoices WHERE NOT paid) AS unpaid_amount,
                (SELECT MIN(due_date) FROM tenant_invoices WHERE NOT paid) AS next_due_date,
                (SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND is_read = FALSE) AS unread_messages
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await
    }
}
