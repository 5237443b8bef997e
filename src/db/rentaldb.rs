// db/rentaldb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::propertymodel::{Rental, RentalDetail};

const RENTAL_DETAIL_SELECT: &str = r#"
    SELECT r.id AS rental_id, r.room_id, r.tenant_id, r.start_date, r.end_date,
           rm.room_number, rm.rent_amount, p.id AS property_id, p.name AS property_name,
           p.landlord_id
    FROM rentals r
    JOIN rooms rm ON rm.id = r.room_id
    JOIN properties p ON p.id = rm.property_id
"#;

#[async_trait]
pub trait RentalExt {
    /// Creates the rental and marks the room unavailable.
    async fn create_rental(
        &self,
        room_id: Uuid,
        tenant_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Rental, sqlx::Error>;

    /// Closes the rental and frees the room.
    async fn end_rental(&self, rental_id: Uuid, end_date: NaiveDate) -> Result<Rental, sqlx::Error>;

    async fn get_rental_detail(&self, rental_id: Uuid) -> Result<Option<RentalDetail>, sqlx::Error>;

    async fn get_rentals_by_landlord(&self, landlord_id: Uuid) -> Result<Vec<RentalDetail>, sqlx::Error>;

    async fn get_rentals_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<RentalDetail>, sqlx::Error>;

    /// Latest rental that has started on or before `today`. `end_date` is not consulted.
    async fn find_active_rental(
        &self,
        room_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Rental>, sqlx::Error>;

    /// One row per room of the property that has a started rental (latest one per room).
    async fn get_active_rentals_for_property(
        &self,
        property_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<RentalDetail>, sqlx::Error>;

    /// True when the two users are tenant and landlord of a common rental.
    async fn share_tenancy(&self, user_a: Uuid, user_b: Uuid) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl RentalExt for DBClient {
    async fn create_rental(
        &self,
        room_id: Uuid,
        tenant_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Rental, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (room_id, tenant_id, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room_id, tenant_id, start_date, end_date, created_at
            "#,
        )
        .bind(room_id)
        .bind(tenant_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE rooms SET is_available = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rental)
    }

    async fn end_rental(&self, rental_id: Uuid, end_date: NaiveDate) -> Result<Rental, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals SET end_date = $1
            WHERE id = $2
            RETURNING id, room_id, tenant_id, start_date, end_date, created_at
            "#,
        )
        .bind(end_date)
        .bind(rental_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE rooms SET is_available = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(rental.room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rental)
    }

    async fn get_rental_detail(&self, rental_id: Uuid) -> Result<Option<RentalDetail>, sqlx::Error> {
        sqlx::query_as::<_, RentalDetail>(&format!("{} WHERE r.id = $1", RENTAL_DETAIL_SELECT))
            .bind(rental_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_rentals_by_landlord(&self, landlord_id: Uuid) -> Result<Vec<RentalDetail>, sqlx::Error> {
        sqlx::query_as::<_, RentalDetail>(&format!(
            "{} WHERE p.landlord_id = $1 ORDER BY r.start_date DESC",
            RENTAL_DETAIL_SELECT
        ))
        .bind(landlord_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_rentals_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<RentalDetail>, sqlx::Error> {
        sqlx::query_as::<_, RentalDetail>(&format!(
            "{} WHERE r.tenant_id = $1 ORDER BY r.start_date DESC",
            RENTAL_DETAIL_SELECT
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_active_rental(
        &self,
        room_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Rental>, sqlx::Error> {
        sqlx::query_as::<_, Rental>(
            r#"
            SELECT id, room_id, tenant_id, start_date, end_date, created_at
            FROM rentals
            WHERE room_id = $1 AND start_date <= $2
            ORDER BY start_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_active_rentals_for_property(
        &self,
        property_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<RentalDetail>, sqlx::Error> {
        sqlx::query_as::<_, RentalDetail>(
            r#"
            SELECT DISTINCT ON (rm.id)
                   r.id AS rental_id, r.room_id, r.tenant_id, r.start_date, r.end_date,
                   rm.room_number, rm.rent_amount, p.id AS property_id, p.name AS property_name,
                   p.landlord_id
            FROM rentals r
            JOIN rooms rm ON rm.id = r.room_id
            JOIN properties p ON p.id = rm.property_id
            WHERE p.id = $1 AND r.start_date <= $2
            ORDER BY rm.id, r.start_date DESC, r.created_at DESC
            "#,
        )
        .bind(property_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await
    }

    async fn share_tenancy(&self, user_a: Uuid, user_b: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM rentals r
                JOIN rooms rm ON rm.id = r.room_id
                JOIN properties p ON p.id = rm.property_id
                WHERE (r.tenant_id = $1 AND p.landlord_id = $2)
                   OR (r.tenant_id = $2 AND p.landlord_id = $1)
            )
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.pool)
        .await
    }
}
