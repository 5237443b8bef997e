// db/utilitydb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::utilitymodel::{UtilityPrice, UtilityType, UtilityUsage};

const USAGE_COLUMNS: &str = "id, room_id, utility_id, usage_date, old_reading, new_reading, amount_used, unit_price, cost, created_at";

#[async_trait]
pub trait UtilityExt {
    async fn get_utilities(&self) -> Result<Vec<UtilityType>, sqlx::Error>;

    async fn get_utility(&self, utility_id: Uuid) -> Result<Option<UtilityType>, sqlx::Error>;

    async fn get_utility_by_name(&self, name: &str) -> Result<Option<UtilityType>, sqlx::Error>;

    async fn create_utility(&self, name: String, unit: String) -> Result<UtilityType, sqlx::Error>;

    async fn get_utility_prices(&self, utility_id: Uuid) -> Result<Vec<UtilityPrice>, sqlx::Error>;

    async fn add_utility_price(
        &self,
        utility_id: Uuid,
        price: BigDecimal,
        effective_date: NaiveDate,
    ) -> Result<UtilityPrice, sqlx::Error>;

    /// Price with the greatest `effective_date` not after `on`.
    async fn get_effective_price(
        &self,
        utility_id: Uuid,
        on: NaiveDate,
    ) -> Result<Option<UtilityPrice>, sqlx::Error>;

    /// Most recently created usage row for the room and utility.
    async fn get_latest_usage(
        &self,
        room_id: Uuid,
        utility_id: Uuid,
    ) -> Result<Option<UtilityUsage>, sqlx::Error>;

    async fn get_room_usages(
        &self,
        room_id: Uuid,
        page: u32,
        limit: usize,
    ) -> Result<Vec<UtilityUsage>, sqlx::Error>;
}

#[async_trait]
impl UtilityExt for DBClient {
    async fn get_utilities(&self) -> Result<Vec<UtilityType>, sqlx::Error> {
        sqlx::query_as::<_, UtilityType>(
            "SELECT id, name, unit, created_at FROM utility_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_utility(&self, utility_id: Uuid) -> Result<Option<UtilityType>, sqlx::Error> {
        sqlx::query_as::<_, UtilityType>(
            "SELECT id, name, unit, created_at FROM utility_types WHERE id = $1",
        )
        .bind(utility_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_utility_by_name(&self, name: &str) -> Result<Option<UtilityType>, sqlx::Error> {
        sqlx::query_as::<_, UtilityType>(
            "SELECT id, name, unit, created_at FROM utility_types WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_utility(&self, name: String, unit: String) -> Result<UtilityType, sqlx::Error> {
        sqlx::query_as::<_, UtilityType>(
            r#"
            INSERT INTO utility_types (name, unit)
            VALUES ($1, $2)
            RETURNING id, name, unit, created_at
            "#,
        )
        .bind(name)
        .bind(unit)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_utility_prices(&self, utility_id: Uuid) -> Result<Vec<UtilityPrice>, sqlx::Error> {
        sqlx::query_as::<_, UtilityPrice>(
            r#"
            SELECT id, utility_id, price, effective_date, created_at
            FROM utility_prices
            WHERE utility_id = $1
            ORDER BY effective_date DESC
            "#,
        )
        .bind(utility_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_utility_price(
        &self,
        utility_id: Uuid,
        price: BigDecimal,
        effective_date: NaiveDate,
    ) -> Result<UtilityPrice, sqlx::Error> {
        sqlx::query_as::<_, UtilityPrice>(
            r#"
            INSERT INTO utility_prices (utility_id, price, effective_date)
            VALUES ($1, $2, $3)
            RETURNING id, utility_id, price, effective_date, created_at
            "#,
        )
        .bind(utility_id)
        .bind(price)
        .bind(effective_date)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_effective_price(
        &self,
        utility_id: Uuid,
        on: NaiveDate,
    ) -> Result<Option<UtilityPrice>, sqlx::Error> {
        sqlx::query_as::<_, UtilityPrice>(
            r#"
            SELECT id, utility_id, price, effective_date, created_at
            FROM utility_prices
            WHERE utility_id = $1 AND effective_date <= $2
            ORDER BY effective_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(utility_id)
        .bind(on)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_latest_usage(
        &self,
        room_id: Uuid,
        utility_id: Uuid,
    ) -> Result<Option<UtilityUsage>, sqlx::Error> {
        sqlx::query_as::<_, UtilityUsage>(&format!(
            r#"
            SELECT {} FROM utility_usages
            WHERE room_id = $1 AND utility_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            USAGE_COLUMNS
        ))
        .bind(room_id)
        .bind(utility_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_room_usages(
        &self,
        room_id: Uuid,
        page: u32,
        limit: usize,
    ) -> Result<Vec<UtilityUsage>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, UtilityUsage>(&format!(
            r#"
            SELECT {} FROM utility_usages
            WHERE room_id = $1
            ORDER BY usage_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            USAGE_COLUMNS
        ))
        .bind(room_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }
}
