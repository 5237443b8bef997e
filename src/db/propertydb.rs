// db/propertydb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    dtos::propertydtos::{CreatePropertyDto, UpdatePropertyDto},
    models::propertymodel::Property,
};

const PROPERTY_COLUMNS: &str =
    "id, landlord_id, name, address, floor_count, room_count, created_at, updated_at";

#[async_trait]
pub trait PropertyExt {
    async fn create_property(
        &self,
        landlord_id: Uuid,
        property_data: CreatePropertyDto,
    ) -> Result<Property, sqlx::Error>;

    async fn get_property_by_id(&self, property_id: Uuid) -> Result<Option<Property>, sqlx::Error>;

    async fn get_properties_by_landlord(
        &self,
        landlord_id: Uuid,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Property>, sqlx::Error>;

    async fn get_all_properties(&self) -> Result<Vec<Property>, sqlx::Error>;

    async fn update_property(
        &self,
        property_id: Uuid,
        property_data: UpdatePropertyDto,
    ) -> Result<Property, sqlx::Error>;

    async fn delete_property(&self, property_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl PropertyExt for DBClient {
    async fn create_property(
        &self,
        landlord_id: Uuid,
        property_data: CreatePropertyDto,
    ) -> Result<Property, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            r#"
            INSERT INTO properties (landlord_id, name, address, floor_count, room_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        ))
        .bind(landlord_id)
        .bind(property_data.name)
        .bind(property_data.address)
        .bind(property_data.floor_count)
        .bind(property_data.room_count)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_property_by_id(&self, property_id: Uuid) -> Result<Option<Property>, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {} FROM properties WHERE id = $1",
            PROPERTY_COLUMNS
        ))
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_properties_by_landlord(
        &self,
        landlord_id: Uuid,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, Property>(&format!(
            r#"
            SELECT {} FROM properties
            WHERE landlord_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            PROPERTY_COLUMNS
        ))
        .bind(landlord_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_all_properties(&self) -> Result<Vec<Property>, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {} FROM properties ORDER BY created_at",
            PROPERTY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_property(
        &self,
        property_id: Uuid,
        property_data: UpdatePropertyDto,
    ) -> Result<Property, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            r#"
            UPDATE properties
            SET name = COALESCE($1, name),
                address = COALESCE($2, address),
                floor_count = COALESCE($3, floor_count),
                room_count = COALESCE($4, room_count),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        ))
        .bind(property_data.name)
        .bind(property_data.address)
        .bind(property_data.floor_count)
        .bind(property_data.room_count)
        .bind(property_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_property(&self, property_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(property_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
