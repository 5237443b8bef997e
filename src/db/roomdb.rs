// db/roomdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    dtos::propertydtos::{CreateRoomDto, UpdateRoomDto},
    models::propertymodel::{Property, Room},
};

const ROOM_COLUMNS: &str = "id, property_id, room_number, room_type, rent_amount, is_available, due_day, created_at, updated_at";

#[async_trait]
pub trait RoomExt {
    async fn create_room(&self, property_id: Uuid, room_data: CreateRoomDto) -> Result<Room, sqlx::Error>;

    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>, sqlx::Error>;

    /// The room together with the property that owns it.
    async fn get_room_with_property(
        &self,
        room_id: Uuid,
    ) -> Result<Option<(Room, Property)>, sqlx::Error>;

    async fn get_rooms_by_property(&self, property_id: Uuid) -> Result<Vec<Room>, sqlx::Error>;

    async fn update_room(&self, room_id: Uuid, room_data: UpdateRoomDto) -> Result<Room, sqlx::Error>;

    async fn delete_room(&self, room_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl RoomExt for DBClient {
    async fn create_room(&self, property_id: Uuid, room_data: CreateRoomDto) -> Result<Room, sqlx::Error> {
        sqlx::query_as::<_, Room>(&format!(
            r#"
            INSERT INTO rooms (property_id, room_number, room_type, rent_amount, is_available, due_day)
            VALUES ($1, $2, $3, $4, COALESCE($5, TRUE), $6)
            RETURNING {}
            "#,
            ROOM_COLUMNS
        ))
        .bind(property_id)
        .bind(room_data.room_number)
        .bind(room_data.room_type)
        .bind(room_data.rent_amount)
        .bind(room_data.is_available)
        .bind(room_data.due_day)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(&format!("SELECT {} FROM rooms WHERE id = $1", ROOM_COLUMNS))
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_room_with_property(
        &self,
        room_id: Uuid,
    ) -> Result<Option<(Room, Property)>, sqlx::Error> {
        let room = match self.get_room(room_id).await? {
            Some(room) => room,
            None => return Ok(None),
        };

        let property = sqlx::query_as::<_, Property>(
            r#"
            SELECT id, landlord_id, name, address, floor_count, room_count, created_at, updated_at
            FROM properties WHERE id = $1
            "#,
        )
        .bind(room.property_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property.map(|property| (room, property)))
    }

    async fn get_rooms_by_property(&self, property_id: Uuid) -> Result<Vec<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(&format!(
            "SELECT {} FROM rooms WHERE property_id = $1 ORDER BY room_number",
            ROOM_COLUMNS
        ))
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_room(&self, room_id: Uuid, room_data: UpdateRoomDto) -> Result<Room, sqlx::Error> {
        sqlx::query_as::<_, Room>(&format!(
            r#"
            UPDATE rooms
            SET room_number = COALESCE($1, room_number),
                room_type = COALESCE($2, room_type),
                rent_amount = COALESCE($3, rent_amount),
                is_available = COALESCE($4, is_available),
                due_day = COALESCE($5, due_day),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            ROOM_COLUMNS
        ))
        .bind(room_data.room_number)
        .bind(room_data.room_type)
        .bind(room_data.rent_amount)
        .bind(room_data.is_available)
        .bind(room_data.due_day)
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_room(&self, room_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
