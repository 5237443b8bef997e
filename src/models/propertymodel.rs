use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::BigDecimal, FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Property {
    pub id: Uuid,
    pub landlord_id: Uuid,
    pub name: String,
    pub address: String,
    pub floor_count: i32,
    pub room_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Room {
    pub id: Uuid,
    pub property_id: Uuid,
    pub room_number: String,
    pub room_type: String,
    pub rent_amount: BigDecimal,
    pub is_available: bool,
    /// Day of the month rent falls due.
    pub due_day: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tenancy binding a tenant to a room. `end_date` stays `None` for open-ended rentals.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Rental {
    pub id: Uuid,
    pub room_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A rental joined with the room it occupies and the owning landlord.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RentalDetail {
    pub rental_id: Uuid,
    pub room_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub room_number: String,
    pub rent_amount: BigDecimal,
    pub property_id: Uuid,
    pub property_name: String,
    pub landlord_id: Uuid,
}
