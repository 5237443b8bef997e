use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::BigDecimal, FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UtilityType {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

/// A price is in force from `effective_date` until a later price supersedes it.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UtilityPrice {
    pub id: Uuid,
    pub utility_id: Uuid,
    pub price: BigDecimal,
    pub effective_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UtilityUsage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub utility_id: Uuid,
    pub usage_date: NaiveDate,
    pub old_reading: BigDecimal,
    pub new_reading: BigDecimal,
    pub amount_used: BigDecimal,
    pub unit_price: BigDecimal,
    pub cost: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Usage row computed by the billing calculator, not yet persisted.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewUtilityUsage {
    pub room_id: Uuid,
    pub utility_id: Uuid,
    pub utility_name: String,
    pub usage_date: NaiveDate,
    pub old_reading: BigDecimal,
    pub new_reading: BigDecimal,
    pub amount_used: BigDecimal,
    pub unit_price: BigDecimal,
    pub cost: BigDecimal,
}
