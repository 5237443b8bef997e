use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::propertymodel::{Property, RentalDetail, Room};

pub fn validate_non_negative_amount(amount: &BigDecimal) -> Result<(), ValidationError> {
    if amount < &BigDecimal::from(0) {
        let mut error = ValidationError::new("negative_amount");
        error.message = Some(Cow::from("Amount cannot be negative"));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePropertyDto {
    #[validate(length(min = 2, max = 150, message = "Name must be between 2 and 150 characters"))]
    pub name: String,

    #[validate(length(min = 5, max = 500, message = "Address must be between 5 and 500 characters"))]
    pub address: String,

    #[validate(range(min = 1, max = 200, message = "Floor count must be between 1 and 200"))]
    pub floor_count: i32,

    #[validate(range(min = 0, max = 5000, message = "Room count must be between 0 and 5000"))]
    pub room_count: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdatePropertyDto {
    #[validate(length(min = 2, max = 150, message = "Name must be between 2 and 150 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 5, max = 500, message = "Address must be between 5 and 500 characters"))]
    pub address: Option<String>,

    #[validate(range(min = 1, max = 200, message = "Floor count must be between 1 and 200"))]
    pub floor_count: Option<i32>,

    #[validate(range(min = 0, max = 5000, message = "Room count must be between 0 and 5000"))]
    pub room_count: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRoomDto {
    #[validate(length(min = 1, max = 20, message = "Room number is required"))]
    pub room_number: String,

    #[validate(length(min = 1, max = 50, message = "Room type is required"))]
    pub room_type: String,

    #[validate(custom = "validate_non_negative_amount")]
    pub rent_amount: BigDecimal,

    pub is_available: Option<bool>,

    #[validate(range(min = 1, max = 31, message = "Due day must be between 1 and 31"))]
    pub due_day: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateRoomDto {
    #[validate(length(min = 1, max = 20, message = "Room number cannot be empty"))]
    pub room_number: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Room type cannot be empty"))]
    pub room_type: Option<String>,

    #[validate(custom = "validate_non_negative_amount")]
    pub rent_amount: Option<BigDecimal>,

    pub is_available: Option<bool>,

    #[validate(range(min = 1, max = 31, message = "Due day must be between 1 and 31"))]
    pub due_day: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRentalDto {
    pub room_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl CreateRentalDto {
    pub fn validate_dates(&self) -> Result<(), ValidationError> {
        if let Some(end_date) = self.end_date {
            if end_date < self.start_date {
                let mut error = ValidationError::new("invalid_dates");
                error.message = Some(Cow::from("End date cannot be before start date"));
                return Err(error);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndRentalDto {
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyFilterDto {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub floor_count: i32,
    pub room_count: i32,
    pub landlord_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PropertyFilterDto {
    pub fn from_property(property: &Property) -> Self {
        Self {
            id: property.id,
            name: property.name.clone(),
            address: property.address.clone(),
            floor_count: property.floor_count,
            room_count: property.room_count,
            landlord_id: property.landlord_id,
            created_at: property.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomFilterDto {
    pub id: Uuid,
    pub property_id: Uuid,
    pub room_number: String,
    pub room_type: String,
    pub rent_amount: String,
    pub is_available: bool,
    pub due_day: Option<i32>,
}

impl RoomFilterDto {
    pub fn from_room(room: &Room) -> Self {
        Self {
            id: room.id,
            property_id: room.property_id,
            room_number: room.room_number.clone(),
            room_type: room.room_type.clone(),
            rent_amount: crate::utils::money::format_amount(&room.rent_amount),
            is_available: room.is_available,
            due_day: room.due_day,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RentalFilterDto {
    pub id: Uuid,
    pub room_id: Uuid,
    pub room_number: String,
    pub property_id: Uuid,
    pub property_name: String,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub rent_amount: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl RentalFilterDto {
    pub fn from_detail(detail: &RentalDetail) -> Self {
        Self {
            id: detail.rental_id,
            room_id: detail.room_id,
            room_number: detail.room_number.clone(),
            property_id: detail.property_id,
            property_name: detail.property_name.clone(),
            tenant_id: detail.tenant_id,
            landlord_id: detail.landlord_id,
            rent_amount: crate::utils::money::format_amount(&detail.rent_amount),
            start_date: detail.start_date,
            end_date: detail.end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn negative_rent_is_rejected() {
        let dto = CreateRoomDto {
            room_number: "A1".into(),
            room_type: "single".into(),
            rent_amount: BigDecimal::from_str("-1").unwrap(),
            is_available: None,
            due_day: Some(5),
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rent_amount"));
    }

    #[test]
    fn due_day_must_fit_in_a_month() {
        let dto = CreateRoomDto {
            room_number: "A1".into(),
            room_type: "single".into(),
            rent_amount: BigDecimal::from(1500),
            is_available: Some(true),
            due_day: Some(32),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn rental_end_before_start_is_rejected() {
        let dto = CreateRentalDto {
            room_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 4, 1),
        };
        assert!(dto.validate_dates().is_err());
    }
}
