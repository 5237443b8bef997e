use std::borrow::Cow;
use std::collections::BTreeMap;

use bigdecimal::RoundingMode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::propertydtos::validate_non_negative_amount;
use crate::models::invoicemodel::Invoice;
use crate::models::utilitymodel::UtilityUsage;
use crate::utils::money::format_amount;

const READING_SCALE: i64 = 3;
const PRICE_SCALE: i64 = 4;
const MAX_READING_EXCLUSIVE: i64 = 100_000_000_000;

fn validate_readings(readings: &BTreeMap<String, BigDecimal>) -> Result<(), ValidationError> {
    if readings.is_empty() {
        let mut error = ValidationError::new("empty_readings");
        error.message = Some(Cow::from("At least one meter reading is required"));
        return Err(error);
    }

    if readings.keys().any(|name| name.trim().is_empty()) {
        let mut error = ValidationError::new("invalid_utility_name");
        error.message = Some(Cow::from("Utility names cannot be blank"));
        return Err(error);
    }

    if !readings.values().all(fits_reading_column) {
        let mut error = ValidationError::new("invalid_reading");
        error.message = Some(Cow::from(
            "Readings allow at most 3 decimal places and 11 integer digits",
        ));
        return Err(error);
    }

    Ok(())
}

/// Readings are stored as NUMERIC(14, 3).
fn fits_reading_column(reading: &BigDecimal) -> bool {
    let (_, scale) = reading.normalized().as_bigint_and_exponent();
    scale <= READING_SCALE && reading.abs() < BigDecimal::from(MAX_READING_EXCLUSIVE)
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateUtilityDto {
    #[validate(length(min = 1, max = 50, message = "Utility name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "Unit is required"))]
    pub unit: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePriceDto {
    #[validate(custom = "validate_non_negative_amount")]
    pub price: BigDecimal,
    pub effective_date: NaiveDate,
}

/// Meter readings for one room, keyed by utility name.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitReadingsDto {
    pub room_id: Uuid,

    #[validate(custom = "validate_readings")]
    pub readings: BTreeMap<String, BigDecimal>,

    pub reading_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 30, message = "Payment method cannot be empty"))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageDto {
    pub id: Uuid,
    pub utility_id: Uuid,
    pub usage_date: NaiveDate,
    pub old_reading: String,
    pub new_reading: String,
    pub amount_used: String,
    pub unit_price: String,
    pub cost: String,
}

impl UsageDto {
    pub fn from_usage(usage: &UtilityUsage) -> Self {
        Self {
            id: usage.id,
            utility_id: usage.utility_id,
            usage_date: usage.usage_date,
            old_reading: usage.old_reading.to_string(),
            new_reading: usage.new_reading.to_string(),
            amount_used: usage.amount_used.to_string(),
            unit_price: usage
                .unit_price
                .with_scale_round(PRICE_SCALE, RoundingMode::HalfUp)
                .to_string(),
            cost: format_amount(&usage.cost),
        }
    }

    pub fn from_usages(usages: &[UtilityUsage]) -> Vec<Self> {
        usages.iter().map(Self::from_usage).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ReadingReceiptDto {
    pub invoice: Invoice,
    pub usages: Vec<UsageDto>,
    pub utility_total: String,
    pub amount_due: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_readings_fail_validation() {
        let dto = SubmitReadingsDto {
            room_id: Uuid::new_v4(),
            readings: BTreeMap::new(),
            reading_date: None,
            payment_method: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("readings"));
    }

    #[test]
    fn named_readings_pass_validation() {
        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), BigDecimal::from_str("210.5").unwrap());
        let dto = SubmitReadingsDto {
            room_id: Uuid::new_v4(),
            readings,
            reading_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            payment_method: Some("bank_transfer".into()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn blank_utility_name_is_rejected() {
        let mut readings = BTreeMap::new();
        readings.insert("  ".to_string(), BigDecimal::from(3));
        assert!(validate_readings(&readings).is_err());
    }

    #[test]
    fn over_precise_reading_is_rejected() {
        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), BigDecimal::from_str("1.0004").unwrap());
        let dto = SubmitReadingsDto {
            room_id: Uuid::new_v4(),
            readings,
            reading_date: None,
            payment_method: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("readings"));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), BigDecimal::from_str("195.50000").unwrap());
        readings.insert("Electricity".to_string(), BigDecimal::from_str("200.125").unwrap());
        assert!(validate_readings(&readings).is_ok());
    }

    #[test]
    fn reading_beyond_eleven_integer_digits_is_rejected() {
        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), BigDecimal::from_str("100000000000").unwrap());
        assert!(validate_readings(&readings).is_err());

        readings.insert("Water".to_string(), BigDecimal::from_str("99999999999.999").unwrap());
        assert!(validate_readings(&readings).is_ok());
    }

    #[test]
    fn usage_unit_price_keeps_four_decimals() {
        let usage = UtilityUsage {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            utility_id: Uuid::new_v4(),
            usage_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            old_reading: BigDecimal::from_str("10.000").unwrap(),
            new_reading: BigDecimal::from_str("20.000").unwrap(),
            amount_used: BigDecimal::from_str("10.000").unwrap(),
            unit_price: BigDecimal::from_str("0.1234").unwrap(),
            cost: BigDecimal::from_str("1.23").unwrap(),
            created_at: chrono::Utc::now(),
        };
        let dto = UsageDto::from_usage(&usage);
        assert_eq!(dto.unit_price, "0.1234");
        assert_eq!(dto.cost, "1.23");
    }
}
