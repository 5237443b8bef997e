// service/billing.rs
//! Meter readings to utility charges.
//!
//! The arithmetic lives in pure functions so it can be checked without a
//! database. `calculate_utility_cost` resolves the inputs through a
//! [`MeterStore`] and then hands them to [`calculate_bill`].
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_traits::Zero;
use uuid::Uuid;

use crate::{
    db::{utilitydb::UtilityExt, DBClient},
    models::utilitymodel::{NewUtilityUsage, UtilityPrice, UtilityType},
    service::error::ServiceError,
    utils::money::MoneyHelpers,
};

/// Read side of the meter data the calculator needs.
#[async_trait]
pub trait MeterStore: Send + Sync {
    async fn find_utility(&self, name: &str) -> Result<Option<UtilityType>, ServiceError>;

    /// `new_reading` of the most recently recorded usage for the pair.
    async fn previous_reading(
        &self,
        room_id: Uuid,
        utility_id: Uuid,
    ) -> Result<Option<BigDecimal>, ServiceError>;

    async fn effective_price(
        &self,
        utility_id: Uuid,
        on: NaiveDate,
    ) -> Result<Option<BigDecimal>, ServiceError>;
}

#[async_trait]
impl MeterStore for DBClient {
    async fn find_utility(&self, name: &str) -> Result<Option<UtilityType>, ServiceError> {
        Ok(self.get_utility_by_name(name).await?)
    }

    async fn previous_reading(
        &self,
        room_id: Uuid,
        utility_id: Uuid,
    ) -> Result<Option<BigDecimal>, ServiceError> {
        let usage = self.get_latest_usage(room_id, utility_id).await?;
        Ok(usage.map(|u| u.new_reading))
    }

    async fn effective_price(
        &self,
        utility_id: Uuid,
        on: NaiveDate,
    ) -> Result<Option<BigDecimal>, ServiceError> {
        let price = self.get_effective_price(utility_id, on).await?;
        Ok(price.map(|p| p.price))
    }
}

/// Everything needed to price one meter.
#[derive(Debug, Clone)]
pub struct MeterInput {
    pub utility_id: Uuid,
    pub utility_name: String,
    pub old_reading: BigDecimal,
    pub new_reading: BigDecimal,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub lines: Vec<NewUtilityUsage>,
    pub total: BigDecimal,
}

pub fn consumption(old_reading: &BigDecimal, new_reading: &BigDecimal) -> BigDecimal {
    new_reading - old_reading
}

/// Price with the latest `effective_date` on or before `on`, zero when none applies.
pub fn select_effective_price(prices: &[UtilityPrice], on: NaiveDate) -> BigDecimal {
    prices
        .iter()
        .filter(|p| p.effective_date <= on)
        .max_by_key(|p| (p.effective_date, p.created_at))
        .map(|p| p.price.clone())
        .unwrap_or_else(BigDecimal::zero)
}

/// Cost of one meter line, rounded half-up to cents.
pub fn line_cost(amount_used: &BigDecimal, unit_price: &BigDecimal) -> BigDecimal {
    (amount_used * unit_price).to_money()
}

pub fn calculate_bill(room_id: Uuid, usage_date: NaiveDate, inputs: Vec<MeterInput>) -> Bill {
    let mut total = BigDecimal::zero();
    let mut lines = Vec::with_capacity(inputs.len());

    for input in inputs {
        let amount_used = consumption(&input.old_reading, &input.new_reading);
        if amount_used < BigDecimal::zero() {
            tracing::warn!(
                "Negative consumption for room {} utility {}: {} -> {}",
                room_id,
                input.utility_name,
                input.old_reading,
                input.new_reading
            );
        }

        let cost = line_cost(&amount_used, &input.unit_price);
        total += &cost;

        lines.push(NewUtilityUsage {
            room_id,
            utility_id: input.utility_id,
            utility_name: input.utility_name,
            usage_date,
            old_reading: input.old_reading,
            new_reading: input.new_reading,
            amount_used,
            unit_price: input.unit_price,
            cost,
        });
    }

    Bill { lines, total }
}

/// Prices a set of readings for a room. Every utility name is resolved before
/// any line is computed, so an unknown name fails the whole request. Two names
/// resolving to the same utility (e.g. "Water" and "water") are rejected.
pub async fn calculate_utility_cost<S: MeterStore + ?Sized>(
    store: &S,
    room_id: Uuid,
    readings: &BTreeMap<String, BigDecimal>,
    reading_date: NaiveDate,
) -> Result<Bill, ServiceError> {
    let mut utilities = Vec::with_capacity(readings.len());
    let mut seen = HashSet::with_capacity(readings.len());
    for (name, new_reading) in readings {
        let utility = store
            .find_utility(name)
            .await?
            .ok_or_else(|| ServiceError::UtilityNotFound(name.clone()))?;
        if !seen.insert(utility.id) {
            return Err(ServiceError::Validation(format!(
                "Utility {} was given more than one reading",
                utility.name
            )));
        }
        utilities.push((utility, new_reading.clone()));
    }

    let mut inputs = Vec::with_capacity(utilities.len());
    for (utility, new_reading) in utilities {
        let old_reading = store
            .previous_reading(room_id, utility.id)
            .await?
            .unwrap_or_else(BigDecimal::zero);
        let unit_price = store
            .effective_price(utility.id, reading_date)
            .await?
            .unwrap_or_else(BigDecimal::zero);

        inputs.push(MeterInput {
            utility_id: utility.id,
            utility_name: utility.name,
            old_reading,
            new_reading,
            unit_price,
        });
    }

    Ok(calculate_bill(room_id, reading_date, inputs))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::str::FromStr;

    pub(crate) fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn price(utility_id: Uuid, amount: &str, effective: NaiveDate) -> UtilityPrice {
        UtilityPrice {
            id: Uuid::new_v4(),
            utility_id,
            price: dec(amount),
            effective_date: effective,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// In-memory meter data.
    #[derive(Default)]
    pub(crate) struct FakeMeterStore {
        pub utilities: Vec<UtilityType>,
        pub readings: HashMap<(Uuid, Uuid), BigDecimal>,
        pub prices: Vec<UtilityPrice>,
    }

    impl FakeMeterStore {
        pub(crate) fn with_utility(mut self, name: &str) -> (Self, Uuid) {
            let id = Uuid::new_v4();
            self.utilities.push(UtilityType {
                id,
                name: name.to_string(),
                unit: "unit".to_string(),
                created_at: Utc::now(),
            });
            (self, id)
        }

        pub(crate) fn with_price(mut self, utility_id: Uuid, amount: &str, effective: NaiveDate) -> Self {
            self.prices.push(price(utility_id, amount, effective));
            self
        }

        pub(crate) fn with_reading(mut self, room_id: Uuid, utility_id: Uuid, value: &str) -> Self {
            self.readings.insert((room_id, utility_id), dec(value));
            self
        }
    }

    #[async_trait]
    impl MeterStore for FakeMeterStore {
        async fn find_utility(&self, name: &str) -> Result<Option<UtilityType>, ServiceError> {
            Ok(self
                .utilities
                .iter()
                .find(|u| u.name.eq_ignore_ascii_case(name))
                .cloned())
        }

        async fn previous_reading(
            &self,
            room_id: Uuid,
            utility_id: Uuid,
        ) -> Result<Option<BigDecimal>, ServiceError> {
            Ok(self.readings.get(&(room_id, utility_id)).cloned())
        }

        async fn effective_price(
            &self,
            utility_id: Uuid,
            on: NaiveDate,
        ) -> Result<Option<BigDecimal>, ServiceError> {
            let prices: Vec<UtilityPrice> = self
                .prices
                .iter()
                .filter(|p| p.utility_id == utility_id)
                .cloned()
                .collect();
            if prices.iter().all(|p| p.effective_date > on) {
                return Ok(None);
            }
            Ok(Some(select_effective_price(&prices, on)))
        }
    }

    #[test]
    fn consumption_is_new_minus_old() {
        assert_eq!(consumption(&dec("190.5"), &dec("195.5")), dec("5.0"));
        assert_eq!(consumption(&dec("0"), &dec("12.25")), dec("12.25"));
    }

    #[test]
    fn consumption_can_go_negative() {
        assert_eq!(consumption(&dec("200"), &dec("150")), dec("-50"));
    }

    #[test]
    fn effective_price_is_latest_not_after_date() {
        let utility = Uuid::new_v4();
        let prices = vec![
            price(utility, "2.50", date(2026, 1, 1)),
            price(utility, "3.00", date(2026, 3, 1)),
            price(utility, "3.75", date(2026, 6, 1)),
        ];

        assert_eq!(select_effective_price(&prices, date(2026, 3, 1)), dec("3.00"));
        assert_eq!(select_effective_price(&prices, date(2026, 5, 31)), dec("3.00"));
        assert_eq!(select_effective_price(&prices, date(2026, 2, 14)), dec("2.50"));
        assert_eq!(select_effective_price(&prices, date(2027, 1, 1)), dec("3.75"));
    }

    #[test]
    fn no_price_in_force_means_zero() {
        let utility = Uuid::new_v4();
        let prices = vec![price(utility, "3.00", date(2026, 3, 1))];

        assert_eq!(select_effective_price(&prices, date(2026, 2, 28)), BigDecimal::zero());
        assert_eq!(select_effective_price(&[], date(2026, 2, 28)), BigDecimal::zero());
    }

    #[test]
    fn line_cost_rounds_to_cents() {
        assert_eq!(line_cost(&dec("5.0"), &dec("3.00")), dec("15.00"));
        assert_eq!(line_cost(&dec("1.333"), &dec("1.5")), dec("2.00"));
        assert_eq!(line_cost(&dec("2.5"), &dec("0.005")), dec("0.01"));
    }

    #[test]
    fn bill_totals_every_line() {
        let room = Uuid::new_v4();
        let inputs = vec![
            MeterInput {
                utility_id: Uuid::new_v4(),
                utility_name: "Water".into(),
                old_reading: dec("10"),
                new_reading: dec("14"),
                unit_price: dec("2.50"),
            },
            MeterInput {
                utility_id: Uuid::new_v4(),
                utility_name: "Electricity".into(),
                old_reading: dec("100"),
                new_reading: dec("130"),
                unit_price: dec("0.20"),
            },
        ];

        let bill = calculate_bill(room, date(2026, 4, 1), inputs);

        assert_eq!(bill.lines.len(), 2);
        assert_eq!(bill.lines[0].cost, dec("10.00"));
        assert_eq!(bill.lines[1].cost, dec("6.00"));
        assert_eq!(bill.total, dec("16.00"));
        assert!(bill.lines.iter().all(|l| l.room_id == room));
    }

    #[tokio::test]
    async fn water_and_electricity_example() {
        let room = Uuid::new_v4();
        let (store, water) = FakeMeterStore::default().with_utility("Water");
        let (store, power) = store.with_utility("Electricity");
        let store = store
            .with_reading(room, water, "190.5")
            .with_reading(room, power, "190.75")
            .with_price(water, "3.00", date(2026, 1, 1))
            .with_price(power, "3.00", date(2026, 1, 1));

        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), dec("195.5"));
        readings.insert("Electricity".to_string(), dec("200.75"));

        let bill = calculate_utility_cost(&store, room, &readings, date(2026, 3, 1))
            .await
            .unwrap();

        let water_line = bill.lines.iter().find(|l| l.utility_id == water).unwrap();
        let power_line = bill.lines.iter().find(|l| l.utility_id == power).unwrap();

        assert_eq!(water_line.amount_used, dec("5.0"));
        assert_eq!(water_line.cost, dec("15.00"));
        assert_eq!(power_line.amount_used, dec("10.0"));
        assert_eq!(power_line.cost, dec("30.00"));
        assert_eq!(bill.total, dec("45.00"));
    }

    #[tokio::test]
    async fn first_reading_starts_from_zero() {
        let room = Uuid::new_v4();
        let (store, water) = FakeMeterStore::default().with_utility("Water");
        let store = store.with_price(water, "2.00", date(2026, 1, 1));

        let mut readings = BTreeMap::new();
        readings.insert("water".to_string(), dec("7"));

        let bill = calculate_utility_cost(&store, room, &readings, date(2026, 3, 1))
            .await
            .unwrap();

        assert_eq!(bill.lines[0].old_reading, BigDecimal::zero());
        assert_eq!(bill.total, dec("14.00"));
    }

    #[tokio::test]
    async fn missing_price_bills_nothing() {
        let room = Uuid::new_v4();
        let (store, water) = FakeMeterStore::default().with_utility("Water");
        let store = store
            .with_reading(room, water, "5")
            .with_price(water, "4.00", date(2026, 9, 1));

        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), dec("9"));

        let bill = calculate_utility_cost(&store, room, &readings, date(2026, 3, 1))
            .await
            .unwrap();

        assert_eq!(bill.lines[0].amount_used, dec("4"));
        assert_eq!(bill.lines[0].unit_price, BigDecimal::zero());
        assert_eq!(bill.total, BigDecimal::zero());
    }

    #[tokio::test]
    async fn unknown_utility_rejects_the_request() {
        let room = Uuid::new_v4();
        let (store, _) = FakeMeterStore::default().with_utility("Water");

        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), dec("9"));
        readings.insert("Gas".to_string(), dec("3"));

        let err = calculate_utility_cost(&store, room, &readings, date(2026, 3, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::UtilityNotFound(name) if name == "Gas"));
    }

    #[tokio::test]
    async fn same_utility_under_two_spellings_is_rejected() {
        let room = Uuid::new_v4();
        let (store, water) = FakeMeterStore::default().with_utility("Water");
        let store = store
            .with_reading(room, water, "190.5")
            .with_price(water, "3.00", date(2026, 1, 1));

        let mut readings = BTreeMap::new();
        readings.insert("Water".to_string(), dec("195.5"));
        readings.insert("water".to_string(), dec("195.5"));

        let err = calculate_utility_cost(&store, room, &readings, date(2026, 3, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
