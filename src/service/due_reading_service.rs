// service/due_reading_service.rs
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    db::{invoicedb::InvoiceExt, propertydb::PropertyExt, rentaldb::RentalExt, DBClient},
    models::propertymodel::{Property, RentalDetail},
    service::error::ServiceError,
};

#[async_trait]
pub trait DueReadingStore: Send + Sync {
    async fn all_properties(&self) -> Result<Vec<Property>, ServiceError>;

    async fn started_rentals(
        &self,
        property_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<RentalDetail>, ServiceError>;

    /// Rental ids among `rental_ids` that already have an invoice created in `[start, end)`.
    async fn invoiced_rentals(
        &self,
        rental_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, ServiceError>;
}

#[async_trait]
impl DueReadingStore for DBClient {
    async fn all_properties(&self) -> Result<Vec<Property>, ServiceError> {
        Ok(self.get_all_properties().await?)
    }

    async fn started_rentals(
        &self,
        property_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<RentalDetail>, ServiceError> {
        Ok(self.get_active_rentals_for_property(property_id, today).await?)
    }

    async fn invoiced_rentals(
        &self,
        rental_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, ServiceError> {
        Ok(self.get_invoiced_rental_ids(rental_ids, start, end).await?)
    }
}

/// Receives the rooms of one property that still need readings this month.
#[async_trait]
pub trait LandlordNotifier: Send + Sync {
    async fn notify_due_readings(
        &self,
        property: &Property,
        due: &[RentalDetail],
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DueReadingReport {
    pub properties_scanned: usize,
    pub rooms_due: usize,
    pub landlords_notified: usize,
    pub notification_failures: usize,
}

/// First instant of the month containing `today` and the first instant of the next one, UTC.
pub fn month_bounds(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = today.with_day(1).unwrap_or(today);
    let next = first.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);

    (
        first.and_time(NaiveTime::MIN).and_utc(),
        next.and_time(NaiveTime::MIN).and_utc(),
    )
}

/// Walks every property in turn and tells its landlord which occupied rooms
/// have not been invoiced yet this calendar month. A failed notification is
/// logged and the scan moves on.
pub async fn scan_due_readings<S, N>(
    store: &S,
    notifier: &N,
    today: NaiveDate,
) -> Result<DueReadingReport, ServiceError>
where
    S: DueReadingStore + ?Sized,
    N: LandlordNotifier + ?Sized,
{
    let (month_start, month_end) = month_bounds(today);
    let mut report = DueReadingReport::default();

    for property in store.all_properties().await? {
        report.properties_scanned += 1;

        let rentals = store.started_rentals(property.id, today).await?;
        if rentals.is_empty() {
            continue;
        }

        let rental_ids: Vec<Uuid> = rentals.iter().map(|r| r.rental_id).collect();
        let invoiced: HashSet<Uuid> = store
            .invoiced_rentals(&rental_ids, month_start, month_end)
            .await?
            .into_iter()
            .collect();

        let due: Vec<RentalDetail> = rentals
            .into_iter()
            .filter(|r| !invoiced.contains(&r.rental_id))
            .collect();

        if due.is_empty() {
            continue;
        }

        report.rooms_due += due.len();

        match notifier.notify_due_readings(&property, &due).await {
            Ok(()) => report.landlords_notified += 1,
            Err(e) => {
                report.notification_failures += 1;
                tracing::error!(
                    "Failed to notify landlord {} about property {}: {}",
                    property.landlord_id,
                    property.id,
                    e
                );
            }
        }
    }

    tracing::info!(
        "Due-reading scan finished: {} properties, {} rooms due, {} landlords notified",
        report.properties_scanned,
        report.rooms_due,
        report.landlords_notified
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::billing::tests::{date, dec};
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        properties: Vec<Property>,
        rentals: HashMap<Uuid, Vec<RentalDetail>>,
        /// (rental id, invoice created_at)
        invoices: Vec<(Uuid, DateTime<Utc>)>,
    }

    #[async_trait]
    impl DueReadingStore for FakeStore {
        async fn all_properties(&self) -> Result<Vec<Property>, ServiceError> {
            Ok(self.properties.clone())
        }

        async fn started_rentals(
            &self,
            property_id: Uuid,
            today: NaiveDate,
        ) -> Result<Vec<RentalDetail>, ServiceError> {
            Ok(self
                .rentals
                .get(&property_id)
                .map(|rs| rs.iter().filter(|r| r.start_date <= today).cloned().collect())
                .unwrap_or_default())
        }

        async fn invoiced_rentals(
            &self,
            rental_ids: &[Uuid],
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Uuid>, ServiceError> {
            Ok(self
                .invoices
                .iter()
                .filter(|(id, at)| rental_ids.contains(id) && *at >= start && *at < end)
                .map(|(id, _)| *id)
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<(Uuid, Vec<String>)>>,
        fail_for: Option<Uuid>,
    }

    #[async_trait]
    impl LandlordNotifier for RecordingNotifier {
        async fn notify_due_readings(
            &self,
            property: &Property,
            due: &[RentalDetail],
        ) -> Result<(), ServiceError> {
            if self.fail_for == Some(property.id) {
                return Err(ServiceError::Notification("smtp down".into()));
            }
            self.calls.lock().unwrap().push((
                property.landlord_id,
                due.iter().map(|r| r.room_number.clone()).collect(),
            ));
            Ok(())
        }
    }

    fn property(name: &str) -> Property {
        Property {
            id: Uuid::new_v4(),
            landlord_id: Uuid::new_v4(),
            name: name.into(),
            address: "12 Harbour Road".into(),
            floor_count: 2,
            room_count: 4,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rental(property: &Property, room_number: &str, start: NaiveDate) -> RentalDetail {
        RentalDetail {
            rental_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            start_date: start,
            end_date: None,
            room_number: room_number.into(),
            rent_amount: dec("900"),
            property_id: property.id,
            property_name: property.name.clone(),
            landlord_id: property.landlord_id,
        }
    }

    #[test]
    fn month_bounds_cover_the_calendar_month() {
        let (start, end) = month_bounds(date(2026, 3, 17));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());

        let (start, end) = month_bounds(date(2026, 12, 31));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn rooms_invoiced_this_month_are_skipped() {
        let home = property("Harbour House");
        let a = rental(&home, "A1", date(2026, 1, 1));
        let b = rental(&home, "A2", date(2026, 1, 1));
        let c = rental(&home, "A3", date(2026, 1, 1));

        let mut store = FakeStore::default();
        store.properties.push(home.clone());
        store.invoices.push((a.rental_id, Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));
        // last month's invoice does not count
        store.invoices.push((b.rental_id, Utc.with_ymd_and_hms(2026, 2, 27, 9, 0, 0).unwrap()));
        store.rentals.insert(home.id, vec![a, b, c]);

        let notifier = RecordingNotifier::default();
        let report = scan_due_readings(&store, &notifier, date(2026, 3, 20)).await.unwrap();

        let calls = notifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, home.landlord_id);
        assert_eq!(calls[0].1, vec!["A2".to_string(), "A3".to_string()]);
        assert_eq!(report.rooms_due, 2);
        assert_eq!(report.landlords_notified, 1);
    }

    #[tokio::test]
    async fn fully_invoiced_or_empty_properties_are_quiet() {
        let invoiced = property("Paid Up");
        let empty = property("Vacant");
        let future = property("Not Yet");
        let done = rental(&invoiced, "1", date(2026, 1, 1));

        let mut store = FakeStore::default();
        store.properties = vec![invoiced.clone(), empty.clone(), future.clone()];
        store.invoices.push((done.rental_id, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()));
        store.rentals.insert(invoiced.id, vec![done]);
        store.rentals.insert(future.id, vec![rental(&future, "9", date(2026, 5, 1))]);

        let notifier = RecordingNotifier::default();
        let report = scan_due_readings(&store, &notifier, date(2026, 3, 20)).await.unwrap();

        assert!(notifier.calls.lock().unwrap().is_empty());
        assert_eq!(report.properties_scanned, 3);
        assert_eq!(report.rooms_due, 0);
    }

    #[tokio::test]
    async fn a_failed_notification_does_not_stop_the_scan() {
        let first = property("First");
        let second = property("Second");

        let mut store = FakeStore::default();
        store.properties = vec![first.clone(), second.clone()];
        store.rentals.insert(first.id, vec![rental(&first, "F1", date(2026, 1, 1))]);
        store.rentals.insert(second.id, vec![rental(&second, "S1", date(2026, 1, 1))]);

        let notifier = RecordingNotifier {
            fail_for: Some(first.id),
            ..Default::default()
        };
        let report = scan_due_readings(&store, &notifier, date(2026, 3, 20)).await.unwrap();

        assert_eq!(report.notification_failures, 1);
        assert_eq!(report.landlords_notified, 1);
        assert_eq!(notifier.calls.lock().unwrap()[0].0, second.landlord_id);
    }
}
