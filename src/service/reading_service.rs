// service/reading_service.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::{invoicedb::InvoiceExt, rentaldb::RentalExt, roomdb::RoomExt, DBClient},
    models::{
        invoicemodel::{Invoice, NewInvoice},
        propertymodel::{Rental, Room},
        utilitymodel::{NewUtilityUsage, UtilityUsage},
    },
    service::{
        billing::{calculate_utility_cost, MeterStore},
        error::ServiceError,
        invoice_generator::generate_invoice,
    },
};

/// Persistence used by a reading submission, on top of the meter lookups.
#[async_trait]
pub trait ReadingStore: MeterStore {
    /// The room and the id of the landlord owning its property.
    async fn room_with_owner(&self, room_id: Uuid) -> Result<Option<(Room, Uuid)>, ServiceError>;

    async fn active_rental(&self, room_id: Uuid, today: NaiveDate) -> Result<Option<Rental>, ServiceError>;

    /// Stores all usage rows and the invoice atomically.
    async fn save_submission(
        &self,
        usages: &[NewUtilityUsage],
        invoice: &NewInvoice,
    ) -> Result<(Vec<UtilityUsage>, Invoice), ServiceError>;
}

#[async_trait]
impl ReadingStore for DBClient {
    async fn room_with_owner(&self, room_id: Uuid) -> Result<Option<(Room, Uuid)>, ServiceError> {
        let found = self.get_room_with_property(room_id).await?;
        Ok(found.map(|(room, property)| (room, property.landlord_id)))
    }

    async fn active_rental(&self, room_id: Uuid, today: NaiveDate) -> Result<Option<Rental>, ServiceError> {
        Ok(self.find_active_rental(room_id, today).await?)
    }

    async fn save_submission(
        &self,
        usages: &[NewUtilityUsage],
        invoice: &NewInvoice,
    ) -> Result<(Vec<UtilityUsage>, Invoice), ServiceError> {
        Ok(self.save_reading_submission(usages, invoice).await?)
    }
}

#[derive(Debug, Clone)]
pub struct ReadingReceipt {
    pub invoice: Invoice,
    pub usages: Vec<UtilityUsage>,
    pub utility_total: BigDecimal,
    pub tenant_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct SubmitReadings {
    pub room_id: Uuid,
    pub readings: BTreeMap<String, BigDecimal>,
    pub reading_date: NaiveDate,
    pub payment_method: Option<String>,
    /// Landlord the room must belong to; `None` skips the ownership check.
    pub owner_id: Option<Uuid>,
}

pub struct ReadingService<S: ReadingStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ReadingStore + ?Sized> ReadingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Prices the readings, generates the invoice for the room's active rental
    /// and writes everything in one go. Nothing is stored on any error.
    pub async fn submit_readings(
        &self,
        request: SubmitReadings,
        today: NaiveDate,
    ) -> Result<ReadingReceipt, ServiceError> {
        let (room, landlord_id) = self
            .store
            .room_with_owner(request.room_id)
            .await?
            .ok_or(ServiceError::RoomNotFound(request.room_id))?;

        if let Some(owner_id) = request.owner_id {
            if owner_id != landlord_id {
                return Err(ServiceError::Forbidden(
                    "You can only submit readings for your own rooms".to_string(),
                ));
            }
        }

        let rental = self
            .store
            .active_rental(room.id, today)
            .await?
            .ok_or(ServiceError::NoActiveRental(room.id))?;

        let bill = calculate_utility_cost(
            self.store.as_ref(),
            room.id,
            &request.readings,
            request.reading_date,
        )
        .await?;

        let new_invoice = generate_invoice(
            &rental,
            &room,
            &bill.total,
            request.reading_date,
            request.payment_method.as_deref(),
        );

        let (usages, invoice) = self.store.save_submission(&bill.lines, &new_invoice).await?;

        tracing::info!(
            "Invoice {} generated for rental {} ({} meter lines, utilities {})",
            invoice.id,
            rental.id,
            usages.len(),
            bill.total
        );

        Ok(ReadingReceipt {
            invoice,
            usages,
            utility_total: bill.total,
            tenant_id: rental.tenant_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoicemodel::PaymentStatus;
    use crate::models::utilitymodel::UtilityType;
    use crate::service::billing::tests::{date, dec, FakeMeterStore};
    use chrono::Utc;
    use std::sync::Mutex;

    struct FakeReadingStore {
        meters: FakeMeterStore,
        room: Room,
        landlord_id: Uuid,
        rental: Option<Rental>,
        saved: Mutex<Vec<(Vec<NewUtilityUsage>, NewInvoice)>>,
    }

    impl FakeReadingStore {
        fn new(meters: FakeMeterStore, with_rental: bool) -> Self {
            let room = Room {
                id: Uuid::new_v4(),
                property_id: Uuid::new_v4(),
                room_number: "2B".into(),
                room_type: "studio".into(),
                rent_amount: dec("1200.00"),
                is_available: false,
                due_day: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            let rental = with_rental.then(|| Rental {
                id: Uuid::new_v4(),
                room_id: room.id,
                tenant_id: Uuid::new_v4(),
                start_date: date(2026, 1, 1),
                end_date: None,
                created_at: Utc::now(),
            });
            Self {
                meters,
                room,
                landlord_id: Uuid::new_v4(),
                rental,
                saved: Mutex::new(Vec::new()),
            }
        }

        fn saved_count(&self) -> usize {
            self.saved.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MeterStore for FakeReadingStore {
        async fn find_utility(&self, name: &str) -> Result<Option<UtilityType>, ServiceError> {
            self.meters.find_utility(name).await
        }

        async fn previous_reading(
            &self,
            room_id: Uuid,
            utility_id: Uuid,
        ) -> Result<Option<BigDecimal>, ServiceError> {
            self.meters.previous_reading(room_id, utility_id).await
        }

        async fn effective_price(
            &self,
            utility_id: Uuid,
            on: NaiveDate,
        ) -> Result<Option<BigDecimal>, ServiceError> {
            self.meters.effective_price(utility_id, on).await
        }
    }

    #[async_trait]
    impl ReadingStore for FakeReadingStore {
        async fn room_with_owner(&self, room_id: Uuid) -> Result<Option<(Room, Uuid)>, ServiceError> {
            Ok((room_id == self.room.id).then(|| (self.room.clone(), self.landlord_id)))
        }

        async fn active_rental(&self, room_id: Uuid, today: NaiveDate) -> Result<Option<Rental>, ServiceError> {
            Ok(self
                .rental
                .clone()
                .filter(|r| r.room_id == room_id && r.start_date <= today))
        }

        async fn save_submission(
            &self,
            usages: &[NewUtilityUsage],
            invoice: &NewInvoice,
        ) -> Result<(Vec<UtilityUsage>, Invoice), ServiceError> {
            self.saved
                .lock()
                .unwrap()
                .push((usages.to_vec(), invoice.clone()));

            let stored = usages
                .iter()
                .map(|u| UtilityUsage {
                    id: Uuid::new_v4(),
                    room_id: u.room_id,
                    utility_id: u.utility_id,
                    usage_date: u.usage_date,
                    old_reading: u.old_reading.clone(),
                    new_reading: u.new_reading.clone(),
                    amount_used: u.amount_used.clone(),
                    unit_price: u.unit_price.clone(),
                    cost: u.cost.clone(),
                    created_at: Utc::now(),
                })
                .collect();

            let invoice = Invoice {
                id: Uuid::new_v4(),
                rental_id: invoice.rental_id,
                rent_amount: invoice.rent_amount.clone(),
                utility_amount: invoice.utility_amount.clone(),
                amount_due: invoice.amount_due.clone(),
                due_date: invoice.due_date,
                paid: invoice.paid,
                payment_status: invoice.payment_status,
                payment_method: invoice.payment_method.clone(),
                paid_at: None,
                created_at: Utc::now(),
            };

            Ok((stored, invoice))
        }
    }

    fn readings(pairs: &[(&str, &str)]) -> BTreeMap<String, BigDecimal> {
        pairs.iter().map(|(k, v)| (k.to_string(), dec(v))).collect()
    }

    fn request(store: &FakeReadingStore, readings: BTreeMap<String, BigDecimal>) -> SubmitReadings {
        SubmitReadings {
            room_id: store.room.id,
            readings,
            reading_date: date(2026, 3, 1),
            payment_method: None,
            owner_id: Some(store.landlord_id),
        }
    }

    fn water_store(with_rental: bool) -> FakeReadingStore {
        let (meters, water) = FakeMeterStore::default().with_utility("Water");
        let meters = meters.with_price(water, "3.00", date(2026, 1, 1));
        let mut store = FakeReadingStore::new(meters, with_rental);
        store.meters = std::mem::take(&mut store.meters).with_reading(store.room.id, water, "190.5");
        store
    }

    #[tokio::test]
    async fn submission_stores_usages_and_invoice_together() {
        let store = Arc::new(water_store(true));
        let service = ReadingService::new(store.clone());

        let receipt = service
            .submit_readings(request(&store, readings(&[("Water", "195.5")])), date(2026, 3, 2))
            .await
            .unwrap();

        assert_eq!(store.saved_count(), 1);
        assert_eq!(receipt.usages.len(), 1);
        assert_eq!(receipt.utility_total, dec("15.00"));
        assert_eq!(receipt.invoice.amount_due, dec("1215.00"));
        assert_eq!(receipt.invoice.due_date, date(2026, 4, 1));
        assert_eq!(receipt.invoice.payment_method, "cash");
        assert_eq!(receipt.invoice.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn no_active_rental_writes_nothing() {
        let store = Arc::new(water_store(false));
        let service = ReadingService::new(store.clone());

        let err = service
            .submit_readings(request(&store, readings(&[("Water", "195.5")])), date(2026, 3, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NoActiveRental(_)));
        assert_eq!(store.saved_count(), 0);
    }

    #[tokio::test]
    async fn rental_starting_later_is_not_active() {
        let store = Arc::new(water_store(true));
        let service = ReadingService::new(store.clone());

        let err = service
            .submit_readings(request(&store, readings(&[("Water", "195.5")])), date(2025, 12, 31))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NoActiveRental(_)));
    }

    #[tokio::test]
    async fn unknown_utility_writes_nothing() {
        let store = Arc::new(water_store(true));
        let service = ReadingService::new(store.clone());

        let err = service
            .submit_readings(
                request(&store, readings(&[("Water", "195.5"), ("Gas", "12")])),
                date(2026, 3, 2),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::UtilityNotFound(_)));
        assert_eq!(store.saved_count(), 0);
    }

    #[tokio::test]
    async fn other_landlords_are_refused() {
        let store = Arc::new(water_store(true));
        let service = ReadingService::new(store.clone());
        let mut req = request(&store, readings(&[("Water", "195.5")]));
        req.owner_id = Some(Uuid::new_v4());

        let err = service.submit_readings(req, date(2026, 3, 2)).await.unwrap_err();

        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(store.saved_count(), 0);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let store = Arc::new(water_store(true));
        let service = ReadingService::new(store.clone());
        let mut req = request(&store, readings(&[("Water", "195.5")]));
        req.room_id = Uuid::new_v4();

        let err = service.submit_readings(req, date(2026, 3, 2)).await.unwrap_err();

        assert!(matches!(err, ServiceError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn one_meter_read_twice_writes_nothing() {
        let store = Arc::new(water_store(true));
        let service = ReadingService::new(store.clone());

        let err = service
            .submit_readings(
                request(&store, readings(&[("Water", "195.5"), ("water", "195.5")])),
                date(2026, 3, 2),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.saved_count(), 0);
    }
}
