// service/invoice_generator.rs
use bigdecimal::BigDecimal;
use chrono::{Datelike, Months, NaiveDate};

use crate::models::{
    invoicemodel::{NewInvoice, PaymentStatus},
    propertymodel::{Rental, Room},
};

pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// One calendar month after `reading_date`. A day that does not exist in the
/// next month falls back to that month's last day (Jan 31 -> Feb 28).
pub fn due_date_for(reading_date: NaiveDate) -> NaiveDate {
    reading_date
        .checked_add_months(Months::new(1))
        .unwrap_or_else(|| reading_date.with_day(28).unwrap_or(reading_date))
}

/// Builds a pending invoice for the rental: room rent plus the utility charges.
pub fn generate_invoice(
    rental: &Rental,
    room: &Room,
    utility_cost: &BigDecimal,
    reading_date: NaiveDate,
    payment_method: Option<&str>,
) -> NewInvoice {
    let payment_method = payment_method
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD)
        .to_string();

    NewInvoice {
        rental_id: rental.id,
        rent_amount: room.rent_amount.clone(),
        utility_amount: utility_cost.clone(),
        amount_due: &room.rent_amount + utility_cost,
        due_date: due_date_for(reading_date),
        payment_method,
        payment_status: PaymentStatus::Pending,
        paid: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::billing::tests::{date, dec};
    use chrono::Utc;
    use uuid::Uuid;

    fn fixtures(rent: &str) -> (Rental, Room) {
        let room = Room {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            room_number: "101".into(),
            room_type: "single".into(),
            rent_amount: dec(rent),
            is_available: false,
            due_day: Some(5),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let rental = Rental {
            id: Uuid::new_v4(),
            room_id: room.id,
            tenant_id: Uuid::new_v4(),
            start_date: date(2026, 1, 1),
            end_date: None,
            created_at: Utc::now(),
        };
        (rental, room)
    }

    #[test]
    fn total_is_rent_plus_utilities() {
        let (rental, room) = fixtures("1500.00");
        let invoice = generate_invoice(&rental, &room, &dec("45.00"), date(2026, 3, 1), None);

        assert_eq!(invoice.rental_id, rental.id);
        assert_eq!(invoice.rent_amount, dec("1500.00"));
        assert_eq!(invoice.utility_amount, dec("45.00"));
        assert_eq!(invoice.amount_due, dec("1545.00"));
        assert_eq!(invoice.payment_status, PaymentStatus::Pending);
        assert!(!invoice.paid);
    }

    #[test]
    fn due_one_month_after_reading() {
        assert_eq!(due_date_for(date(2026, 3, 1)), date(2026, 4, 1));
        assert_eq!(due_date_for(date(2026, 12, 15)), date(2027, 1, 15));
    }

    #[test]
    fn month_end_due_dates_clamp() {
        assert_eq!(due_date_for(date(2026, 1, 31)), date(2026, 2, 28));
        assert_eq!(due_date_for(date(2028, 1, 30)), date(2028, 2, 29));
    }

    #[test]
    fn payment_method_defaults_to_cash() {
        let (rental, room) = fixtures("800");
        let blank = generate_invoice(&rental, &room, &dec("0"), date(2026, 3, 1), Some("  "));
        let chosen =
            generate_invoice(&rental, &room, &dec("0"), date(2026, 3, 1), Some("bank_transfer"));

        assert_eq!(blank.payment_method, "cash");
        assert_eq!(chosen.payment_method, "bank_transfer");
    }
}
