pub mod auth;
pub mod dashboard;
pub mod invoices;
pub mod messages;
pub mod notifications;
pub mod properties;
pub mod readings;
pub mod rentals;
pub mod roles;
pub mod users;
pub mod utilities;
