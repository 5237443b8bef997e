pub mod background_jobs;
pub mod billing;
pub mod due_reading_service;
pub mod error;
pub mod invoice_generator;
pub mod notification_service;
pub mod permission_service;
pub mod reading_service;
