pub mod invoicemodel;
pub mod messagemodel;
pub mod notificationmodel;
pub mod propertymodel;
pub mod rolemodel;
pub mod usermodel;
pub mod utilitymodel;
