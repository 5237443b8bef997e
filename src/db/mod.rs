pub mod cache;
pub mod dashboarddb;
#[allow(clippy::module_inception)]
pub mod db;
pub mod invoicedb;
pub mod messagedb;
pub mod notificationdb;
pub mod propertydb;
pub mod rentaldb;
pub mod roledb;
pub mod roomdb;
pub mod userdb;
pub mod utilitydb;

pub use db::DBClient;
