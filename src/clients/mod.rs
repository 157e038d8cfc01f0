//! Typed client handles over the document store.

#[macro_use]
mod macros;

mod activity_client;
mod catalog_client;
mod customer_client;
mod notification_client;
mod report_client;
mod sale_client;

pub use activity_client::ActivityClient;
pub use catalog_client::CatalogClient;
pub use customer_client::CustomerClient;
pub use notification_client::NotificationClient;
pub use report_client::ReportClient;
pub use sale_client::SaleClient;
