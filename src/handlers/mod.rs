//! HTTP handlers. Thin wrappers that deserialize, authorize, delegate to a
//! service, and wrap the result in the response envelope.

pub mod categories;
pub mod common;
pub mod health;
pub mod homepage;
pub mod inquiries;
pub mod orders;
pub mod products;
pub mod seo;
pub mod uploads;
pub mod users;
pub mod vendor_orders;
pub mod vendors;
