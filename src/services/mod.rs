//! Business logic. Each service owns a database handle and the event sender;
//! handlers stay thin and delegate here.

pub mod catalog;
pub mod commissions;
pub mod homepage;
pub mod images;
pub mod inquiries;
pub mod orders;
pub mod seo;
pub mod users;
pub mod vendor_orders;
pub mod vendors;
