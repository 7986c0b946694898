//! Database entities for the marketplace schema.

pub mod banner;
pub mod category;
pub mod commission_entry;
pub mod homepage_section;
pub mod inquiry;
pub mod inquiry_message;
pub mod order;
pub mod order_item;
pub mod payment_account;
pub mod product;
pub mod product_image;
pub mod user;
pub mod vendor;
pub mod vendor_order;
pub mod vendor_order_item;

pub use banner::Entity as Banner;
pub use category::Entity as Category;
pub use commission_entry::Entity as CommissionEntry;
pub use homepage_section::Entity as HomepageSection;
pub use inquiry::Entity as Inquiry;
pub use inquiry_message::Entity as InquiryMessage;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use payment_account::Entity as PaymentAccount;
pub use product::Entity as Product;
pub use product_image::Entity as ProductImage;
pub use user::Entity as User;
pub use vendor::Entity as Vendor;
pub use vendor_order::Entity as VendorOrder;
pub use vendor_order_item::Entity as VendorOrderItem;
