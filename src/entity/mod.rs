pub mod appointment_requests;
pub mod appointment_services;
pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod services;
pub mod users;

pub use appointment_requests::Entity as AppointmentRequests;
pub use appointment_services::Entity as AppointmentServices;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use services::Entity as Services;
pub use users::Entity as Users;
