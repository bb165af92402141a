pub mod addresses;
pub mod audit_logs;
pub mod categories;
pub mod heroes;
pub mod order_items;
pub mod orders;
pub mod permissions;
pub mod products;
pub mod roles;
pub mod transactions;
pub mod users;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use heroes::Entity as Heroes;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use permissions::Entity as Permissions;
pub use products::Entity as Products;
pub use roles::Entity as Roles;
pub use transactions::Entity as Transactions;
pub use users::Entity as Users;
