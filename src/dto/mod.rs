pub mod addresses;
pub mod auth;
pub mod categories;
pub mod heroes;
pub mod orders;
pub mod permissions;
pub mod products;
pub mod roles;
pub mod transactions;
