pub mod auth;
pub mod catalog;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod tenancy;
