pub mod auth;
pub mod catalog;
pub mod public;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod tenancy;
pub mod users;
pub mod webhook;
