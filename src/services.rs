pub mod auth;
pub mod catalog_service;
pub mod checkout_service;
pub mod email_service;
pub mod payment;
pub mod reconciler;
pub mod report_service;
pub mod sale_service;
pub mod tenancy_service;
