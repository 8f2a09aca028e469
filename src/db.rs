pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod capacity_repo;
pub use capacity_repo::{CapacityRepository, PoolScope};
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
