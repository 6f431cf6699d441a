pub mod app_config;
pub mod database;
pub mod ledger_repo;
pub mod memory;
pub mod order_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use ledger_repo::PgQuotaLedger;
pub use memory::MemoryStore;
pub use order_repo::PgOrderStore;
