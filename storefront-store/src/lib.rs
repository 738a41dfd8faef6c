pub mod app_config;
pub mod order_repo;
pub mod sdk_loader;

pub use app_config::Config;
pub use order_repo::{InMemoryOrderRepository, SeedError};
pub use sdk_loader::StaticSdkLoader;
