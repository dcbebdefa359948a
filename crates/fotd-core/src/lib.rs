pub mod app_config;
mod config;
pub mod error;
pub mod models;
pub mod provider_config;
pub mod provider_id;
pub mod stores;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{CommunicationError, ConfigError, ErrorKind, FlavorError, ProviderConfigError};
pub use models::{DayOfWeek, FlavorInfo, LocationInfo, LocationKey};
pub use provider_config::ProviderConfig;
pub use provider_id::ProviderId;
pub use stores::{
    load_stores, parse_stores, StoreConfig, StoresFile, UpdateInterval, DEFAULT_STORE_NAME,
};
