//! Configuration for safe-env.
//!
//! A project may carry a `.safe-env.yml` naming its resolver, defaults,
//! ignore lists and resolver arguments. Command-line flags are layered on top
//! with [`SafeEnvConfig::merge`].

pub mod loader;
pub mod schema;

pub use loader::{find_config, load_config, load_config_file, parse_config, CONFIG_FILE_NAME};
pub use schema::SafeEnvConfig;
