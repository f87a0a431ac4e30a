pub mod loader;
pub mod pbs;

pub use loader::load_config_bytes;
pub use pbs::{DefaultConfig, PbsConfig, SmartAdServerConfig};
