//! Configuration module
//!
//! Layering, lowest to highest precedence: built-in defaults, the optional
//! TOML file, then command-line arguments and their environment variables
//! (applied by [`crate::args`]).

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{ConfigSource, load_config, load_config_with_fallback};
pub use types::{Config, ConsoleConfig, RelayConfig, SessionConfig, UpstreamTarget};
