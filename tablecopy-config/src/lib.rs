//! Configuration types and loading for tablecopy.
//!
//! Configuration is read once at process start from `configuration/base.*`, the
//! environment-specific file and `APP_`-prefixed environment variables, validated, and then
//! passed explicitly to every component.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
