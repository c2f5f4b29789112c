//! Command implementations.

pub mod configure;
pub mod extract;
pub mod schemas;

pub use self::configure::execute_config;
pub use self::extract::{execute_extract, run_extraction};
pub use self::schemas::execute_schemas;
