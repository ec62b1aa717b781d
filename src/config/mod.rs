mod api_key;
#[allow(clippy::module_inception)]
mod config;
pub mod defaults;

pub use api_key::ApiKey;
pub use config::*;
