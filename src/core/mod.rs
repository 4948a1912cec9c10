pub mod config;
pub mod error;
pub mod types;

pub use config::FWorldConfig;
pub use error::{FWorldError, Result};
