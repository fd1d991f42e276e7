pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::TravelConfig;
pub use error::{Result, TravelError};
pub use retry::RetryPolicy;
pub use types::*;
