pub mod axum_http;
pub mod config;
pub mod usecases;

use std::time::Duration;

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(15);
