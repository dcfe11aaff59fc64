//! Error type of the POSIX port

use isov_core::IsovError;
use isov_hal::HalError;
use thiserror::Error;

/// Failures while configuring or starting the host meter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("meter error: {0}")]
    Meter(#[from] IsovError),
    #[error("startup failed: {0}")]
    Startup(#[from] HalError),
}

pub type PortResult<T> = Result<T, PortError>;
