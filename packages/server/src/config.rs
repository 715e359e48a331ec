//! Server configuration.

use std::time::Duration;

use sharecast_shared::protocol::codec::{DEFAULT_MAX_FRAME_LEN, DEFAULT_MAX_HEADER_LEN};
use thiserror::Error;

use crate::domain::DEFAULT_QUEUE_CAPACITY;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_READ_BUDGET: usize = 256 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("outbound queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("read budget must be at least 1 byte")]
    ZeroReadBudget,

    #[error("max header length {max_header_len} cannot hold a {digits}-digit frame length")]
    HeaderTooShort { max_header_len: usize, digits: usize },
}

/// Settings of one relay server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pending messages allowed per session before new ones are dropped.
    pub queue_capacity: usize,
    /// Largest accepted envelope body, in base64 bytes.
    pub max_frame_len: usize,
    /// Header bytes allowed before the delimiter must appear.
    pub max_header_len: usize,
    /// Upper bound on one reactor wait.
    pub poll_interval: Duration,
    /// Bytes read from one connection per reactor iteration.
    pub read_budget: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            max_header_len: DEFAULT_MAX_HEADER_LEN,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_budget: DEFAULT_READ_BUDGET,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.read_budget == 0 {
            return Err(ConfigError::ZeroReadBudget);
        }
        let digits = self.max_frame_len.to_string().len();
        if self.max_header_len < digits {
            return Err(ConfigError::HeaderTooShort {
                max_header_len: self.max_header_len,
                digits,
            });
        }
        Ok(())
    }
}
