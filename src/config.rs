//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default pause between two sweep passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default inactivity window after which the sweeper drains the store and stops.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Multicast group and port used for prefix invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulticastConfig {
    /// Multicast group address
    pub group: IpAddr,
    /// UDP port
    pub port: u16,
}

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pause between sweep passes
    pub sweep_interval: Duration,
    /// Inactivity window before the sweeper drains the store and exits
    pub idle_timeout: Duration,
    /// Invalidation group, `None` disables the invalidation listener
    pub multicast: Option<MulticastConfig>,
    /// Default TTL in seconds for entries stored through the admin API
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SWEEP_INTERVAL_SECS` - Seconds between sweep passes (default: 60)
    /// - `IDLE_TIMEOUT_SECS` - Idle seconds before the sweeper stops (default: 3600)
    /// - `CACHE_MULTICAST_ADDR` - Invalidation multicast group (default: unset)
    /// - `CACHE_MULTICAST_PORT` - Invalidation multicast port (default: unset)
    /// - `DEFAULT_TTL` - Default TTL in seconds for the admin API (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unparsable values are logged and replaced by their default. The
    /// multicast listener is only enabled when both address and port are set.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let group = parse_var::<IpAddr>("CACHE_MULTICAST_ADDR");
        let port = parse_var::<u16>("CACHE_MULTICAST_PORT");
        let multicast = match (group, port) {
            (Some(group), Some(port)) => Some(MulticastConfig { group, port }),
            _ => None,
        };

        Self {
            sweep_interval: parse_var("SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            idle_timeout: parse_var("IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            multicast,
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Overrides the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Overrides the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Enables the invalidation listener on the given group and port.
    pub fn with_multicast(mut self, group: IpAddr, port: u16) -> Self {
        self.multicast = Some(MulticastConfig { group, port });
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            multicast: None,
            default_ttl: 300,
            server_port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value {:?} for {}", raw, name);
            None
        }
    }
}
