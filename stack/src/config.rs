//! Configuration for the orderwire stack.
//!
//! Loads configuration from environment variables with sensible defaults for
//! local runs.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Stack configuration loaded from environment variables.
///
/// | Variable | Default | Meaning |
/// |---|---|---|
/// | `ORDERWIRE_GATEWAY_ADDR` | `0.0.0.0:8080` | Gateway listen address |
/// | `ORDERWIRE_ORDERS_ADDR` | `127.0.0.1:8081` | Order service listen address |
/// | `ORDERWIRE_PAYMENTS_ADDR` | `127.0.0.1:8082` | Payment service listen address |
/// | `ORDERWIRE_OUTBOX_POLL_MS` | `500` | Outbox publisher poll interval |
/// | `ORDERWIRE_SETTLE_POLL_MS` | `500` | Settlement processor poll interval |
#[derive(Clone, Debug)]
pub struct Config {
    /// Gateway listen address.
    pub gateway_addr: SocketAddr,
    /// Order service listen address.
    pub orders_addr: SocketAddr,
    /// Payment service listen address.
    pub payments_addr: SocketAddr,
    /// Outbox publisher poll interval.
    pub outbox_poll: Duration,
    /// Settlement processor poll interval.
    pub settle_poll: Duration,
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            gateway_addr: addr_var("ORDERWIRE_GATEWAY_ADDR", ([0, 0, 0, 0], 8080).into()),
            orders_addr: addr_var("ORDERWIRE_ORDERS_ADDR", ([127, 0, 0, 1], 8081).into()),
            payments_addr: addr_var("ORDERWIRE_PAYMENTS_ADDR", ([127, 0, 0, 1], 8082).into()),
            outbox_poll: millis_var("ORDERWIRE_OUTBOX_POLL_MS", 500),
            settle_poll: millis_var("ORDERWIRE_SETTLE_POLL_MS", 500),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn addr_var(name: &str, default: SocketAddr) -> SocketAddr {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn millis_var(name: &str, default: u64) -> Duration {
    let millis = env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default);
    Duration::from_millis(millis)
}
