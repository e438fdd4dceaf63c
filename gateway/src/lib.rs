//! # Orderwire Gateway
//!
//! A stateless reverse proxy that gives external clients one entry point to
//! the orderwire services. Requests whose path matches a configured prefix
//! are forwarded to the mapped backend with method, headers (minus
//! hop-by-hop), and a streamed body; the backend's status, headers, and body
//! come back to the caller unmodified. Unmatched paths return 404, and a
//! backend that cannot be reached at all returns 502.
//!
//! The routing table is injected configuration, not compiled-in addresses:
//!
//! ```
//! use orderwire_gateway::{RouteTable, gateway_router};
//!
//! let table = RouteTable::new()
//!     .route("/orders", "http://127.0.0.1:8081")
//!     .route("/accounts", "http://127.0.0.1:8082");
//! let app = gateway_router(table);
//! ```
//!
//! The proxy performs no retries, circuit-breaking, or load distribution;
//! each prefix maps to a single static backend address.

pub mod proxy;
pub mod routes;

pub use proxy::gateway_router;
pub use routes::RouteTable;
