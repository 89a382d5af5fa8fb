//! Monitoring API abstraction layer.
//!
//! Provides a trait-based interface over the REST backend:
//! - `HttpApi` talks to the real server with reqwest
//! - `MockApi` keeps everything in memory for tests and offline demos

pub mod http;
pub mod mock;
pub mod traits;

pub use http::{HttpApi, HttpApiConfig};
pub use mock::{MockApi, MockOp};
pub use traits::DashboardApi;
