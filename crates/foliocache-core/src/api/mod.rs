//! REST transport seam for the content API.
//!
//! The cache core talks to the backend through the `Transport` trait, which
//! returns a uniform `ApiResponse` envelope for every verb. `HttpTransport`
//! is the production implementation over reqwest; tests substitute a scripted
//! double.

pub mod error;
pub mod http;
pub mod transport;

pub use error::ApiError;
pub use http::HttpTransport;
pub use transport::{ApiResponse, Transport};
