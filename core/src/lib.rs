//! Synchronous client for the TonicPow affiliate-marketing API.
//!
//! # Overview
//! `Client` authenticates with an API key, keeps the session token the API
//! hands out, and exposes typed operations on goals, conversions, users,
//! campaigns and advertiser profiles. Each operation validates its required
//! fields, sends one JSON request, accepts exactly one status code, and
//! decodes the response.
//!
//! # Design
//! - Each operation has a `build_*` half that produces an `HttpRequest`
//!   without I/O; `parse_response` is the matching pure decoder. The
//!   executing methods glue the two around a `Transport`.
//! - `UreqTransport` is the default transport; anything implementing
//!   `Transport` can replace it.
//! - Errors are never retried. Validation errors are raised before any
//!   request is sent.
//!
//! ```no_run
//! use tonicpow_core::{Client, ClientConfig, Environment};
//!
//! # fn main() -> Result<(), tonicpow_core::ApiError> {
//! let mut client = Client::connect(ClientConfig::new("your-api-key", Environment::Staging))?;
//! let conversion = client.convert_goal_by_goal_id(13, "visitor-session-guid", "")?;
//! println!("created conversion {}", conversion.id);
//! client.end_session(None)?;
//! # Ok(())
//! # }
//! ```

pub mod campaigns;
pub mod client;
pub mod config;
pub mod conversions;
pub mod error;
pub mod goals;
pub mod http;
pub mod transport;
pub mod types;
pub mod users;

#[cfg(test)]
mod testing;

pub use client::{check_status, parse_response, Client, LastRequest};
pub use config::{ClientConfig, Environment};
pub use conversions::ConversionRequest;
pub use error::{ApiError, ApiErrorBody};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{AdvertiserProfile, Campaign, Conversion, Goal, User};
