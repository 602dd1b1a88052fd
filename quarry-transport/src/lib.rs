//! # quarry transport
//!
//! The narrow exchange contract the quarry client depends on: a call goes
//! out as verb, path, query parameters and an optional JSON body, and comes
//! back as a status with raw bytes, or as a [`TransportError`] when the
//! exchange could not complete.
//!
//! - [`Transport`] blocks the calling thread.
//! - [`AsyncTransport`] suspends the calling task.
//! - [`HttpTransport`] implements both over reqwest.
//! - [`StubTransport`] implements both in memory for tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_transport::{AsyncTransport, HttpTransport, Method, TransportCall, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(
//!         TransportConfig::builder()
//!             .base_url("http://localhost:9200")
//!             .build(),
//!     )?;
//!
//!     let response = transport
//!         .send(TransportCall::new(Method::Get, "_ingest/pipeline/logs"))
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod call;
mod client;
mod config;
mod error;
mod response;
mod stub;
mod transport;

pub use call::{Method, TransportCall};
pub use client::HttpTransport;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use error::{Result, TransportError};
pub use response::RawResponse;
pub use stub::{StubReply, StubTransport};
pub use transport::{AsyncTransport, Transport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, StatusCode};
pub use url::Url;
