// Quarry - typed dispatch and processor codec for search engine HTTP APIs
//
// This library re-exports the client and its transport seam under one name.

// Re-export the client
pub use quarry_client::*;

// Re-export the transport crate for custom transports
pub use quarry_transport;
