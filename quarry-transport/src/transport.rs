//! The transport seam.

use crate::{RawResponse, Result, TransportCall};
use async_trait::async_trait;

/// A transport that completes an exchange by blocking the calling thread.
pub trait Transport: Send + Sync {
    /// Perform the exchange described by `call`.
    ///
    /// Any reply, including an error status, is `Ok`; `Err` means the
    /// exchange itself did not complete.
    fn perform(&self, call: TransportCall) -> Result<RawResponse>;
}

/// A transport that completes an exchange by suspending the calling task.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Send the exchange described by `call`.
    ///
    /// Same success/failure contract as [`Transport::perform`].
    async fn send(&self, call: TransportCall) -> Result<RawResponse>;
}
