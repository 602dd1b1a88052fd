//! Typed endpoint routing.

use crate::error::Result;
use crate::params::RequestParams;
use quarry_transport::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A request bound to one API endpoint.
///
/// The associated [`Response`](Endpoint::Response) fixes the reply type at
/// compile time, so a request can only be dispatched into the shape its
/// endpoint returns.
pub trait Endpoint: Send + Sync {
    /// Name used in logs, e.g. `ingest.put_pipeline`.
    const NAME: &'static str;

    /// HTTP verb.
    const METHOD: Method;

    /// Decoded reply.
    type Response: DeserializeOwned + Send;

    /// Request body. Endpoints without one use `()`.
    type Body: Serialize + Send + Sync;

    /// Path relative to the base URL, with targets rendered.
    fn path(&self) -> String;

    /// Query parameters.
    fn params(&self) -> RequestParams {
        RequestParams::new()
    }

    /// Request body, if any.
    fn body(&self) -> Option<&Self::Body> {
        None
    }

    /// Checks run before anything is sent.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
