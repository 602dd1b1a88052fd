//! In-memory transport for tests.

use crate::{AsyncTransport, RawResponse, Result, Transport, TransportCall, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// What a [`StubTransport`] does with every call.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Reply with a status and body.
    Respond {
        /// HTTP status code.
        status: u16,
        /// Raw body.
        body: String,
    },
    /// Fail the exchange with a connectivity fault.
    Fail(String),
    /// Never complete. Blocking calls fail with a timeout instead.
    Hang,
}

/// Transport double that records calls and replies from a script.
///
/// Clones share the same call log.
#[derive(Debug, Clone)]
pub struct StubTransport {
    reply: Arc<Mutex<StubReply>>,
    calls: Arc<Mutex<Vec<TransportCall>>>,
}

impl StubTransport {
    /// Create a stub that always answers with `reply`.
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every call with `status` and a JSON body.
    pub fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::new(StubReply::Respond {
            status,
            body: body.into(),
        })
    }

    /// Fail every call with a connection error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(StubReply::Fail(message.into()))
    }

    /// Never complete async calls.
    pub fn hanging() -> Self {
        Self::new(StubReply::Hang)
    }

    /// Replace the scripted reply for subsequent calls.
    pub fn set_reply(&self, reply: StubReply) {
        *self.reply.lock() = reply;
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// All calls received, oldest first.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// The most recent call.
    pub fn last_call(&self) -> Option<TransportCall> {
        self.calls.lock().last().cloned()
    }

    fn record(&self, call: TransportCall) -> StubReply {
        self.calls.lock().push(call);
        self.reply.lock().clone()
    }
}

fn fault(message: String) -> TransportError {
    TransportError::Stub(message)
}

impl Transport for StubTransport {
    fn perform(&self, call: TransportCall) -> Result<RawResponse> {
        match self.record(call) {
            StubReply::Respond { status, body } => Ok(RawResponse::from_status(status, body)),
            StubReply::Fail(message) => Err(fault(message)),
            StubReply::Hang => Err(TransportError::Timeout(std::time::Duration::ZERO)),
        }
    }
}

#[async_trait]
impl AsyncTransport for StubTransport {
    async fn send(&self, call: TransportCall) -> Result<RawResponse> {
        match self.record(call) {
            StubReply::Respond { status, body } => Ok(RawResponse::from_status(status, body)),
            StubReply::Fail(message) => Err(fault(message)),
            StubReply::Hang => std::future::pending().await,
        }
    }
}
