//! Request dispatch.
//!
//! Both call surfaces run the same private routine, which turns a
//! request into a [`TransportCall`], hands it to a send capability and turns
//! the reply into the endpoint's response. The blocking surface supplies a
//! capability that performs the exchange synchronously and returns a ready
//! future, then drives the routine with `futures::executor::block_on`. The
//! async surface supplies one that awaits the transport under the caller's
//! cancellation token and deadline.

use crate::codec::Codec;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result, ServerError};
use quarry_transport::{AsyncTransport, RawResponse, Transport, TransportCall};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cancellation and deadline applied to an async call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    cancellation: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl CallOptions {
    /// No cancellation and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the call when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Abandon the call when the exchange takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// The deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Marshals requests through a transport and decodes typed responses.
///
/// Holds no per-call state; clones share the codec's registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    codec: Codec,
}

impl Dispatcher {
    /// Dispatcher decoding with `codec`.
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// The codec.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Dispatch on the calling thread.
    ///
    /// Blocks until the exchange completes. Do not call from inside an async
    /// runtime when the transport blocks on network I/O.
    pub fn dispatch<E, T>(&self, request: E, transport: &T) -> Result<E::Response>
    where
        E: Endpoint,
        T: Transport + ?Sized,
    {
        futures::executor::block_on(self.execute(request, |call| {
            std::future::ready(transport.perform(call).map_err(Error::from))
        }))
    }

    /// Dispatch without blocking the calling task.
    pub async fn dispatch_async<E, T>(
        &self,
        request: E,
        transport: &T,
        options: &CallOptions,
    ) -> Result<E::Response>
    where
        E: Endpoint,
        T: AsyncTransport + ?Sized,
    {
        self.execute(request, |call| async move {
            let exchange = async move { transport.send(call).await.map_err(Error::from) };
            guarded(exchange, options).await
        })
        .await
    }

    async fn execute<E, F, Fut>(&self, request: E, send: F) -> Result<E::Response>
    where
        E: Endpoint,
        F: FnOnce(TransportCall) -> Fut,
        Fut: Future<Output = Result<RawResponse>>,
    {
        let call = self.prepare(&request)?;
        drop(request);

        debug!(
            endpoint = E::NAME,
            method = %call.method,
            path = %call.path,
            "Dispatching request"
        );

        let response = match send(call).await {
            Ok(response) => response,
            Err(error) => {
                warn!(endpoint = E::NAME, error = %error, "Exchange did not complete");
                return Err(error);
            }
        };

        self.complete::<E>(response)
    }

    fn prepare<E: Endpoint>(&self, request: &E) -> Result<TransportCall> {
        request.validate()?;

        let mut call = TransportCall::new(E::METHOD, request.path());
        call.query = request.params().to_pairs();

        if let Some(body) = request.body() {
            if !E::METHOD.accepts_body() {
                return Err(Error::validation(format!(
                    "{} requests cannot carry a body ({})",
                    E::METHOD,
                    E::NAME
                )));
            }
            call.body = Some(self.codec.encode(body)?);
        }

        Ok(call)
    }

    fn complete<E: Endpoint>(&self, response: RawResponse) -> Result<E::Response> {
        let status = response.status();
        debug!(endpoint = E::NAME, status = status.as_u16(), "Received reply");

        if !response.is_success() {
            let error = ServerError::from_reply(status.as_u16(), response.bytes());
            debug!(
                endpoint = E::NAME,
                status = error.status,
                reason = error.reason().unwrap_or_default(),
                "Service reported an error"
            );
            return Err(error.into());
        }

        self.codec.decode::<E::Response>(response.bytes())
    }
}

async fn guarded<F>(exchange: F, options: &CallOptions) -> Result<RawResponse>
where
    F: Future<Output = Result<RawResponse>>,
{
    let bounded = async {
        match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(timeout = ?limit, "Call deadline elapsed");
                    Err(Error::Cancelled)
                }
            },
            None => exchange.await,
        }
    };

    match &options.cancellation {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Call cancelled");
                Err(Error::Cancelled)
            }
            result = bounded => result,
        },
        None => bounded.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::ingest::{GetPipelineDescriptor, PutPipelineDescriptor};
    use crate::params::RequestParams;
    use crate::processor::Processor;
    use crate::registry::{ProcessorRegistry, UnknownProcessorPolicy};
    use crate::response::AcknowledgedResponse;
    use quarry_transport::{Method, StubTransport};
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready_err, task};

    const PIPELINE: &str = r#"{"p":{"processors":[{"uppercase":{"field":"state"}},{"geoip":{"field":"ip"}}]}}"#;

    fn put() -> crate::ingest::PutPipelineRequest {
        PutPipelineDescriptor::new("p")
            .description("d")
            .processors(|ps| ps.uppercase(|u| u.field("state")))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    struct GetWithBody(serde_json::Value);

    impl Endpoint for GetWithBody {
        const NAME: &'static str = "test.get_with_body";
        const METHOD: Method = Method::Get;
        type Response = AcknowledgedResponse;
        type Body = serde_json::Value;

        fn path(&self) -> String {
            "_test".to_string()
        }

        fn params(&self) -> RequestParams {
            RequestParams::new()
        }

        fn body(&self) -> Option<&serde_json::Value> {
            Some(&self.0)
        }
    }

    #[tokio::test]
    async fn test_dispatch_symmetry() {
        let dispatcher = Dispatcher::default();
        let blocking = StubTransport::respond(200, r#"{"acknowledged":true}"#);
        let nonblocking = StubTransport::respond(200, r#"{"acknowledged":true}"#);

        let a = dispatcher.dispatch(put(), &blocking).unwrap();
        let b = dispatcher
            .dispatch_async(put(), &nonblocking, &CallOptions::new())
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(blocking.calls(), nonblocking.calls());

        let call = blocking.last_call().unwrap();
        assert_eq!(call.method, Method::Put);
        assert_eq!(call.path, "_ingest/pipeline/p");
        assert_eq!(call.query_param("timeout"), Some("5s"));
        assert_eq!(
            call.body_text(),
            Some(r#"{"description":"d","processors":[{"uppercase":{"field":"state"}}]}"#)
        );
    }

    #[test]
    fn test_not_found_is_server_error() {
        let stub = StubTransport::respond(
            404,
            r#"{"error":{"type":"resource_not_found_exception","reason":"pipeline [p] is missing"},"status":404}"#,
        );
        let request = GetPipelineDescriptor::new(["p"]).build().unwrap();

        let err = Dispatcher::default().dispatch(request, &stub).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status_code(), Some(404));
        match err {
            Error::Server(e) => assert_eq!(e.reason(), Some("pipeline [p] is missing")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connectivity_fault_is_transport_error() {
        let stub = StubTransport::failing("connection refused");

        let err = Dispatcher::default()
            .dispatch_async(put(), &stub, &CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_body_on_get_rejected_before_transport() {
        let stub = StubTransport::respond(200, r#"{"acknowledged":true}"#);

        let err = Dispatcher::default()
            .dispatch(GetWithBody(serde_json::json!({})), &stub)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn test_failed_validation_skips_transport() {
        let stub = StubTransport::respond(200, r#"{"acknowledged":true}"#);
        let request = PutPipelineDescriptor::new("p").build().unwrap();

        let err = Dispatcher::default().dispatch(request, &stub).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn test_undecodable_reply_is_decode_error() {
        let stub = StubTransport::respond(200, r#"{"ack":"maybe"}"#);
        let err = Dispatcher::default().dispatch(put(), &stub).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_registry_policy_applies_to_replies() {
        let stub = StubTransport::respond(200, PIPELINE);
        let request = || GetPipelineDescriptor::new(["p"]).build().unwrap();

        let lenient = Dispatcher::new(Codec::new(Arc::new(ProcessorRegistry::builtin())));
        let response = lenient.dispatch(request(), &stub).unwrap();
        let processors = response.get("p").unwrap().processor_list();
        assert!(matches!(&processors[1], Processor::Other(p) if p.name == "geoip"));

        let strict = Dispatcher::new(Codec::new(Arc::new(
            ProcessorRegistry::builder()
                .unknown_processors(UnknownProcessorPolicy::Reject)
                .build(),
        )));
        let err = strict.dispatch(request(), &stub).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { ref name } if name == "geoip"));
    }

    #[tokio::test]
    async fn test_cancelled_before_exchange() {
        let stub = StubTransport::respond(200, r#"{"acknowledged":true}"#);
        let token = CancellationToken::new();
        token.cancel();

        let err = Dispatcher::default()
            .dispatch_async(put(), &stub, &CallOptions::new().with_cancellation(token))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn test_cancelled_during_exchange() {
        let stub = StubTransport::hanging();
        let token = CancellationToken::new();
        let options = CallOptions::new().with_cancellation(token.clone());
        let dispatcher = Dispatcher::default();

        let mut call = task::spawn(dispatcher.dispatch_async(put(), &stub, &options));
        assert_pending!(call.poll());
        assert_eq!(stub.call_count(), 1);

        token.cancel();
        assert!(call.is_woken());
        let err = assert_ready_err!(call.poll());
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_cancellation() {
        let stub = StubTransport::hanging();
        let options = CallOptions::new().with_timeout(Duration::from_secs(5));

        let err = Dispatcher::default()
            .dispatch_async(put(), &stub, &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
