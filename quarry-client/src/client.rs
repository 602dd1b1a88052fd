//! Search engine client.

use crate::codec::Codec;
use crate::config::ClientConfig;
use crate::dispatcher::{CallOptions, Dispatcher};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::ingest::{
    DeletePipelineDescriptor, GetPipelineDescriptor, GetPipelineResponse, PutPipelineDescriptor,
};
use crate::registry::ProcessorRegistry;
use crate::response::AcknowledgedResponse;
use crate::snapshot::{
    CreateRepositoryDescriptor, DeleteRepositoryDescriptor, GetRepositoryDescriptor,
    GetRepositoryResponse,
};
use quarry_transport::{AsyncTransport, HttpTransport, Transport};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Client for ingest pipeline and snapshot repository APIs.
///
/// Every operation comes as a blocking method and an `_async` twin, and both
/// go through the same [`Dispatcher`]. Clones share the transport.
pub struct SearchClient<T = HttpTransport> {
    transport: Arc<T>,
    dispatcher: Dispatcher,
    options: CallOptions,
}

impl SearchClient<HttpTransport> {
    /// Create a client over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        info!(url = %config.url, "Initializing search client");

        let transport = HttpTransport::new(config.transport_config())
            .map_err(|e| Error::Config(format!("cannot build transport: {}", e)))?;

        let mut client = Self::with_transport(transport);
        if let Some(timeout) = config.call_timeout {
            client.options = client.options.with_timeout(timeout);
        }
        Ok(client)
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T> SearchClient<T> {
    /// Create a client over any transport, decoding with the global registry.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            dispatcher: Dispatcher::new(Codec::global()),
            options: CallOptions::new(),
        }
    }

    /// Decode with `registry` instead of the global registry.
    pub fn with_registry(mut self, registry: Arc<ProcessorRegistry>) -> Self {
        self.dispatcher = Dispatcher::new(Codec::new(registry));
        self
    }

    /// A clone whose async calls are abandoned when `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut client = self.clone();
        client.options = client.options.with_cancellation(token);
        client
    }

    /// A clone whose async calls are abandoned after `timeout`.
    pub fn with_call_timeout(&self, timeout: Duration) -> Self {
        let mut client = self.clone();
        client.options = client.options.with_timeout(timeout);
        client
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The registry used to decode replies.
    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        self.dispatcher.codec().registry()
    }

    /// Options applied to async calls.
    pub fn call_options(&self) -> &CallOptions {
        &self.options
    }
}

impl<T> Clone for SearchClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            dispatcher: self.dispatcher.clone(),
            options: self.options.clone(),
        }
    }
}

impl<T> fmt::Debug for SearchClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchClient")
            .field("dispatcher", &self.dispatcher)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> SearchClient<T> {
    /// Dispatch any request, blocking the calling thread.
    pub fn execute<E: Endpoint>(&self, request: E) -> Result<E::Response> {
        self.dispatcher.dispatch(request, self.transport.as_ref())
    }

    /// Create or replace pipeline `id`.
    pub fn put_pipeline(
        &self,
        id: impl Into<String>,
        configure: impl FnOnce(PutPipelineDescriptor) -> PutPipelineDescriptor,
    ) -> Result<AcknowledgedResponse> {
        self.execute(configure(PutPipelineDescriptor::new(id)).build()?)
    }

    /// Fetch pipelines by id.
    pub fn get_pipeline<I, S>(
        &self,
        ids: I,
        configure: impl FnOnce(GetPipelineDescriptor) -> GetPipelineDescriptor,
    ) -> Result<GetPipelineResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute(configure(GetPipelineDescriptor::new(ids)).build()?)
    }

    /// Delete pipelines by id.
    pub fn delete_pipeline<I, S>(
        &self,
        ids: I,
        configure: impl FnOnce(DeletePipelineDescriptor) -> DeletePipelineDescriptor,
    ) -> Result<AcknowledgedResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute(configure(DeletePipelineDescriptor::new(ids)).build()?)
    }

    /// Register snapshot repository `name`.
    pub fn create_repository(
        &self,
        name: impl Into<String>,
        configure: impl FnOnce(CreateRepositoryDescriptor) -> CreateRepositoryDescriptor,
    ) -> Result<AcknowledgedResponse> {
        self.execute(configure(CreateRepositoryDescriptor::new(name)).build()?)
    }

    /// Fetch snapshot repositories by name.
    pub fn get_repository<I, S>(
        &self,
        names: I,
        configure: impl FnOnce(GetRepositoryDescriptor) -> GetRepositoryDescriptor,
    ) -> Result<GetRepositoryResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute(configure(GetRepositoryDescriptor::new(names)).build()?)
    }

    /// Unregister snapshot repositories by name.
    pub fn delete_repository<I, S>(
        &self,
        names: I,
        configure: impl FnOnce(DeleteRepositoryDescriptor) -> DeleteRepositoryDescriptor,
    ) -> Result<AcknowledgedResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute(configure(DeleteRepositoryDescriptor::new(names)).build()?)
    }
}

impl<T: AsyncTransport> SearchClient<T> {
    /// Dispatch any request without blocking.
    pub async fn execute_async<E: Endpoint>(&self, request: E) -> Result<E::Response> {
        self.dispatcher
            .dispatch_async(request, self.transport.as_ref(), &self.options)
            .await
    }

    /// Create or replace pipeline `id`.
    pub async fn put_pipeline_async(
        &self,
        id: impl Into<String>,
        configure: impl FnOnce(PutPipelineDescriptor) -> PutPipelineDescriptor,
    ) -> Result<AcknowledgedResponse> {
        let request = configure(PutPipelineDescriptor::new(id)).build()?;
        self.execute_async(request).await
    }

    /// Fetch pipelines by id.
    pub async fn get_pipeline_async<I, S>(
        &self,
        ids: I,
        configure: impl FnOnce(GetPipelineDescriptor) -> GetPipelineDescriptor,
    ) -> Result<GetPipelineResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = configure(GetPipelineDescriptor::new(ids)).build()?;
        self.execute_async(request).await
    }

    /// Delete pipelines by id.
    pub async fn delete_pipeline_async<I, S>(
        &self,
        ids: I,
        configure: impl FnOnce(DeletePipelineDescriptor) -> DeletePipelineDescriptor,
    ) -> Result<AcknowledgedResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = configure(DeletePipelineDescriptor::new(ids)).build()?;
        self.execute_async(request).await
    }

    /// Register snapshot repository `name`.
    pub async fn create_repository_async(
        &self,
        name: impl Into<String>,
        configure: impl FnOnce(CreateRepositoryDescriptor) -> CreateRepositoryDescriptor,
    ) -> Result<AcknowledgedResponse> {
        let request = configure(CreateRepositoryDescriptor::new(name)).build()?;
        self.execute_async(request).await
    }

    /// Fetch snapshot repositories by name.
    pub async fn get_repository_async<I, S>(
        &self,
        names: I,
        configure: impl FnOnce(GetRepositoryDescriptor) -> GetRepositoryDescriptor,
    ) -> Result<GetRepositoryResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = configure(GetRepositoryDescriptor::new(names)).build()?;
        self.execute_async(request).await
    }

    /// Unregister snapshot repositories by name.
    pub async fn delete_repository_async<I, S>(
        &self,
        names: I,
        configure: impl FnOnce(DeleteRepositoryDescriptor) -> DeleteRepositoryDescriptor,
    ) -> Result<AcknowledgedResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = configure(DeleteRepositoryDescriptor::new(names)).build()?;
        self.execute_async(request).await
    }
}
