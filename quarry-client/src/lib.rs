//! Typed request dispatch and ingest processor codec for search engine HTTP
//! APIs.
//!
//! This crate provides:
//! - Ingest pipeline management (put, get, delete)
//! - Snapshot repository management (create, get, delete)
//! - Blocking and async call surfaces sharing one dispatch routine
//! - A processor codec that round-trips every built-in processor kind and
//!   carries unknown kinds through unchanged
//!
//! # Example
//!
//! ```rust,no_run
//! use quarry_client::{ClientConfig, SearchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SearchClient::new(ClientConfig::new("http://localhost:9200"))?;
//!
//!     client
//!         .put_pipeline_async("project-pipeline", |d| {
//!             d.description("Project Pipeline").processors(|ps| {
//!                 ps.uppercase(|u| u.field("state"))
//!                     .set(|s| s.field("numberOfCommits").value(0))
//!             })
//!         })
//!         .await?;
//!
//!     let pipelines = client
//!         .get_pipeline_async(["project-pipeline"], |d| d)
//!         .await?;
//!     println!("{:?}", pipelines.get("project-pipeline"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Extending the processor catalog
//!
//! Processor kinds outside the built-in catalog decode as
//! [`Processor::Other`] by default. Register them at startup, or switch the
//! registry to reject them:
//!
//! ```rust
//! use quarry_client::{ProcessorRegistry, ProcessorShape, UnknownProcessorPolicy};
//!
//! let registry = ProcessorRegistry::builder()
//!     .register(ProcessorShape::generic("geoip"))?
//!     .unknown_processors(UnknownProcessorPolicy::Reject)
//!     .build();
//!
//! assert!(registry.contains("geoip"));
//! # Ok::<(), quarry_client::RegistryError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod codec;
mod config;
mod dispatcher;
mod endpoint;
mod error;
mod field;
mod ingest;
mod names;
mod params;
mod processor;
mod registry;
mod response;
mod snapshot;

pub use client::SearchClient;
pub use codec::Codec;
pub use config::ClientConfig;
pub use dispatcher::{CallOptions, Dispatcher};
pub use endpoint::Endpoint;
pub use error::{DecodeError, Error, ErrorCause, ErrorKind, Result, ServerError};
pub use field::{DocumentField, Field};
pub use ingest::{
    DeletePipelineDescriptor, DeletePipelineRequest, GetPipelineDescriptor, GetPipelineRequest,
    GetPipelineResponse, PipelineConfig, PutPipelineDescriptor, PutPipelineRequest,
};
pub use names::{Id, Names};
pub use params::{RequestParams, time_value};
pub use processor::{
    AppendProcessor, ConvertProcessor, ConvertType, DateProcessor, FailProcessor,
    GenericProcessor, GsubProcessor, JoinProcessor, LowercaseProcessor, Processor,
    ProcessorCommon, ProcessorKind, ProcessorOptions, ProcessorsBuilder, RemoveProcessor,
    RenameProcessor, SetProcessor, SplitProcessor, TrimProcessor, UppercaseProcessor,
};
pub use registry::{
    DecodeFn, ProcessorRegistry, ProcessorShape, RegistryBuilder, RegistryError,
    UnknownProcessorPolicy, name_of,
};
pub use response::AcknowledgedResponse;
pub use snapshot::{
    CreateRepositoryDescriptor, CreateRepositoryRequest, DeleteRepositoryDescriptor,
    DeleteRepositoryRequest, GetRepositoryDescriptor, GetRepositoryRequest,
    GetRepositoryResponse, RepositoryKind, SnapshotRepository,
};

// Re-export the transport seam
pub use quarry_transport::{
    AsyncTransport, HttpTransport, Method, RawResponse, StubReply, StubTransport, Transport,
    TransportCall, TransportConfig, TransportError,
};
pub use quarry_transport::Result as TransportResult;
pub use tokio_util::sync::CancellationToken;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AcknowledgedResponse, CallOptions, CancellationToken, ClientConfig, DocumentField,
        Endpoint, Error, ErrorKind, Field, PipelineConfig, Processor, ProcessorOptions,
        ProcessorRegistry, Result, SearchClient, SnapshotRepository, UnknownProcessorPolicy,
    };
}
