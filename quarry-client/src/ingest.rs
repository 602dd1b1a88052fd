//! Ingest pipeline endpoints.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::names::{Id, Names};
use crate::params::{RequestParams, timeouts};
use crate::processor::{Processor, ProcessorsBuilder};
use crate::response::AcknowledgedResponse;
use quarry_transport::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Definition of an ingest pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Processors, run in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processors: Option<Vec<Processor>>,
    /// Processors run when a processor fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Vec<Processor>>,
    /// User-assigned version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl PipelineConfig {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the processors.
    pub fn processors(mut self, build: impl FnOnce(ProcessorsBuilder) -> ProcessorsBuilder) -> Self {
        self.processors = Some(build(ProcessorsBuilder::new()).into_vec());
        self
    }

    /// Replace the failure handlers.
    pub fn on_failure(mut self, build: impl FnOnce(ProcessorsBuilder) -> ProcessorsBuilder) -> Self {
        self.on_failure = Some(build(ProcessorsBuilder::new()).into_vec());
        self
    }

    /// Set the version.
    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Processors, empty when unset.
    pub fn processor_list(&self) -> &[Processor] {
        self.processors.as_deref().unwrap_or_default()
    }
}

/// Create or replace a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PutPipelineRequest {
    id: Id,
    pipeline: PipelineConfig,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl PutPipelineRequest {
    /// Store `pipeline` under `id`.
    pub fn new(id: Id, pipeline: PipelineConfig) -> Self {
        Self {
            id,
            pipeline,
            master_timeout: None,
            timeout: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Set how long to wait for the acknowledgement.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pipeline id.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Pipeline definition.
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }
}

impl Endpoint for PutPipelineRequest {
    const NAME: &'static str = "ingest.put_pipeline";
    const METHOD: Method = Method::Put;
    type Response = AcknowledgedResponse;
    type Body = PipelineConfig;

    fn path(&self) -> String {
        format!("_ingest/pipeline/{}", self.id)
    }

    fn params(&self) -> RequestParams {
        timeouts(self.master_timeout, self.timeout)
    }

    fn body(&self) -> Option<&PipelineConfig> {
        Some(&self.pipeline)
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.processors.is_none() {
            return Err(Error::validation(format!(
                "pipeline `{}` must declare its processors",
                self.id
            )));
        }
        Ok(())
    }
}

/// Fluent builder for [`PutPipelineRequest`].
#[derive(Debug, Clone)]
pub struct PutPipelineDescriptor {
    id: String,
    pipeline: PipelineConfig,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl PutPipelineDescriptor {
    /// Start describing pipeline `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pipeline: PipelineConfig::default(),
            master_timeout: None,
            timeout: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.pipeline = self.pipeline.description(description);
        self
    }

    /// Replace the processors.
    pub fn processors(mut self, build: impl FnOnce(ProcessorsBuilder) -> ProcessorsBuilder) -> Self {
        self.pipeline = self.pipeline.processors(build);
        self
    }

    /// Replace the failure handlers.
    pub fn on_failure(mut self, build: impl FnOnce(ProcessorsBuilder) -> ProcessorsBuilder) -> Self {
        self.pipeline = self.pipeline.on_failure(build);
        self
    }

    /// Set the version.
    pub fn version(mut self, version: i64) -> Self {
        self.pipeline = self.pipeline.version(version);
        self
    }

    /// Replace the whole definition.
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Set how long to wait for the acknowledgement.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate and snapshot into a request. The descriptor stays usable.
    pub fn build(&self) -> Result<PutPipelineRequest> {
        Ok(PutPipelineRequest {
            id: Id::new(self.id.clone())?,
            pipeline: self.pipeline.clone(),
            master_timeout: self.master_timeout,
            timeout: self.timeout,
        })
    }
}

/// Fetch one or more pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct GetPipelineRequest {
    ids: Names,
    master_timeout: Option<Duration>,
}

impl GetPipelineRequest {
    /// Fetch the pipelines named by `ids`.
    pub fn new(ids: impl Into<Names>) -> Self {
        Self {
            ids: ids.into(),
            master_timeout: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Requested ids.
    pub fn ids(&self) -> &Names {
        &self.ids
    }
}

impl Endpoint for GetPipelineRequest {
    const NAME: &'static str = "ingest.get_pipeline";
    const METHOD: Method = Method::Get;
    type Response = GetPipelineResponse;
    type Body = ();

    fn path(&self) -> String {
        format!("_ingest/pipeline/{}", self.ids)
    }

    fn params(&self) -> RequestParams {
        timeouts(self.master_timeout, None)
    }
}

/// Fluent builder for [`GetPipelineRequest`].
#[derive(Debug, Clone)]
pub struct GetPipelineDescriptor {
    ids: Vec<String>,
    master_timeout: Option<Duration>,
}

impl GetPipelineDescriptor {
    /// Start describing a fetch of `ids`.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            master_timeout: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Validate and snapshot into a request.
    pub fn build(&self) -> Result<GetPipelineRequest> {
        Ok(GetPipelineRequest {
            ids: Names::new(self.ids.iter().cloned())?,
            master_timeout: self.master_timeout,
        })
    }
}

/// Pipelines by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GetPipelineResponse {
    /// Definitions keyed by pipeline id.
    pub pipelines: BTreeMap<String, PipelineConfig>,
}

impl GetPipelineResponse {
    /// Definition of pipeline `id`.
    pub fn get(&self, id: &str) -> Option<&PipelineConfig> {
        self.pipelines.get(id)
    }

    /// Number of pipelines returned.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Whether no pipeline was returned.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Iterate over `(id, definition)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PipelineConfig)> {
        self.pipelines.iter().map(|(id, p)| (id.as_str(), p))
    }
}

/// Delete one or more pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePipelineRequest {
    ids: Names,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl DeletePipelineRequest {
    /// Delete the pipelines named by `ids`.
    pub fn new(ids: impl Into<Names>) -> Self {
        Self {
            ids: ids.into(),
            master_timeout: None,
            timeout: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Set how long to wait for the acknowledgement.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Targeted ids.
    pub fn ids(&self) -> &Names {
        &self.ids
    }
}

impl Endpoint for DeletePipelineRequest {
    const NAME: &'static str = "ingest.delete_pipeline";
    const METHOD: Method = Method::Delete;
    type Response = AcknowledgedResponse;
    type Body = ();

    fn path(&self) -> String {
        format!("_ingest/pipeline/{}", self.ids)
    }

    fn params(&self) -> RequestParams {
        timeouts(self.master_timeout, self.timeout)
    }
}

/// Fluent builder for [`DeletePipelineRequest`].
#[derive(Debug, Clone)]
pub struct DeletePipelineDescriptor {
    ids: Vec<String>,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl DeletePipelineDescriptor {
    /// Start describing a delete of `ids`.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            master_timeout: None,
            timeout: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Set how long to wait for the acknowledgement.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate and snapshot into a request.
    pub fn build(&self) -> Result<DeletePipelineRequest> {
        Ok(DeletePipelineRequest {
            ids: Names::new(self.ids.iter().cloned())?,
            master_timeout: self.master_timeout,
            timeout: self.timeout,
        })
    }
}
