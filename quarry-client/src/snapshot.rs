//! Snapshot repository endpoints.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::names::{Id, Names};
use crate::params::{RequestParams, timeouts};
use crate::response::AcknowledgedResponse;
use quarry_transport::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Storage backend of a snapshot repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepositoryKind {
    /// Shared file system.
    Fs,
    /// Read-only URL.
    Url,
    /// Any other backend, typically provided by a plugin (`s3`, `azure`, ...).
    Other(String),
}

impl RepositoryKind {
    /// Wire name.
    pub fn as_str(&self) -> &str {
        match self {
            RepositoryKind::Fs => "fs",
            RepositoryKind::Url => "url",
            RepositoryKind::Other(name) => name,
        }
    }
}

impl From<String> for RepositoryKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "fs" => RepositoryKind::Fs,
            "url" => RepositoryKind::Url,
            _ => RepositoryKind::Other(name),
        }
    }
}

impl From<&str> for RepositoryKind {
    fn from(name: &str) -> Self {
        RepositoryKind::from(name.to_string())
    }
}

impl From<RepositoryKind> for String {
    fn from(kind: RepositoryKind) -> Self {
        match kind {
            RepositoryKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot repository registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRepository {
    /// Backend.
    #[serde(rename = "type")]
    pub kind: RepositoryKind,
    /// Backend-specific settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl SnapshotRepository {
    /// Repository of `kind` with no settings.
    pub fn new(kind: impl Into<RepositoryKind>) -> Self {
        Self {
            kind: kind.into(),
            settings: Map::new(),
        }
    }

    /// Shared file system repository rooted at `location`.
    pub fn fs(location: impl Into<String>) -> Self {
        Self::new(RepositoryKind::Fs).setting("location", Value::String(location.into()))
    }

    /// Read-only repository served from `url`.
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(RepositoryKind::Url).setting("url", Value::String(url.into()))
    }

    /// Set a backend setting.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Compress metadata files.
    pub fn compress(self, compress: bool) -> Self {
        self.setting("compress", compress)
    }

    /// Split large files into chunks, e.g. `1gb`.
    pub fn chunk_size(self, size: impl Into<String>) -> Self {
        self.setting("chunk_size", Value::String(size.into()))
    }

    /// Look up a setting.
    pub fn get_setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}

/// Register a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRepositoryRequest {
    name: Id,
    repository: SnapshotRepository,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
    verify: Option<bool>,
}

impl CreateRepositoryRequest {
    /// Register `repository` as `name`.
    pub fn new(name: Id, repository: SnapshotRepository) -> Self {
        Self {
            name,
            repository,
            master_timeout: None,
            timeout: None,
            verify: None,
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

    /// Whether the cluster verifies the repository on every node.
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    /// Repository name.
    pub fn name(&self) -> &Id {
        &self.name
    }

    /// Repository registration.
    pub fn repository(&self) -> &SnapshotRepository {
        &self.repository
    }
}

impl Endpoint for CreateRepositoryRequest {
    const NAME: &'static str = "snapshot.create_repository";
    const METHOD: Method = Method::Put;
    type Response = AcknowledgedResponse;
    type Body = SnapshotRepository;

    fn path(&self) -> String {
        format!("_snapshot/{}", self.name)
    }

    fn params(&self) -> RequestParams {
        let mut params = timeouts(self.master_timeout, self.timeout);
        if let Some(verify) = self.verify {
            params.set_bool("verify", verify);
        }
        params
    }

    fn body(&self) -> Option<&SnapshotRepository> {
        Some(&self.repository)
    }
}

/// Fluent builder for [`CreateRepositoryRequest`].
#[derive(Debug, Clone)]
pub struct CreateRepositoryDescriptor {
    name: String,
    repository: Option<SnapshotRepository>,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
    verify: Option<bool>,
}

impl CreateRepositoryDescriptor {
    /// Start describing repository `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository: None,
            master_timeout: None,
            timeout: None,
            verify: None,
        }
    }

    /// Set the registration.
    pub fn repository(mut self, repository: SnapshotRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Use a shared file system repository rooted at `location`.
    pub fn fs(self, location: impl Into<String>) -> Self {
        self.repository(SnapshotRepository::fs(location))
    }

    /// Use a read-only URL repository.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.repository(SnapshotRepository::url(url))
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

    /// Whether the cluster verifies the repository on every node.
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    /// Validate and snapshot into a request.
    pub fn build(&self) -> Result<CreateRepositoryRequest> {
        let name = Id::new(self.name.clone())?;
        let repository = self.repository.clone().ok_or_else(|| {
            Error::validation(format!("repository `{}` needs a type and settings", name))
        })?;

        Ok(CreateRepositoryRequest {
            name,
            repository,
            master_timeout: self.master_timeout,
            timeout: self.timeout,
            verify: self.verify,
        })
    }
}

/// Fetch repository registrations.
#[derive(Debug, Clone, PartialEq)]
pub struct GetRepositoryRequest {
    names: Names,
    master_timeout: Option<Duration>,
    local: Option<bool>,
}

impl GetRepositoryRequest {
    /// Fetch the repositories named by `names`.
    pub fn new(names: impl Into<Names>) -> Self {
        Self {
            names: names.into(),
            master_timeout: None,
            local: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Read from the local node instead of the master.
    pub fn local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    /// Requested names.
    pub fn names(&self) -> &Names {
        &self.names
    }
}

impl Endpoint for GetRepositoryRequest {
    const NAME: &'static str = "snapshot.get_repository";
    const METHOD: Method = Method::Get;
    type Response = GetRepositoryResponse;
    type Body = ();

    fn path(&self) -> String {
        format!("_snapshot/{}", self.names)
    }

    fn params(&self) -> RequestParams {
        let mut params = timeouts(self.master_timeout, None);
        if let Some(local) = self.local {
            params.set_bool("local", local);
        }
        params
    }
}

/// Fluent builder for [`GetRepositoryRequest`].
#[derive(Debug, Clone)]
pub struct GetRepositoryDescriptor {
    names: Vec<String>,
    master_timeout: Option<Duration>,
    local: Option<bool>,
}

impl GetRepositoryDescriptor {
    /// Start describing a fetch of `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            master_timeout: None,
            local: None,
        }
    }

    /// Set how long to wait for the master node.
    pub fn master_timeout(mut self, timeout: Duration) -> Self {
        self.master_timeout = Some(timeout);
        self
    }

    /// Read from the local node instead of the master.
    pub fn local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    /// Validate and snapshot into a request.
    pub fn build(&self) -> Result<GetRepositoryRequest> {
        Ok(GetRepositoryRequest {
            names: Names::new(self.names.iter().cloned())?,
            master_timeout: self.master_timeout,
            local: self.local,
        })
    }
}

/// Repositories by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GetRepositoryResponse {
    /// Registrations keyed by repository name.
    pub repositories: BTreeMap<String, SnapshotRepository>,
}

impl GetRepositoryResponse {
    /// Registration of repository `name`.
    pub fn get(&self, name: &str) -> Option<&SnapshotRepository> {
        self.repositories.get(name)
    }

    /// Number of repositories returned.
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Whether no repository was returned.
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// Unregister one or more repositories. Snapshots stay in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRepositoryRequest {
    names: Names,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl DeleteRepositoryRequest {
    /// Unregister the repositories named by `names`.
    pub fn new(names: impl Into<Names>) -> Self {
        Self {
            names: names.into(),
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

    /// Targeted names.
    pub fn names(&self) -> &Names {
        &self.names
    }
}

impl Endpoint for DeleteRepositoryRequest {
    const NAME: &'static str = "snapshot.delete_repository";
    const METHOD: Method = Method::Delete;
    type Response = AcknowledgedResponse;
    type Body = ();

    fn path(&self) -> String {
        format!("_snapshot/{}", self.names)
    }

    fn params(&self) -> RequestParams {
        timeouts(self.master_timeout, self.timeout)
    }
}

/// Fluent builder for [`DeleteRepositoryRequest`].
#[derive(Debug, Clone)]
pub struct DeleteRepositoryDescriptor {
    names: Vec<String>,
    master_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl DeleteRepositoryDescriptor {
    /// Start describing a delete of `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
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
    pub fn build(&self) -> Result<DeleteRepositoryRequest> {
        Ok(DeleteRepositoryRequest {
            names: Names::new(self.names.iter().cloned())?,
            master_timeout: self.master_timeout,
            timeout: self.timeout,
        })
    }
}
