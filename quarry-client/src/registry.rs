//! Processor variant registry.
//!
//! Maps discriminators to decoders. The built-in processor kinds are always
//! present; further kinds are added with [`RegistryBuilder::register`] before
//! the registry is built. A built registry is an immutable snapshot, shared
//! through `Arc` and read without locking.
//!
//! One registry is process-wide ([`ProcessorRegistry::global`]). It can be
//! replaced exactly once, at startup and before the first decode, with
//! [`RegistryBuilder::install`]. Clients may also be handed their own snapshot.

use crate::processor::{GenericProcessor, Processor, ProcessorKind, builtin_shapes};
use serde::de::Error as _;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Decoder from a processor body to a [`Processor`].
///
/// Receives the discriminator alongside the body so that generic kinds can
/// keep it.
pub type DecodeFn = fn(&str, Value) -> Result<Processor, serde_json::Error>;

/// What to do with a discriminator that is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownProcessorPolicy {
    /// Carry it as [`Processor::Other`]; it re-encodes unchanged.
    #[default]
    Preserve,
    /// Fail the decode with `UnknownVariant`.
    Reject,
}

/// Registration failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Discriminator registered twice.
    #[error("processor `{0}` is already registered")]
    Duplicate(String),

    /// The global registry was already installed or already in use.
    #[error("the global processor registry is already installed")]
    AlreadyInstalled,
}

/// A discriminator and its decoder.
#[derive(Clone)]
pub struct ProcessorShape {
    name: String,
    decode: DecodeFn,
}

fn decode_kind<P: ProcessorKind>(_name: &str, body: Value) -> Result<Processor, serde_json::Error> {
    serde_json::from_value::<P>(body).map(Into::into)
}

fn decode_generic(name: &str, body: Value) -> Result<Processor, serde_json::Error> {
    Ok(Processor::Other(GenericProcessor::new(name, body)))
}

impl ProcessorShape {
    /// Shape of a typed processor kind.
    pub fn of<P: ProcessorKind>() -> Self {
        Self {
            name: P::NAME.to_string(),
            decode: decode_kind::<P>,
        }
    }

    /// A kind accepted under any policy and carried as [`Processor::Other`].
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decode: decode_generic,
        }
    }

    /// A kind with a custom decoder.
    pub fn custom(name: impl Into<String>, decode: DecodeFn) -> Self {
        Self {
            name: name.into(),
            decode,
        }
    }

    /// The discriminator.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ProcessorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorShape")
            .field("name", &self.name)
            .finish()
    }
}

/// The discriminator of a processor kind.
pub fn name_of<P: ProcessorKind>() -> &'static str {
    P::NAME
}

/// Immutable discriminator table.
#[derive(Debug)]
pub struct ProcessorRegistry {
    shapes: HashMap<String, ProcessorShape>,
    policy: UnknownProcessorPolicy,
}

static GLOBAL: OnceLock<Arc<ProcessorRegistry>> = OnceLock::new();

impl ProcessorRegistry {
    /// Builder seeded with the built-in kinds.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry with only the built-in kinds and the default policy.
    pub fn builtin() -> Self {
        RegistryBuilder::new().build()
    }

    /// The process-wide registry.
    ///
    /// The first call freezes it; a later [`RegistryBuilder::install`] fails.
    pub fn global() -> Arc<ProcessorRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(ProcessorRegistry::builtin()))
            .clone()
    }

    /// Look up a discriminator.
    pub fn lookup(&self, name: &str) -> Option<&ProcessorShape> {
        self.shapes.get(name)
    }

    /// Whether a discriminator is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Registered discriminators, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shapes.keys().map(String::as_str)
    }

    /// Policy for unregistered discriminators.
    pub fn policy(&self) -> UnknownProcessorPolicy {
        self.policy
    }

    /// Decode one processor body under its discriminator.
    pub fn decode(&self, name: &str, body: Value) -> Result<Processor, serde_json::Error> {
        if let Some(shape) = self.shapes.get(name) {
            return (shape.decode)(name, body);
        }

        match self.policy {
            UnknownProcessorPolicy::Preserve => {
                debug!(processor = name, "Preserving unregistered processor");
                Ok(Processor::Other(GenericProcessor::new(name, body)))
            }
            UnknownProcessorPolicy::Reject => {
                warn!(processor = name, "Rejecting unregistered processor");
                note_rejected(name);
                Err(serde_json::Error::custom(format!(
                    "unknown processor type `{}`",
                    name
                )))
            }
        }
    }
}

/// Accumulates shapes and settings for a [`ProcessorRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    shapes: HashMap<String, ProcessorShape>,
    policy: UnknownProcessorPolicy,
}

impl RegistryBuilder {
    /// Builder seeded with the built-in kinds.
    pub fn new() -> Self {
        let shapes = builtin_shapes()
            .into_iter()
            .map(|shape| (shape.name.clone(), shape))
            .collect();

        Self {
            shapes,
            policy: UnknownProcessorPolicy::default(),
        }
    }

    /// Add a shape. Registering a discriminator twice is an error.
    pub fn register(mut self, shape: ProcessorShape) -> Result<Self, RegistryError> {
        if self.shapes.contains_key(&shape.name) {
            return Err(RegistryError::Duplicate(shape.name));
        }
        debug!(processor = %shape.name, "Registered processor kind");
        self.shapes.insert(shape.name.clone(), shape);
        Ok(self)
    }

    /// Add a typed kind.
    pub fn register_kind<P: ProcessorKind>(self) -> Result<Self, RegistryError> {
        self.register(ProcessorShape::of::<P>())
    }

    /// Set the policy for unregistered discriminators.
    pub fn unknown_processors(mut self, policy: UnknownProcessorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Freeze into a registry.
    pub fn build(self) -> ProcessorRegistry {
        ProcessorRegistry {
            shapes: self.shapes,
            policy: self.policy,
        }
    }

    /// Freeze and install as the process-wide registry.
    pub fn install(self) -> Result<Arc<ProcessorRegistry>, RegistryError> {
        let registry = Arc::new(self.build());
        GLOBAL
            .set(registry.clone())
            .map_err(|_| RegistryError::AlreadyInstalled)?;
        Ok(registry)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Registry used by `Processor`'s Deserialize impl on this thread. Decoding is
// synchronous, so a scope never spans an await point.
thread_local! {
    static ACTIVE: RefCell<Option<Arc<ProcessorRegistry>>> = const { RefCell::new(None) };
    static REJECTED: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Restores the previously active registry on drop.
pub(crate) struct RegistryScope {
    previous: Option<Arc<ProcessorRegistry>>,
}

/// Make `registry` the one consulted by decodes on this thread.
pub(crate) fn enter(registry: Arc<ProcessorRegistry>) -> RegistryScope {
    REJECTED.with(|r| r.borrow_mut().take());
    let previous = ACTIVE.with(|a| a.borrow_mut().replace(registry));
    RegistryScope { previous }
}

impl Drop for RegistryScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|a| *a.borrow_mut() = previous);
    }
}

/// The registry in scope, or the global one.
pub(crate) fn active() -> Arc<ProcessorRegistry> {
    ACTIVE
        .with(|a| a.borrow().clone())
        .unwrap_or_else(ProcessorRegistry::global)
}

fn note_rejected(name: &str) {
    REJECTED.with(|r| {
        let mut rejected = r.borrow_mut();
        if rejected.is_none() {
            *rejected = Some(name.to_string());
        }
    });
}

/// Discriminator rejected since the scope was entered, if any.
pub(crate) fn take_rejected() -> Option<String> {
    REJECTED.with(|r| r.borrow_mut().take())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{RenameProcessor, SetProcessor, UppercaseProcessor};
    use serde_json::json;

    #[test]
    fn test_builtin_kinds_registered() {
        let registry = ProcessorRegistry::builtin();
        for name in ["uppercase", "set", "rename", "remove", "convert", "date", "fail"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert_eq!(registry.policy(), UnknownProcessorPolicy::Preserve);
    }

    #[test]
    fn test_builtin_names_unique() {
        let shapes = builtin_shapes();
        let registry = ProcessorRegistry::builtin();
        assert_eq!(shapes.len(), registry.names().count());
    }

    #[test]
    fn test_name_of() {
        assert_eq!(name_of::<UppercaseProcessor>(), "uppercase");
        assert_eq!(name_of::<SetProcessor>(), "set");
        assert_eq!(name_of::<RenameProcessor>(), "rename");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let err = ProcessorRegistry::builder()
            .register(ProcessorShape::generic("set"))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("set".to_string()));

        let err = ProcessorRegistry::builder()
            .register(ProcessorShape::generic("geoip"))
            .and_then(|b| b.register(ProcessorShape::generic("geoip")))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("geoip".to_string()));
    }

    #[test]
    fn test_generic_kind_accepted_under_reject() {
        let registry = ProcessorRegistry::builder()
            .register(ProcessorShape::generic("geoip"))
            .unwrap()
            .unknown_processors(UnknownProcessorPolicy::Reject)
            .build();

        let processor = registry
            .decode("geoip", json!({ "field": "ip" }))
            .unwrap();
        assert_eq!(processor.name(), "geoip");

        assert!(registry.decode("user_agent", json!({})).is_err());
    }

    #[test]
    fn test_scope_restores_previous() {
        let strict = Arc::new(
            ProcessorRegistry::builder()
                .unknown_processors(UnknownProcessorPolicy::Reject)
                .build(),
        );
        {
            let _scope = enter(strict.clone());
            assert_eq!(active().policy(), UnknownProcessorPolicy::Reject);
            assert!(active().decode("nope", json!({})).is_err());
            assert_eq!(take_rejected().as_deref(), Some("nope"));
        }
        assert!(!Arc::ptr_eq(&active(), &strict));
    }
}
