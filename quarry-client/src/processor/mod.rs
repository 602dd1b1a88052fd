//! Ingest processors.
//!
//! On the wire a processor is an object with a single key, its
//! discriminator, whose value holds the kind-specific fields:
//!
//! ```json
//! [
//!   { "uppercase": { "field": "state" } },
//!   { "set": { "field": "numberOfCommits", "value": 0 } }
//! ]
//! ```
//!
//! Encoding takes the discriminator from the variant. Decoding reads the key
//! and hands the body to the [registry](crate::registry) in scope, which
//! picks the concrete kind or applies its unknown-processor policy.

mod kinds;

pub use kinds::{
    AppendProcessor, ConvertProcessor, ConvertType, DateProcessor, FailProcessor, GsubProcessor,
    JoinProcessor, LowercaseProcessor, RemoveProcessor, RenameProcessor, SetProcessor,
    SplitProcessor, TrimProcessor, UppercaseProcessor,
};

use crate::registry::{self, ProcessorShape};
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::any::Any;

/// A typed processor kind with a fixed discriminator.
pub trait ProcessorKind: Serialize + DeserializeOwned + Into<Processor> {
    /// Wire discriminator, unique across the registry.
    const NAME: &'static str;
}

/// Options every processor kind accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorCommon {
    /// Identifier for this processor in errors and stats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Condition script; the processor runs only when it holds.
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Swallow failures of this processor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_failure: Option<bool>,
    /// Processors run when this one fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Vec<Processor>>,
}

/// Fluent setters for [`ProcessorCommon`].
pub trait ProcessorOptions: Sized {
    /// Mutable access to the common options.
    fn common_mut(&mut self) -> &mut ProcessorCommon;

    /// Set the tag.
    fn tag(mut self, tag: impl Into<String>) -> Self {
        self.common_mut().tag = Some(tag.into());
        self
    }

    /// Set the `if` condition.
    fn condition(mut self, script: impl Into<String>) -> Self {
        self.common_mut().condition = Some(script.into());
        self
    }

    /// Set `ignore_failure`.
    fn ignore_failure(mut self, ignore: bool) -> Self {
        self.common_mut().ignore_failure = Some(ignore);
        self
    }

    /// Replace the failure handlers.
    fn on_failure(mut self, build: impl FnOnce(ProcessorsBuilder) -> ProcessorsBuilder) -> Self {
        self.common_mut().on_failure = Some(build(ProcessorsBuilder::new()).into_vec());
        self
    }
}

/// A processor carried by discriminator and raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericProcessor {
    /// Discriminator.
    pub name: String,
    /// Body exactly as received.
    pub body: Value,
}

impl GenericProcessor {
    /// Create a generic processor.
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

macro_rules! processor_kinds {
    ($($variant:ident($ty:ident) => $name:literal,)+) => {
        /// One configured step of an ingest pipeline.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Processor {
            $(
                #[doc = concat!("`", $name, "` processor.")]
                $variant($ty),
            )+
            /// Kind outside the typed catalog, carried opaquely.
            Other(GenericProcessor),
        }

        $(
            impl ProcessorKind for $ty {
                const NAME: &'static str = $name;
            }

            impl From<$ty> for Processor {
                fn from(processor: $ty) -> Self {
                    Processor::$variant(processor)
                }
            }

            impl ProcessorOptions for $ty {
                fn common_mut(&mut self) -> &mut ProcessorCommon {
                    &mut self.common
                }
            }
        )+

        impl Processor {
            /// The discriminator.
            pub fn name(&self) -> &str {
                match self {
                    $(Processor::$variant(_) => <$ty as ProcessorKind>::NAME,)+
                    Processor::Other(p) => &p.name,
                }
            }

            /// Common options, for typed kinds.
            pub fn common(&self) -> Option<&ProcessorCommon> {
                match self {
                    $(Processor::$variant(p) => Some(&p.common),)+
                    Processor::Other(_) => None,
                }
            }

            fn as_any(&self) -> &dyn Any {
                match self {
                    $(Processor::$variant(p) => p,)+
                    Processor::Other(p) => p,
                }
            }

            fn serialize_entry<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
                match self {
                    $(Processor::$variant(p) => map.serialize_entry(<$ty as ProcessorKind>::NAME, p),)+
                    Processor::Other(p) => map.serialize_entry(&p.name, &p.body),
                }
            }
        }

        /// Shapes of every typed kind.
        pub(crate) fn builtin_shapes() -> Vec<ProcessorShape> {
            vec![$(ProcessorShape::of::<$ty>(),)+]
        }
    };
}

processor_kinds! {
    Append(AppendProcessor) => "append",
    Convert(ConvertProcessor) => "convert",
    Date(DateProcessor) => "date",
    Fail(FailProcessor) => "fail",
    Gsub(GsubProcessor) => "gsub",
    Join(JoinProcessor) => "join",
    Lowercase(LowercaseProcessor) => "lowercase",
    Remove(RemoveProcessor) => "remove",
    Rename(RenameProcessor) => "rename",
    Set(SetProcessor) => "set",
    Split(SplitProcessor) => "split",
    Trim(TrimProcessor) => "trim",
    Uppercase(UppercaseProcessor) => "uppercase",
}

impl Processor {
    /// Borrow as a typed kind.
    pub fn as_kind<P: ProcessorKind + 'static>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }
}

impl Serialize for Processor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        self.serialize_entry(&mut map)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Processor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        let mut entries = object.into_iter();

        let (name, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(D::Error::custom(
                    "a processor must be an object with exactly one key",
                ));
            }
        };

        registry::active()
            .decode(&name, body)
            .map_err(D::Error::custom)
    }
}

/// Builds an ordered processor list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessorsBuilder(Vec<Processor>);

impl ProcessorsBuilder {
    /// Start an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a processor.
    pub fn add(mut self, processor: impl Into<Processor>) -> Self {
        self.0.push(processor.into());
        self
    }

    /// Append a processor of kind `P` configured by `configure`.
    pub fn with<P>(self, configure: impl FnOnce(P) -> P) -> Self
    where
        P: ProcessorKind + Default,
    {
        self.add(configure(P::default()))
    }

    /// Append an `append` processor.
    pub fn append(self, configure: impl FnOnce(AppendProcessor) -> AppendProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `convert` processor.
    pub fn convert(self, configure: impl FnOnce(ConvertProcessor) -> ConvertProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `date` processor.
    pub fn date(self, configure: impl FnOnce(DateProcessor) -> DateProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `fail` processor.
    pub fn fail(self, configure: impl FnOnce(FailProcessor) -> FailProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `gsub` processor.
    pub fn gsub(self, configure: impl FnOnce(GsubProcessor) -> GsubProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `join` processor.
    pub fn join(self, configure: impl FnOnce(JoinProcessor) -> JoinProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `lowercase` processor.
    pub fn lowercase(self, configure: impl FnOnce(LowercaseProcessor) -> LowercaseProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `remove` processor.
    pub fn remove(self, configure: impl FnOnce(RemoveProcessor) -> RemoveProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `rename` processor.
    pub fn rename(self, configure: impl FnOnce(RenameProcessor) -> RenameProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `set` processor.
    pub fn set(self, configure: impl FnOnce(SetProcessor) -> SetProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `split` processor.
    pub fn split(self, configure: impl FnOnce(SplitProcessor) -> SplitProcessor) -> Self {
        self.with(configure)
    }

    /// Append a `trim` processor.
    pub fn trim(self, configure: impl FnOnce(TrimProcessor) -> TrimProcessor) -> Self {
        self.with(configure)
    }

    /// Append an `uppercase` processor.
    pub fn uppercase(self, configure: impl FnOnce(UppercaseProcessor) -> UppercaseProcessor) -> Self {
        self.with(configure)
    }

    /// The processors, in insertion order.
    pub fn into_vec(self) -> Vec<Processor> {
        self.0
    }
}

impl From<ProcessorsBuilder> for Vec<Processor> {
    fn from(builder: ProcessorsBuilder) -> Self {
        builder.into_vec()
    }
}
