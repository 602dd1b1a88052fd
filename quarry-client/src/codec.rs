//! JSON codec bound to a processor registry.

use crate::error::{DecodeError, Error, Result};
use crate::registry::{self, ProcessorRegistry};
use quarry_transport::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Encodes request bodies and decodes reply bodies.
///
/// Decoding resolves processor discriminators against the codec's registry
/// snapshot rather than the process-wide one.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<ProcessorRegistry>,
}

impl Codec {
    /// Codec over the given registry.
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    /// Codec over the process-wide registry.
    pub fn global() -> Self {
        Self::new(ProcessorRegistry::global())
    }

    /// The registry consulted when decoding.
    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    /// Serialize a value to JSON bytes.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| Error::validation(format!("request body could not be encoded: {}", e)))
    }

    /// Serialize a value to a JSON tree.
    pub fn encode_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        serde_json::to_value(value)
            .map_err(|e| Error::validation(format!("request body could not be encoded: {}", e)))
    }

    /// Deserialize JSON bytes into `T`.
    ///
    /// A processor discriminator refused by the registry yields
    /// [`Error::UnknownVariant`]; any other mismatch yields [`Error::Decode`].
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let _scope = registry::enter(self.registry.clone());
        serde_json::from_slice(bytes).map_err(|e| classify::<T>(e))
    }

    /// Deserialize a JSON tree into `T`.
    pub fn decode_value<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
        let _scope = registry::enter(self.registry.clone());
        serde_json::from_value(value).map_err(|e| classify::<T>(e))
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::global()
    }
}

fn classify<T>(source: serde_json::Error) -> Error {
    match registry::take_rejected() {
        Some(name) => Error::UnknownVariant { name },
        None => {
            warn!(
                shape = std::any::type_name::<T>(),
                error = %source,
                "Reply did not match the expected shape"
            );
            Error::Decode(DecodeError::new::<T>(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::processor::Processor;
    use crate::registry::UnknownProcessorPolicy;
    use serde_json::json;

    fn strict() -> Codec {
        Codec::new(Arc::new(
            ProcessorRegistry::builder()
                .unknown_processors(UnknownProcessorPolicy::Reject)
                .build(),
        ))
    }

    #[test]
    fn test_encode_omits_unset_fields() {
        let codec = Codec::new(Arc::new(ProcessorRegistry::builtin()));
        let processors = crate::processor::ProcessorsBuilder::new()
            .uppercase(|p| p.field("state"))
            .into_vec();

        let bytes = codec.encode(&processors).unwrap();
        assert_eq!(&bytes[..], br#"[{"uppercase":{"field":"state"}}]"#);
    }

    #[test]
    fn test_reject_yields_unknown_variant() {
        let err = strict()
            .decode::<Vec<Processor>>(br#"[{"geoip":{"field":"ip"}}]"#)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownVariant);
        assert!(matches!(err, Error::UnknownVariant { name } if name == "geoip"));
    }

    #[test]
    fn test_preserve_uses_codec_registry() {
        let codec = Codec::new(Arc::new(ProcessorRegistry::builtin()));
        let processors = codec
            .decode::<Vec<Processor>>(br#"[{"geoip":{"field":"ip"}}]"#)
            .unwrap();
        assert_eq!(processors[0].name(), "geoip");
    }

    #[test]
    fn test_shape_mismatch_yields_decode() {
        let err = strict()
            .decode::<Vec<Processor>>(br#"{"not":"an array"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = strict().decode::<Vec<Processor>>(b"not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_value() {
        let codec = strict();
        let processors: Vec<Processor> = codec
            .decode_value(json!([{ "trim": { "field": "a" } }]))
            .unwrap();
        assert_eq!(processors[0].name(), "trim");

        let err = codec
            .decode_value::<Vec<Processor>>(json!([{ "kv": {} }]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    }
}
