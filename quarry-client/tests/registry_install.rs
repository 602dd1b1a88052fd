//! Installing the process-wide registry. Lives in its own test binary since
//! installation can happen only once per process.

use quarry_client::{
    Codec, ErrorKind, Processor, ProcessorRegistry, ProcessorShape, RegistryBuilder,
    RegistryError, UnknownProcessorPolicy,
};
use std::sync::Arc;

#[test]
fn test_install_once() {
    let installed = RegistryBuilder::new()
        .register(ProcessorShape::generic("geoip"))
        .unwrap()
        .unknown_processors(UnknownProcessorPolicy::Reject)
        .install()
        .unwrap();

    assert!(Arc::ptr_eq(&installed, &ProcessorRegistry::global()));

    let err = RegistryBuilder::new().install().unwrap_err();
    assert_eq!(err, RegistryError::AlreadyInstalled);

    let codec = Codec::global();
    let processors: Vec<Processor> = codec
        .decode(br#"[{"geoip":{"field":"ip"}}]"#)
        .unwrap();
    assert_eq!(processors[0].name(), "geoip");

    let err = codec
        .decode::<Vec<Processor>>(br#"[{"user_agent":{"field":"ua"}}]"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
}
