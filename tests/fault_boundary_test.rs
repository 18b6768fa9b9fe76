use assert_matches::assert_matches;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use symbol_shim::config::SettingsHandle;
use symbol_shim::fault::{BoxError, Fault, FaultBoundary, FaultClassifier, FaultKind};

#[derive(Debug)]
struct PluginInitError {
    plugin: &'static str,
    source: Fault,
}

impl fmt::Display for PluginInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "插件 {} 初始化失敗", self.plugin)
    }
}

impl Error for PluginInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

fn boundary() -> FaultBoundary {
    FaultBoundary::new(
        Arc::new(FaultClassifier::with_defaults()),
        SettingsHandle::new(),
    )
}

#[test]
fn test_wrapped_error_classified_by_root() {
    let boundary = boundary();
    let error = PluginInitError {
        plugin: "create",
        source: Fault::new(FaultKind::InitializationFailure, "registry"),
    };

    let entry = boundary.classify(&error).unwrap();
    assert_eq!(entry.kind, FaultKind::InitializationFailure);
    assert!(boundary.run_guarded(move || Err(error), "loading create"));
}

#[test]
fn test_default_returned_only_on_fault() {
    let boundary = boundary();

    assert_eq!(
        boundary.run_guarded_with_default(|| Ok::<_, BoxError>(42), "ok", 0),
        42
    );
    assert_eq!(
        boundary.run_guarded_with_default(
            || Err::<i32, _>(Fault::new(FaultKind::IllegalAccess, "private")),
            "suppressed",
            7,
        ),
        7
    );
    assert_eq!(
        boundary.run_guarded_with_default(
            || -> Result<i32, BoxError> { panic!("unclassified") },
            "panicking",
            -1,
        ),
        -1
    );
}

#[test]
fn test_none_unwrap_is_suppressed_null_dereference() {
    let boundary = boundary();
    let missing: Option<&str> = None;

    let handled = boundary.run_guarded(
        || {
            let _ = missing.unwrap();
            Ok::<(), BoxError>(())
        },
        "reading screen title",
    );
    assert!(handled);
}

#[test]
fn test_override_link_incompatibility() {
    let mut classifier = FaultClassifier::with_defaults();
    classifier.register(
        FaultKind::LinkIncompatibility,
        "LinkIncompatibility",
        "surface real breaks",
        false,
    );
    let boundary = FaultBoundary::new(Arc::new(classifier), SettingsHandle::new());

    let outcome = boundary.try_guarded(
        || Err::<(), _>(Fault::new(FaultKind::Verification, "bad bytes")),
        "verifying",
    );
    assert_matches!(outcome, Err(fault) if fault.to_string().contains("bad bytes"));
    assert!(boundary.run_guarded(
        || Err(Fault::new(FaultKind::MissingTypeDefinition, "Screen")),
        "still registered",
    ));
}

#[test]
fn test_io_errors_propagate() {
    let boundary = boundary();
    let outcome = boundary.try_guarded(
        || std::fs::read("/nonexistent/symbol-shim/stub.bin"),
        "reading stub",
    );
    assert_matches!(outcome, Err(_));
}
