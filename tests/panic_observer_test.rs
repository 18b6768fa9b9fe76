// 全域 panic hook 影響整個測試行程，因此獨立成一個測試檔
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use symbol_shim::config::SettingsHandle;
use symbol_shim::fault::{
    install_panic_observer, observer, Fault, FaultBoundary, FaultClassifier, FaultKind,
    FaultReport, FaultReporter,
};

// 每次被呼叫都會 panic 的記錄器
#[derive(Default)]
struct ExplodingReporter {
    calls: AtomicUsize,
}

impl FaultReporter for ExplodingReporter {
    fn report(&self, _report: &FaultReport<'_>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("reporter exploded");
    }
}

#[test]
fn test_observer_survives_failing_reporter() {
    let reporter = Arc::new(ExplodingReporter::default());
    let boundary = Arc::new(
        FaultBoundary::new(
            Arc::new(FaultClassifier::with_defaults()),
            SettingsHandle::new(),
        )
        .with_reporter(reporter.clone()),
    );

    assert!(install_panic_observer(boundary.clone()));
    assert!(!install_panic_observer(boundary.clone()));
    assert!(observer::is_installed());

    // 受保護呼叫內的 panic 由邊界回報；記錄器失敗不影響抑制判定
    let guarded = boundary.clone();
    let suppressed = thread::spawn(move || {
        guarded.run_guarded(
            || -> Result<(), Fault> { panic::panic_any(Fault::missing_reference("gfx.Screen")) },
            "guarded render",
        )
    })
    .join()
    .unwrap();
    assert!(suppressed);
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(observer::observed_count(), 0);

    // 受保護範圍之外的 panic 由觀察器處理，不經過記錄器
    let result = thread::Builder::new()
        .name("plugin-worker".to_string())
        .spawn(|| panic::panic_any(Fault::new(FaultKind::IllegalAccess, "sealed field")))
        .unwrap()
        .join();
    assert!(result.is_err());
    assert_eq!(observer::observed_count(), 1);
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);

    // 行程仍可繼續運作
    assert!(boundary.run_guarded(|| Ok::<(), Fault>(()), "after worker death"));
}
