use crate::config::SettingsHandle;
use crate::fault::classifier::{cause_chain, root_cause, FaultClassification, FaultClassifier};
use crate::fault::error::{BoxError, Fault};
use crate::fault::observer::GuardScope;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 交給記錄器的故障報告
#[derive(Debug, Clone)]
pub struct FaultReport<'a> {
    /// 發生故障時正在進行的工作
    pub context: &'a str,
    /// 命中的分類；`None` 表示未分類
    pub classification: Option<&'a FaultClassification>,
    /// 根因訊息
    pub root_message: String,
    /// 完整成因鏈（僅在啟用時提供）
    pub cause_chain: Option<Vec<String>>,
    /// 代替結果回傳的預設值
    pub default_value: Option<String>,
}

/// 故障記錄器
pub trait FaultReporter: Send + Sync {
    fn report(&self, report: &FaultReport<'_>);
}

/// 以 tracing 輸出的預設記錄器
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FaultReporter for TracingReporter {
    fn report(&self, report: &FaultReport<'_>) {
        match report.classification {
            Some(entry) => warn!(
                "{} 發生於 {}: {} - {}",
                entry.label, report.context, report.root_message, entry.description
            ),
            None => error!(
                "{} 期間發生未處理的故障: {}",
                report.context, report.root_message
            ),
        }

        if let Some(chain) = &report.cause_chain {
            for (depth, cause) in chain.iter().enumerate() {
                debug!("  成因[{}]: {}", depth, cause);
            }
        }

        if let Some(default_value) = &report.default_value {
            info!("使用預設值: {}", default_value);
        }
    }
}

/// 故障邊界
///
/// 執行任意操作，將其中的 `Err` 與 panic 攔截、分類並依配置記錄，
/// 再由分類條目的 `suppress` 旗標決定呼叫端是否可以繼續。
pub struct FaultBoundary {
    classifier: Arc<FaultClassifier>,
    settings: SettingsHandle,
    reporter: Arc<dyn FaultReporter>,
}

impl fmt::Debug for FaultBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultBoundary")
            .field("classifier", &self.classifier)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl FaultBoundary {
    pub fn new(classifier: Arc<FaultClassifier>, settings: SettingsHandle) -> Self {
        Self {
            classifier,
            settings,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// 替換記錄器
    pub fn with_reporter(mut self, reporter: Arc<dyn FaultReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn classifier(&self) -> &FaultClassifier {
        &self.classifier
    }

    /// 是否依配置記錄故障
    pub fn logs_exceptions(&self) -> bool {
        self.settings.log_exceptions()
    }

    /// 分類故障
    pub fn classify(&self, fault: &(dyn Error + 'static)) -> Option<&FaultClassification> {
        self.classifier.classify(fault)
    }

    /// 執行操作並攔截其故障，不做任何記錄
    pub fn catch<T, E, F>(op: F) -> Result<T, BoxError>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<BoxError>,
    {
        let _scope = GuardScope::enter();
        match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.into()),
            Err(payload) => Err(Box::new(Fault::from_panic(payload.as_ref()))),
        }
    }

    /// 執行操作；成功回傳 `true`，故障時回傳分類的抑制判定
    pub fn run_guarded<E, F>(&self, op: F, context: &str) -> bool
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<BoxError>,
    {
        match Self::catch(op) {
            Ok(()) => true,
            Err(fault) => self.handle(fault.as_ref(), context, None),
        }
    }

    /// 執行有回傳值的操作；故障時回傳 `default`
    pub fn run_guarded_with_default<T, E, F>(&self, op: F, context: &str, default: T) -> T
    where
        T: fmt::Debug,
        F: FnOnce() -> Result<T, E>,
        E: Into<BoxError>,
    {
        match Self::catch(op) {
            Ok(value) => value,
            Err(fault) => {
                self.handle(fault.as_ref(), context, Some(&default));
                default
            }
        }
    }

    /// 執行操作並區分三種結果
    ///
    /// `Ok(Some)` 為成功，`Ok(None)` 為已抑制的故障，`Err` 為未被抑制、
    /// 應由呼叫端重新拋出的故障。
    pub fn try_guarded<T, E, F>(&self, op: F, context: &str) -> Result<Option<T>, BoxError>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<BoxError>,
    {
        match Self::catch(op) {
            Ok(value) => Ok(Some(value)),
            Err(fault) => {
                if self.handle(fault.as_ref(), context, None) {
                    Ok(None)
                } else {
                    Err(fault)
                }
            }
        }
    }

    /// 處理已攔截的故障，回傳是否應視為已處理
    pub fn handle(
        &self,
        fault: &(dyn Error + 'static),
        context: &str,
        default: Option<&dyn fmt::Debug>,
    ) -> bool {
        let classification = self.classifier.classify(fault);
        let suppress = classification.is_some_and(|entry| entry.suppress);

        if self.settings.log_exceptions() {
            self.report(fault, context, classification, default);
        }

        suppress
    }

    // 記錄本身也在保護之下：記錄失敗不得影響抑制判定
    fn report(
        &self,
        fault: &(dyn Error + 'static),
        context: &str,
        classification: Option<&FaultClassification>,
        default: Option<&dyn fmt::Debug>,
    ) {
        let root_message = root_cause(fault).to_string();

        let outcome = Self::catch(|| {
            let report = FaultReport {
                context,
                classification,
                root_message: root_message.clone(),
                cause_chain: self.settings.log_exception_stack_traces().then(|| {
                    cause_chain(fault)
                        .into_iter()
                        .map(ToString::to_string)
                        .collect()
                }),
                default_value: default.map(|value| format!("{:?}", value)),
            };
            self.reporter.report(&report);
            Ok::<(), BoxError>(())
        });

        if let Err(logging_fault) = outcome {
            error!("處理故障時記錄失敗: {}", logging_fault);
            error!("原始故障: {}", root_message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShimConfig;
    use crate::fault::FaultKind;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<(String, Option<FaultKind>, Option<usize>, Option<String>)>>,
    }

    impl FaultReporter for RecordingReporter {
        fn report(&self, report: &FaultReport<'_>) {
            self.reports.lock().push((
                report.context.to_string(),
                report.classification.map(|entry| entry.kind),
                report.cause_chain.as_ref().map(Vec::len),
                report.default_value.clone(),
            ));
        }
    }

    struct PanickingReporter;

    impl FaultReporter for PanickingReporter {
        fn report(&self, _report: &FaultReport<'_>) {
            panic!("reporter exploded");
        }
    }

    fn boundary_with(reporter: Arc<dyn FaultReporter>, settings: SettingsHandle) -> FaultBoundary {
        FaultBoundary::new(Arc::new(FaultClassifier::with_defaults()), settings)
            .with_reporter(reporter)
    }

    #[test]
    fn test_success_returns_true_without_report() {
        let reporter = Arc::new(RecordingReporter::default());
        let boundary = boundary_with(reporter.clone(), SettingsHandle::new());

        assert!(boundary.run_guarded(|| Ok::<(), BoxError>(()), "noop"));
        assert!(reporter.reports.lock().is_empty());
    }

    #[test]
    fn test_classified_error_is_suppressed() {
        let reporter = Arc::new(RecordingReporter::default());
        let boundary = boundary_with(reporter.clone(), SettingsHandle::new());

        let handled = boundary.run_guarded(
            || Err(Fault::new(FaultKind::MissingReference, "gfx.Screen")),
            "loading gfx.Screen",
        );

        assert!(handled);
        let reports = reporter.reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "loading gfx.Screen");
        assert_eq!(reports[0].1, Some(FaultKind::MissingReference));
        assert_eq!(reports[0].2, None);
    }

    #[test]
    fn test_unclassified_panic_is_not_suppressed() {
        let boundary = boundary_with(Arc::new(RecordingReporter::default()), SettingsHandle::new());
        let handled = boundary.run_guarded(|| -> Result<(), BoxError> { panic!("boom") }, "panicking op");
        assert!(!handled);
    }

    #[test]
    fn test_default_value_is_reported() {
        let reporter = Arc::new(RecordingReporter::default());
        let boundary = boundary_with(reporter.clone(), SettingsHandle::new());

        let value = boundary.run_guarded_with_default(
            || Err(Fault::new(FaultKind::NullDereference, "no screen")),
            "reading width",
            -1,
        );

        assert_eq!(value, -1);
        assert_eq!(reporter.reports.lock()[0].3.as_deref(), Some("-1"));
    }

    #[test]
    fn test_cause_chain_only_when_enabled() {
        let mut config = ShimConfig::default();
        config.faults.log_exception_stack_traces = true;
        let reporter = Arc::new(RecordingReporter::default());
        let boundary = boundary_with(reporter.clone(), SettingsHandle::with_config(config));

        boundary.run_guarded(
            || {
                Err(Fault::new(FaultKind::Runtime, "outer")
                    .with_cause(Fault::new(FaultKind::IllegalAccess, "inner")))
            },
            "nested",
        );

        let reports = reporter.reports.lock();
        assert_eq!(reports[0].1, Some(FaultKind::IllegalAccess));
        assert_eq!(reports[0].2, Some(2));
    }

    #[test]
    fn test_logging_disabled_keeps_verdict() {
        let mut config = ShimConfig::default();
        config.faults.log_exceptions = false;
        let reporter = Arc::new(RecordingReporter::default());
        let boundary = boundary_with(reporter.clone(), SettingsHandle::with_config(config));

        assert!(boundary.run_guarded(
            || Err(Fault::new(FaultKind::InitializationFailure, "static")),
            "init",
        ));
        assert!(reporter.reports.lock().is_empty());
    }

    #[test]
    fn test_reporter_failure_does_not_change_verdict() {
        let boundary = boundary_with(Arc::new(PanickingReporter), SettingsHandle::new());

        assert!(boundary.run_guarded(
            || Err(Fault::new(FaultKind::IllegalAccess, "private")),
            "access",
        ));
        assert!(!boundary.run_guarded(
            || Err(std::io::Error::new(std::io::ErrorKind::Other, "io")),
            "io",
        ));
    }

    #[test]
    fn test_try_guarded_three_outcomes() {
        let boundary = boundary_with(Arc::new(RecordingReporter::default()), SettingsHandle::new());

        assert_eq!(
            boundary.try_guarded(|| Ok::<_, BoxError>(7), "ok").unwrap(),
            Some(7)
        );
        assert_eq!(
            boundary
                .try_guarded(
                    || Err::<u8, _>(Fault::new(FaultKind::MissingTypeDefinition, "x")),
                    "suppressed",
                )
                .unwrap(),
            None
        );

        let propagated = boundary
            .try_guarded(|| Err::<u8, _>(Fault::new(FaultKind::Panic, "y")), "propagated")
            .unwrap_err();
        assert_eq!(propagated.to_string(), "panic: y");
    }
}
