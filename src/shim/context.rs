use crate::compat::{register_builtin_fixes, CompatLifecycle, PatchRegistry};
use crate::config::SettingsHandle;
use crate::fault::{FaultBoundary, FaultClassifier, FaultReporter};
use crate::shim::diagnostics::StatusReport;
use crate::stub::{
    EmbeddedStubSource, FallbackResolver, HostResolver, LoaderHook, MapHostResolver,
    OutcomeRegistry, ResolveError, StubCatalog, StubSource,
};
use crate::symbol::SymbolId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 啟動時檢查是否意外存在的客戶端符號
pub const SAMPLE_CLIENT_SYMBOLS: [&str; 5] = [
    "net.minecraft.client.Minecraft",
    "net.minecraft.client.gui.screens.Screen",
    "com.mojang.blaze3d.vertex.RenderSystem",
    "net.minecraft.client.KeyMapping",
    "com.mojang.blaze3d.vertex.BufferBuilder",
];

/// 自我測試解析的符號
pub const SELF_TEST_SYMBOL: &str = "net.minecraft.client.Minecraft";

/// 宿主的發行型態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Client,
    /// 圖形子系統缺席的受限模式
    DedicatedServer,
}

impl Distribution {
    pub fn is_restricted(self) -> bool {
        self == Distribution::DedicatedServer
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Client => write!(f, "client"),
            Distribution::DedicatedServer => write!(f, "dedicated_server"),
        }
    }
}

/// 自我測試結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTestOutcome {
    /// 非受限模式，未執行
    Skipped,
    /// 符號由替身提供
    Substituted,
    /// 符號可解析，但不是替身
    NotSubstituted,
    /// 符號無法解析
    Unresolved,
}

/// 行程根上下文
///
/// 擁有目錄、結果登記表、故障分類表與修補登記表，並把它們的句柄交給
/// 載入掛鉤與故障邊界。每個宿主行程建立一個。
pub struct ShimContext {
    distribution: Distribution,
    settings: SettingsHandle,
    catalog: Arc<StubCatalog>,
    outcomes: Arc<OutcomeRegistry>,
    boundary: Arc<FaultBoundary>,
    patches: Arc<PatchRegistry>,
    host: Arc<dyn HostResolver>,
    hook: Arc<LoaderHook>,
    resolver: FallbackResolver<dyn HostResolver>,
    lifecycle: CompatLifecycle,
    restricted: AtomicBool,
}

impl fmt::Debug for ShimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShimContext")
            .field("distribution", &self.distribution)
            .field("restricted", &self.is_restricted_mode())
            .field("hook", &self.hook)
            .field("patches", &self.patches)
            .finish_non_exhaustive()
    }
}

impl ShimContext {
    pub fn builder() -> ShimContextBuilder {
        ShimContextBuilder::new()
    }

    /// 宿主偵測到受限模式時呼叫：安裝載入掛鉤並執行早期修正檢查點
    ///
    /// 客戶端模式下不做任何事，回傳 `false`。
    pub fn on_restricted_mode_detected(&self) -> bool {
        if !self.distribution.is_restricted() {
            info!("非受限模式，不啟用替身系統");
            return false;
        }

        if self.restricted.swap(true, Ordering::AcqRel) {
            return true;
        }

        info!("偵測到受限模式，啟用替身系統");
        self.hook.install();
        self.lifecycle.early_checkpoint();
        true
    }

    /// 宿主啟動完成時呼叫
    ///
    /// 檢查客戶端符號是否意外存在、記錄統計、執行後期修正檢查點與自我測試。
    /// 只做診斷，不會讓啟動失敗。
    pub fn on_host_startup_complete(&self) -> SelfTestOutcome {
        if !self.is_restricted_mode() {
            info!("非受限模式，略過替身系統啟動檢查");
            return SelfTestOutcome::Skipped;
        }

        info!("執行於受限模式，掃描客戶端符號...");
        self.scan_client_symbols();

        info!(
            "替身系統運作中，目錄管理 {} 個客戶端符號",
            self.catalog.len()
        );
        info!(
            "目前已載入 {} 個替身，{} 個失敗",
            self.loaded_count(),
            self.failed_count()
        );

        if self.settings.log_loaded_stubs() {
            for line in self.list_loaded() {
                info!("已載入替身: {}", line);
            }
        }

        self.lifecycle.late_checkpoint();
        self.self_test()
    }

    fn scan_client_symbols(&self) {
        for name in SAMPLE_CLIENT_SYMBOLS {
            let symbol = SymbolId::new(name);
            let context = format!("檢查客戶端符號 {}", symbol);
            self.boundary.run_guarded(
                || {
                    if self.host.find(&symbol).is_some() {
                        warn!(
                            "客戶端符號 {} ({}) 存在於受限模式宿主中，仍會提供替身",
                            symbol,
                            symbol.resource_path()
                        );
                    } else {
                        info!("已確認 {} 不存在（符合預期）", symbol);
                    }
                    Ok::<(), ResolveError>(())
                },
                &context,
            );
        }
    }

    /// 解析一個已知缺席的符號，確認它由替身提供
    pub fn self_test(&self) -> SelfTestOutcome {
        if !self.is_restricted_mode() {
            info!("非受限模式，略過自我測試");
            return SelfTestOutcome::Skipped;
        }

        info!("執行替身系統自我測試");
        let symbol = SymbolId::new(SELF_TEST_SYMBOL);
        let outcome = self.boundary.run_guarded_with_default(
            || {
                self.resolve(&symbol).map(|_| {
                    if self.outcomes.is_loaded(&symbol) {
                        info!("已確認 {} 由替身提供", symbol);
                        SelfTestOutcome::Substituted
                    } else {
                        warn!("{} 可解析，但不是替身", symbol);
                        SelfTestOutcome::NotSubstituted
                    }
                })
            },
            "測試替身系統",
            SelfTestOutcome::Unresolved,
        );
        info!("自我測試完成: {:?}", outcome);
        outcome
    }

    /// 經由宿主與載入掛鉤解析符號
    pub fn resolve(&self, symbol: &SymbolId) -> Result<Vec<u8>, ResolveError> {
        self.resolver.resolve(symbol)
    }

    /// 依插件範圍按需套用修正
    pub fn apply_fixes_on_demand(&self, scope: &str) -> bool {
        self.lifecycle.apply_on_demand(scope)
    }

    pub fn list_loaded(&self) -> Vec<String> {
        self.outcomes.list_loaded()
    }

    pub fn loaded_count(&self) -> usize {
        self.outcomes.count_loaded()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.count_failed()
    }

    /// 故障的修正與修補次數
    pub fn patch_failure_count(&self) -> usize {
        self.patches.failed_fix_count() + self.patches.failed_patch_count()
    }

    pub fn is_restricted_mode(&self) -> bool {
        self.restricted.load(Ordering::Acquire)
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    /// 客戶端功能狀態的說明文字
    pub fn client_status(&self) -> &'static str {
        match self.distribution {
            Distribution::Client => "客戶端功能已啟用（客戶端模式）",
            Distribution::DedicatedServer => "客戶端功能已停用（伺服器模式）",
        }
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            generated_at: Utc::now(),
            distribution: self.distribution,
            restricted_mode: self.is_restricted_mode(),
            hook_installed: self.hook.is_installed(),
            catalog_size: self.catalog.len(),
            client_packages: self
                .catalog
                .client_packages()
                .iter()
                .map(ToString::to_string)
                .collect(),
            loaded_count: self.loaded_count(),
            failed_count: self.failed_count(),
            failed_fix_count: self.patches.failed_fix_count(),
            failed_patch_count: self.patches.failed_patch_count(),
            loaded: self.list_loaded(),
            failed: self
                .outcomes
                .list_failed()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn catalog(&self) -> &StubCatalog {
        &self.catalog
    }

    pub fn outcomes(&self) -> &OutcomeRegistry {
        &self.outcomes
    }

    pub fn boundary(&self) -> &Arc<FaultBoundary> {
        &self.boundary
    }

    pub fn hook(&self) -> &Arc<LoaderHook> {
        &self.hook
    }

    pub fn lifecycle(&self) -> &CompatLifecycle {
        &self.lifecycle
    }
}

type PatchSetup = Box<dyn FnOnce(&mut PatchRegistry)>;

/// 上下文構建器
pub struct ShimContextBuilder {
    distribution: Distribution,
    settings: Option<SettingsHandle>,
    catalog: Option<StubCatalog>,
    source: Option<Arc<dyn StubSource>>,
    classifier: Option<FaultClassifier>,
    reporter: Option<Arc<dyn FaultReporter>>,
    host: Option<Arc<dyn HostResolver>>,
    patch_setup: Vec<PatchSetup>,
    plugins: Option<Vec<String>>,
    install_observer: bool,
}

impl ShimContextBuilder {
    /// 創建新的構建器，預設為受限模式
    pub fn new() -> Self {
        Self {
            distribution: Distribution::DedicatedServer,
            settings: None,
            catalog: None,
            source: None,
            classifier: None,
            reporter: None,
            host: None,
            patch_setup: Vec::new(),
            plugins: None,
            install_observer: true,
        }
    }

    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn settings(mut self, settings: SettingsHandle) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn catalog(mut self, catalog: StubCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn stub_source(mut self, source: Arc<dyn StubSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn classifier(mut self, classifier: FaultClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn FaultReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn host_resolver(mut self, host: Arc<dyn HostResolver>) -> Self {
        self.host = Some(host);
        self
    }

    /// 在修補登記表共享之前註冊額外的修正或修補
    pub fn configure_patches(mut self, setup: impl FnOnce(&mut PatchRegistry) + 'static) -> Self {
        self.patch_setup.push(Box::new(setup));
        self
    }

    pub fn problematic_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = Some(plugins.into_iter().map(Into::into).collect());
        self
    }

    /// 是否在早期檢查點安裝全域故障觀察器
    pub fn install_panic_observer(mut self, install: bool) -> Self {
        self.install_observer = install;
        self
    }

    /// 構建上下文
    pub fn build(self) -> ShimContext {
        info!("構建替身上下文 ({})", self.distribution);

        let settings = self.settings.unwrap_or_default();
        let classifier = Arc::new(self.classifier.unwrap_or_else(FaultClassifier::with_defaults));
        let mut boundary = FaultBoundary::new(classifier, settings.clone());
        if let Some(reporter) = self.reporter {
            boundary = boundary.with_reporter(reporter);
        }
        let boundary = Arc::new(boundary);

        let host: Arc<dyn HostResolver> = self
            .host
            .unwrap_or_else(|| Arc::new(MapHostResolver::new()));

        let mut patches = PatchRegistry::new(boundary.clone());
        register_builtin_fixes(&mut patches, host.clone());
        for setup in self.patch_setup {
            setup(&mut patches);
        }
        let patches = Arc::new(patches);

        let catalog = Arc::new(self.catalog.unwrap_or_else(StubCatalog::with_defaults));
        let outcomes = Arc::new(OutcomeRegistry::new());
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(EmbeddedStubSource));

        let hook = Arc::new(LoaderHook::new(
            catalog.clone(),
            source,
            outcomes.clone(),
            patches.clone(),
            boundary.clone(),
            settings.clone(),
        ));
        let resolver = FallbackResolver::new(host.clone(), hook.clone());

        let mut lifecycle =
            CompatLifecycle::new(patches.clone(), boundary.clone(), settings.clone());
        if let Some(plugins) = self.plugins {
            lifecycle = lifecycle.with_plugins(plugins);
        }
        if !self.install_observer {
            lifecycle = lifecycle.without_observer();
        }

        info!("替身上下文構建完成，目錄管理 {} 個符號", catalog.len());

        ShimContext {
            distribution: self.distribution,
            settings,
            catalog,
            outcomes,
            boundary,
            patches,
            host,
            hook,
            resolver,
            lifecycle,
            restricted: AtomicBool::new(false),
        }
    }
}

impl Default for ShimContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
