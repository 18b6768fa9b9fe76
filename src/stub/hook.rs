use crate::compat::PatchRegistry;
use crate::config::SettingsHandle;
use crate::fault::FaultBoundary;
use crate::stub::catalog::StubCatalog;
use crate::stub::error::{ResolveError, StubResult};
use crate::stub::registry::OutcomeRegistry;
use crate::stub::source::StubSource;
use crate::stub::standin::{StandInDescriptor, StandInKind, StubImage};
use crate::symbol::SymbolId;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 宿主原本的符號解析途徑
pub trait HostResolver: Send + Sync {
    /// 找不到符號時回傳 `None`
    fn find(&self, symbol: &SymbolId) -> Option<Vec<u8>>;
}

/// 以記憶體對應表模擬的宿主解析器
#[derive(Debug, Clone, Default)]
pub struct MapHostResolver {
    symbols: HashMap<SymbolId, Vec<u8>>,
}

impl MapHostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<SymbolId>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(symbol, bytes);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<SymbolId>, bytes: impl Into<Vec<u8>>) {
        self.symbols.insert(symbol.into(), bytes.into());
    }
}

impl HostResolver for MapHostResolver {
    fn find(&self, symbol: &SymbolId) -> Option<Vec<u8>> {
        self.symbols.get(symbol).cloned()
    }
}

// 每個符號只實體化一次；失敗也會被快取
type SymbolSlot = Arc<OnceCell<Option<Arc<[u8]>>>>;

/// 載入掛鉤
///
/// 宿主的正常解析失敗時，由此為受管理的符號提供替身的二進位表示。
pub struct LoaderHook {
    catalog: Arc<StubCatalog>,
    source: Arc<dyn StubSource>,
    outcomes: Arc<OutcomeRegistry>,
    patches: Arc<PatchRegistry>,
    boundary: Arc<FaultBoundary>,
    settings: SettingsHandle,
    installed: AtomicBool,
    images: DashMap<StandInKind, Arc<[u8]>>,
    resolved: DashMap<SymbolId, SymbolSlot>,
    transformed: DashMap<SymbolId, SymbolSlot>,
}

impl std::fmt::Debug for LoaderHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderHook")
            .field("installed", &self.is_installed())
            .field("catalog_size", &self.catalog.len())
            .field("cached_images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl LoaderHook {
    pub fn new(
        catalog: Arc<StubCatalog>,
        source: Arc<dyn StubSource>,
        outcomes: Arc<OutcomeRegistry>,
        patches: Arc<PatchRegistry>,
        boundary: Arc<FaultBoundary>,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            catalog,
            source,
            outcomes,
            patches,
            boundary,
            settings,
            installed: AtomicBool::new(false),
            images: DashMap::new(),
            resolved: DashMap::new(),
            transformed: DashMap::new(),
        }
    }

    /// 啟用掛鉤；回傳是否為首次啟用
    pub fn install(&self) -> bool {
        let first = !self.installed.swap(true, Ordering::AcqRel);
        if first {
            info!("已安裝替身載入掛鉤，管理 {} 個符號", self.catalog.len());
        }
        first
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// 已安裝且配置允許時才會提供替身
    pub fn is_active(&self) -> bool {
        self.is_installed() && self.settings.enable_stub_classes()
    }

    pub fn catalog(&self) -> &StubCatalog {
        &self.catalog
    }

    pub fn outcomes(&self) -> &OutcomeRegistry {
        &self.outcomes
    }

    /// 為符號提供替身表示
    ///
    /// 明確的目錄條目優先於套件前綴；兩者都不符合時回傳 `None`，交回宿主處理。
    /// 同一符號重複解析時回傳快取結果，不會重複記錄。
    pub fn resolve(&self, symbol: &SymbolId) -> Option<Vec<u8>> {
        if !self.is_active() {
            return None;
        }

        let stand_in = match self.catalog.lookup(symbol) {
            Some(stand_in) => stand_in,
            None if self.catalog.in_client_package(symbol) => StandInDescriptor::Transparent,
            None => {
                debug!("符號 {} 不受管理，交回宿主", symbol);
                return None;
            }
        };

        let slot = self.slot(&self.resolved, symbol);
        slot.get_or_init(|| self.substitute(symbol, stand_in))
            .as_ref()
            .map(|bytes| bytes.to_vec())
    }

    /// 對宿主已解析的符號套用符號層級的修補
    ///
    /// 每個符號只修補一次；內容有變更時才回傳 `Some`。
    pub fn transform(&self, symbol: &SymbolId, original: &[u8]) -> Option<Vec<u8>> {
        if !self.settings.enable_compatibility_fixes() || !self.patches.has_patches(symbol) {
            return None;
        }

        let slot = self.slot(&self.transformed, symbol);
        slot.get_or_init(|| {
            let patched = self.patches.apply_patches(symbol, original.to_vec());
            (patched.as_slice() != original).then(|| Arc::from(patched))
        })
        .as_ref()
        .map(|bytes| bytes.to_vec())
    }

    fn slot(&self, cache: &DashMap<SymbolId, SymbolSlot>, symbol: &SymbolId) -> SymbolSlot {
        if let Some(slot) = cache.get(symbol) {
            return Arc::clone(slot.value());
        }
        Arc::clone(cache.entry(symbol.clone()).or_default().value())
    }

    fn substitute(&self, symbol: &SymbolId, stand_in: StandInDescriptor) -> Option<Arc<[u8]>> {
        let context = format!("實體化 {} 的替身", symbol);
        match FaultBoundary::catch(|| self.materialize(symbol, stand_in)) {
            Ok(bytes) => {
                if self.outcomes.record_loaded(symbol, stand_in.identity())
                    && self.settings.log_stub_loading()
                {
                    info!("已載入替身: {} -> {}", symbol, stand_in.identity());
                }
                Some(Arc::from(bytes))
            }
            Err(fault) => {
                self.boundary.handle(fault.as_ref(), &context, None);
                self.outcomes.record_failed(symbol);
                warn!("無法實體化 {} 的替身，交回宿主解析", symbol);
                None
            }
        }
    }

    fn materialize(&self, symbol: &SymbolId, stand_in: StandInDescriptor) -> StubResult<Vec<u8>> {
        let bytes = match stand_in {
            StandInDescriptor::Concrete(kind) => self.kind_image(kind)?.to_vec(),
            StandInDescriptor::Transparent => StubImage::transparent(symbol).encode()?,
        };

        if self.settings.enable_compatibility_fixes() {
            Ok(self.patches.apply_patches(symbol, bytes))
        } else {
            Ok(bytes)
        }
    }

    // 具體替身的表示與符號無關，依種類快取
    fn kind_image(&self, kind: StandInKind) -> StubResult<Arc<[u8]>> {
        if let Some(image) = self.images.get(&kind) {
            return Ok(Arc::clone(image.value()));
        }

        let image: Arc<[u8]> = Arc::from(self.source.read_image(kind)?);
        debug!("已快取替身 {} 的表示 ({} bytes)", kind, image.len());
        let cached = Arc::clone(self.images.entry(kind).or_insert(image).value());
        Ok(cached)
    }
}

/// 串接宿主解析與載入掛鉤的解析器
///
/// 宿主先解析；找到時套用修補，找不到時交給掛鉤；兩者都無法提供時回報缺少符號。
pub struct FallbackResolver<H: HostResolver + ?Sized> {
    host: Arc<H>,
    hook: Arc<LoaderHook>,
}

impl<H: HostResolver + ?Sized> FallbackResolver<H> {
    pub fn new(host: Arc<H>, hook: Arc<LoaderHook>) -> Self {
        Self { host, hook }
    }

    pub fn hook(&self) -> &LoaderHook {
        &self.hook
    }

    pub fn resolve(&self, symbol: &SymbolId) -> Result<Vec<u8>, ResolveError> {
        if let Some(bytes) = self.host.find(symbol) {
            return Ok(self.hook.transform(symbol, &bytes).unwrap_or(bytes));
        }

        self.hook
            .resolve(symbol)
            .ok_or_else(|| ResolveError::not_found(symbol))
    }
}
