use crate::compat::registry::PatchRegistry;
use crate::fault::BoxError;
use crate::stub::HostResolver;
use crate::symbol::SymbolId;
use std::sync::Arc;
use tracing::{info, warn};

/// `create` 依賴的登錄表符號，須在相依插件之前完成初始化
pub const REGISTRY_SYMBOLS: [&str; 2] = [
    "net.minecraft.resources.ResourceKey",
    "net.minecraft.core.Registry",
];

/// 註冊內建的相容性修正
pub fn register_builtin_fixes(registry: &mut PatchRegistry, host: Arc<dyn HostResolver>) {
    registry.register_fix(
        "create",
        "預先初始化登錄表符號，避免 Create 與 KubeJS 初始化衝突",
        move || {
            pre_resolve_registry_symbols(host.as_ref());
            Ok::<(), BoxError>(())
        },
    );

    info!(
        "相容性登記表已初始化: {} 個插件修正, {} 個符號修補",
        registry.fix_scope_count(),
        registry.patched_symbol_count()
    );
}

// 找不到符號只記錄警告，修正本身仍視為完成
fn pre_resolve_registry_symbols(host: &dyn HostResolver) {
    for name in REGISTRY_SYMBOLS {
        let symbol = SymbolId::new(name);
        if host.find(&symbol).is_none() {
            warn!("無法預先初始化登錄表符號 {}", symbol);
            return;
        }
    }
    info!("已預先初始化登錄表符號，避免 Create/KubeJS 衝突");
}
