use crate::fault::{BoxError, FaultBoundary};
use crate::symbol::SymbolId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

type FixAction = Box<dyn Fn() -> Result<(), BoxError> + Send + Sync>;
type PatchAction = Box<dyn Fn(&SymbolId, &[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync>;

struct FixEntry {
    description: String,
    action: FixAction,
}

struct PatchEntry {
    description: String,
    action: PatchAction,
}

// 記錄預設值時只顯示長度
struct ByteImage<'a>(&'a [u8]);

impl fmt::Debug for ByteImage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} bytes>", self.0.len())
    }
}

/// 相容性修補登記表
///
/// 以插件為範圍的修正與以符號為範圍的修補，各自依註冊順序保存與套用。
/// 註冊只在初始化階段進行，之後只讀共享。
pub struct PatchRegistry {
    boundary: Arc<FaultBoundary>,
    fixes: HashMap<String, Vec<FixEntry>>,
    patches: HashMap<SymbolId, Vec<PatchEntry>>,
    failed_fixes: AtomicUsize,
    failed_patches: AtomicUsize,
}

impl fmt::Debug for PatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRegistry")
            .field("fix_scopes", &self.fixes.len())
            .field("patched_symbols", &self.patches.len())
            .field("failed_fixes", &self.failed_fix_count())
            .field("failed_patches", &self.failed_patch_count())
            .finish()
    }
}

impl PatchRegistry {
    pub fn new(boundary: Arc<FaultBoundary>) -> Self {
        Self {
            boundary,
            fixes: HashMap::new(),
            patches: HashMap::new(),
            failed_fixes: AtomicUsize::new(0),
            failed_patches: AtomicUsize::new(0),
        }
    }

    /// 為插件註冊修正；不去重
    pub fn register_fix<F, E>(
        &mut self,
        scope: impl Into<String>,
        description: impl Into<String>,
        action: F,
    ) where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let scope = scope.into();
        let description = description.into();
        info!("已註冊插件 {} 的相容性修正: {}", scope, description);
        self.fixes.entry(scope).or_default().push(FixEntry {
            description,
            action: Box::new(move || action().map_err(Into::into)),
        });
    }

    /// 為符號註冊修補；不去重
    pub fn register_patch<F, E>(
        &mut self,
        symbol: impl Into<SymbolId>,
        description: impl Into<String>,
        action: F,
    ) where
        F: Fn(&SymbolId, &[u8]) -> Result<Vec<u8>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let symbol = symbol.into();
        let description = description.into();
        info!("已註冊符號 {} 的修補: {}", symbol, description);
        self.patches.entry(symbol).or_default().push(PatchEntry {
            description,
            action: Box::new(move |symbol: &SymbolId, bytes: &[u8]| {
                action(symbol, bytes).map_err(Into::into)
            }),
        });
    }

    /// 依序套用插件的所有修正，至少一個成功完成時回傳 `true`
    ///
    /// 每個修正各自受保護，一個修正的故障不影響後續修正。
    pub fn apply_fixes(&self, scope: &str) -> bool {
        let Some(fixes) = self.fixes.get(scope) else {
            return false;
        };

        let mut any_applied = false;
        for fix in fixes {
            info!("套用插件 {} 的修正: {}", scope, fix.description);
            match FaultBoundary::catch(|| (fix.action)()) {
                Ok(()) => any_applied = true,
                Err(fault) => {
                    self.failed_fixes.fetch_add(1, Ordering::Relaxed);
                    let context = format!("套用插件 {} 的修正 ({})", scope, fix.description);
                    self.boundary.handle(fault.as_ref(), &context, None);
                }
            }
        }
        any_applied
    }

    /// 依序套用符號的所有修補
    ///
    /// 故障的修補保留先前的內容，並繼續嘗試後續修補。
    pub fn apply_patches(&self, symbol: &SymbolId, bytes: Vec<u8>) -> Vec<u8> {
        let Some(patches) = self.patches.get(symbol) else {
            return bytes;
        };

        patches.iter().fold(bytes, |current, patch| {
            debug!("套用符號 {} 的修補: {}", symbol, patch.description);
            let context = format!("套用符號 {} 的修補 ({})", symbol, patch.description);
            match FaultBoundary::catch(|| (patch.action)(symbol, &current)) {
                Ok(next) => next,
                Err(fault) => {
                    self.failed_patches.fetch_add(1, Ordering::Relaxed);
                    self.boundary
                        .handle(fault.as_ref(), &context, Some(&ByteImage(&current)));
                    current
                }
            }
        })
    }

    pub fn has_fixes(&self, scope: &str) -> bool {
        self.fixes.get(scope).is_some_and(|fixes| !fixes.is_empty())
    }

    pub fn has_patches(&self, symbol: &SymbolId) -> bool {
        self.patches.get(symbol).is_some_and(|patches| !patches.is_empty())
    }

    /// 故障的修正次數
    pub fn failed_fix_count(&self) -> usize {
        self.failed_fixes.load(Ordering::Relaxed)
    }

    /// 故障的修補次數
    pub fn failed_patch_count(&self) -> usize {
        self.failed_patches.load(Ordering::Relaxed)
    }

    /// 已註冊修正的插件數
    pub fn fix_scope_count(&self) -> usize {
        self.fixes.len()
    }

    /// 已註冊修補的符號數
    pub fn patched_symbol_count(&self) -> usize {
        self.patches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsHandle;
    use crate::fault::{Fault, FaultClassifier, FaultKind};
    use parking_lot::Mutex;

    fn registry() -> PatchRegistry {
        PatchRegistry::new(Arc::new(FaultBoundary::new(
            Arc::new(FaultClassifier::with_defaults()),
            SettingsHandle::new(),
        )))
    }

    #[test]
    fn test_apply_patches_without_entries_is_identity() {
        let registry = registry();
        let bytes = vec![1, 2, 3];
        assert_eq!(
            registry.apply_patches(&SymbolId::new("gfx.Screen"), bytes.clone()),
            bytes
        );
    }

    #[test]
    fn test_faulting_patch_leaves_bytes_and_continues() {
        let mut registry = registry();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        registry.register_patch("gfx.Screen", "append 1", move |_, bytes: &[u8]| {
            log.lock().push(bytes.to_vec());
            let mut patched = bytes.to_vec();
            patched.push(1);
            Ok::<_, BoxError>(patched)
        });
        let log = seen.clone();
        registry.register_patch("gfx.Screen", "explode", move |_, bytes: &[u8]| {
            log.lock().push(bytes.to_vec());
            Err::<Vec<u8>, _>(Fault::new(FaultKind::IllegalAccess, "sealed"))
        });
        let log = seen.clone();
        registry.register_patch(
            "gfx.Screen",
            "panic",
            move |_, bytes: &[u8]| -> Result<Vec<u8>, BoxError> {
                log.lock().push(bytes.to_vec());
                panic!("patch panicked")
            },
        );
        let log = seen.clone();
        registry.register_patch("gfx.Screen", "append 4", move |_, bytes: &[u8]| {
            log.lock().push(bytes.to_vec());
            let mut patched = bytes.to_vec();
            patched.push(4);
            Ok::<_, BoxError>(patched)
        });

        let result = registry.apply_patches(&SymbolId::new("gfx.Screen"), vec![0]);

        assert_eq!(result, vec![0, 1, 4]);
        assert_eq!(registry.failed_patch_count(), 2);
        assert_eq!(registry.failed_fix_count(), 0);
        assert_eq!(
            *seen.lock(),
            vec![vec![0], vec![0, 1], vec![0, 1], vec![0, 1]]
        );
    }

    #[test]
    fn test_apply_fixes_runs_all_in_order() {
        let mut registry = registry();
        let order = Arc::new(Mutex::new(Vec::new()));

        let log = order.clone();
        registry.register_fix("modA", "first", move || {
            log.lock().push("first");
            Err::<(), _>(Fault::new(FaultKind::NullDereference, "registry not ready"))
        });
        let log = order.clone();
        registry.register_fix("modA", "second", move || {
            log.lock().push("second");
            Ok::<(), BoxError>(())
        });

        assert!(registry.apply_fixes("modA"));
        assert_eq!(*order.lock(), vec!["first", "second"]);
        assert_eq!(registry.failed_fix_count(), 1);
    }

    #[test]
    fn test_apply_fixes_false_when_nothing_succeeds() {
        let mut registry = registry();
        registry.register_fix("modB", "broken", || -> Result<(), BoxError> {
            panic!("fix panicked")
        });

        assert!(!registry.apply_fixes("modB"));
        assert!(!registry.apply_fixes("unknown"));
        assert!(registry.has_fixes("modB"));
        assert_eq!(registry.fix_scope_count(), 1);
    }

    #[test]
    fn test_duplicate_fixes_are_kept() {
        let mut registry = registry();
        let runs = Arc::new(Mutex::new(0));
        for _ in 0..2 {
            let runs = runs.clone();
            registry.register_fix("modC", "same", move || {
                *runs.lock() += 1;
                Ok::<(), BoxError>(())
            });
        }

        registry.apply_fixes("modC");
        assert_eq!(*runs.lock(), 2);
    }
}
