use crate::fault::boundary::FaultBoundary;
use crate::fault::error::Fault;
use std::cell::Cell;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

static OBSERVER_INSTALLED: AtomicBool = AtomicBool::new(false);
static OBSERVED: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // 目前執行緒上巢狀的受保護呼叫層數
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// 受保護呼叫的範圍標記
///
/// 範圍內發生的 panic 由故障邊界自行回報，觀察器會略過它們。
pub(crate) struct GuardScope(());

impl GuardScope {
    pub(crate) fn enter() -> Self {
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        GuardScope(())
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        GUARD_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// 目前執行緒是否位於受保護呼叫之內
pub fn in_guarded_scope() -> bool {
    GUARD_DEPTH.with(|depth| depth.get() > 0)
}

/// 觀察器是否已安裝
pub fn is_installed() -> bool {
    OBSERVER_INSTALLED.load(Ordering::Acquire)
}

/// 觀察器處理過的未捕獲故障數
pub fn observed_count() -> u64 {
    OBSERVED.load(Ordering::Acquire)
}

/// 安裝行程級的最後防線故障觀察器
///
/// 整個行程只會安裝一次，重複呼叫回傳 `false`。發生在受保護呼叫之外的 panic
/// 會被分類並記錄；被抑制的只記錄警告，未被抑制的記錄錯誤後交給先前的 hook。
/// 此時擁有該 panic 的執行緒已經在結束，無法真正「重新拋出」。
///
/// hook 內再次 panic 會直接中止行程，因此這裡不呼叫可替換的記錄器，
/// 只以 tracing 輸出分類結果。
pub fn install_panic_observer(boundary: Arc<FaultBoundary>) -> bool {
    if OBSERVER_INSTALLED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return false;
    }

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if in_guarded_scope() {
            return;
        }
        OBSERVED.fetch_add(1, Ordering::AcqRel);

        let current = thread::current();
        let thread_name = current.name().unwrap_or("<unnamed>");
        let fault = Fault::from_panic(info.payload());
        let location = info
            .location()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unknown>".to_string());

        match boundary.classify(&fault) {
            Some(entry) if entry.suppress => {
                if boundary.logs_exceptions() {
                    warn!(
                        "已抑制執行緒 {} 中未捕獲的 {} ({}): {}",
                        thread_name, entry.label, location, fault
                    );
                }
            }
            _ => {
                error!("執行緒 {} 中未捕獲的故障 ({}): {}", thread_name, location, fault);
                previous(info);
            }
        }
    }));

    info!("已安裝全域故障觀察器");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_scope_nesting() {
        assert!(!in_guarded_scope());
        {
            let _outer = GuardScope::enter();
            assert!(in_guarded_scope());
            {
                let _inner = GuardScope::enter();
                assert!(in_guarded_scope());
            }
            assert!(in_guarded_scope());
        }
        assert!(!in_guarded_scope());
    }

    #[test]
    fn test_guard_scope_is_per_thread() {
        let _scope = GuardScope::enter();
        let other = thread::spawn(in_guarded_scope).join().unwrap();
        assert!(!other);
    }
}
