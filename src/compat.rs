//! 相容性修補模組
//!
//! 已知有問題的插件在宿主啟動的早期與後期檢查點套用修正，
//! 符號層級的修補則在符號第一次載入時套用。

pub mod fixes;
pub mod lifecycle;
pub mod registry;

pub use fixes::register_builtin_fixes;
pub use lifecycle::{CompatLifecycle, PROBLEMATIC_PLUGINS};
pub use registry::PatchRegistry;
