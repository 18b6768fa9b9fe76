//! 符號替換與故障圍堵層
//!
//! 宿主以受限模式執行、圖形子系統缺席時，為指向該子系統的符號提供惰性替身，
//! 並把插件初始化期間的故障攔截在宿主視為致命的邊界之內。

// 模組定義
pub mod compat;
pub mod config;
pub mod fault;
pub mod logging;
pub mod shim;
pub mod stub;
pub mod symbol;

// 重新導出常用類型
pub use compat::{CompatLifecycle, PatchRegistry};
pub use config::{SettingsHandle, ShimConfig};
pub use fault::{BoxError, Fault, FaultBoundary, FaultClassifier, FaultKind};
pub use logging::init_logging;
pub use shim::{Distribution, ShimContext, ShimContextBuilder, ShimError, ShimResult};
pub use stub::{LoaderHook, OutcomeRegistry, StandInDescriptor, StandInKind, StubCatalog};
pub use symbol::{PackagePrefix, SymbolId};
