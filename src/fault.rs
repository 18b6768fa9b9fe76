//! 故障圍堵模組
//!
//! 包裝任意可失敗的操作，使其中的故障（`Err` 回傳或 panic）不會越過宿主視為致命的邊界。
//!
//! # 主要功能
//!
//! - **故障分類**：沿成因鏈找到根因，依故障種類表先精確比對、再沿上層種類回退
//! - **抑制決策**：完全由命中分類的 `suppress` 旗標決定，未分類的故障一律不抑制
//! - **日誌策略**：依配置記錄，記錄本身失敗時輸出最小化的後備訊息
//! - **最後防線**：行程級 panic 觀察器，套用相同的分類與記錄策略
//!
//! # 使用範例
//!
//! ```rust,ignore
//! let boundary = FaultBoundary::new(Arc::new(FaultClassifier::with_defaults()), settings);
//!
//! let handled = boundary.run_guarded(|| plugin.init(), "初始化外掛");
//! let width = boundary.run_guarded_with_default(|| screen.width(), "讀取畫面寬度", 0);
//! ```

pub mod boundary;
pub mod classifier;
pub mod error;
pub mod kind;
pub mod observer;

// 重新導出常用類型
pub use boundary::{FaultBoundary, FaultReport, FaultReporter, TracingReporter};
pub use classifier::{cause_chain, root_cause, FaultClassification, FaultClassifier};
pub use error::{BoxError, Fault};
pub use kind::FaultKind;
pub use observer::install_panic_observer;
