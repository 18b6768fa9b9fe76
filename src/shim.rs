//! 行程根上下文
//!
//! `ShimContext` 擁有所有登記表並回應宿主的生命週期事件；
//! 診斷查詢與狀態報告也從這裡提供給宿主的命令層。

pub mod context;
pub mod diagnostics;
pub mod error;

pub use context::{
    Distribution, SelfTestOutcome, ShimContext, ShimContextBuilder, SAMPLE_CLIENT_SYMBOLS,
    SELF_TEST_SYMBOL,
};
pub use diagnostics::{
    strip_formatting_codes, write_plugin_list, PluginInfo, ReportFormatter, StatusReport,
};
pub use error::{ShimError, ShimResult};
