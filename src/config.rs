//! 配置模組
//!
//! 配置文件與 `SHIM__*` 環境變數合併後交給 `SettingsHandle`。
//! 元件持有句柄並在查詢時才讀取開關，宿主尚未載入配置時一律使用預設值。

pub mod loader;
pub mod manager;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use ::config::ConfigError;
pub use loader::{ConfigLoader, Environment, CONFIG_DIR_VAR, ENV_VAR};
pub use manager::SettingsHandle;
pub use types::*;
pub use validation::{expect_choice, expect_non_empty, ValidationError, Validator};
