use crate::config::validation::{expect_choice, expect_non_empty, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Shim 配置結構
///
/// 每個區段都帶 `#[serde(default)]`，部分配置文件也能正確載入。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    pub stubs: StubConfig,
    pub compat: CompatConfig,
    pub faults: FaultConfig,
    pub log: LogConfig,
}

impl Validator for ShimConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.stubs.validate()?;
        self.compat.validate()?;
        self.faults.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

/// 替身類別配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// 是否啟用載入鉤子
    pub enable_stub_classes: bool,
    /// 提供替身時是否記錄 info 日誌
    pub log_stub_loading: bool,
    /// 啟動完成時是否列出已載入的替身
    pub log_loaded_stubs: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            enable_stub_classes: true,
            log_stub_loading: true,
            log_loaded_stubs: false,
        }
    }
}

impl Validator for StubConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// 相容性修補配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// 是否執行修補檢查點與符號修補
    pub enable_compatibility_fixes: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            enable_compatibility_fixes: true,
        }
    }
}

impl Validator for CompatConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// 故障圍堵日誌配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    pub log_exceptions: bool,
    /// 是否輸出完整的成因鏈
    pub log_exception_stack_traces: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            log_exceptions: true,
            log_exception_stack_traces: false,
        }
    }
}

impl Validator for FaultConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LogConfig {
    /// 是否輸出 JSON 格式；與驗證一樣不分大小寫
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        expect_non_empty("log.level", &self.level)?;
        expect_choice(
            "log.level",
            &self.level,
            &["trace", "debug", "info", "warn", "error"],
        )?;
        expect_choice("log.format", &self.format, &["pretty", "json"])
    }
}
