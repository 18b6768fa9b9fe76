use crate::shim::context::Distribution;
use crate::shim::error::ShimResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// 替換狀態報告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub distribution: Distribution,
    /// 受限模式旗標，即替身子系統是否運作中
    pub restricted_mode: bool,
    pub hook_installed: bool,
    pub catalog_size: usize,
    pub client_packages: Vec<String>,
    pub loaded_count: usize,
    pub failed_count: usize,
    /// 故障的插件修正次數
    pub failed_fix_count: usize,
    /// 故障的符號修補次數
    pub failed_patch_count: usize,
    /// `符號 -> 替身`，依載入順序
    pub loaded: Vec<String>,
    pub failed: Vec<String>,
}

/// 報告格式化器
pub struct ReportFormatter;

impl ReportFormatter {
    /// 格式化為人類可讀的文字
    pub fn format_text(report: &StatusReport) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== 替身狀態報告 ({}) ===\n", report.distribution));
        output.push_str(&format!(
            "產生時間: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        output.push_str(&format!(
            "受限模式: {}\n",
            if report.restricted_mode { "是" } else { "否" }
        ));
        output.push_str(&format!(
            "載入掛鉤: {}\n",
            if report.hook_installed { "已安裝" } else { "未安裝" }
        ));
        output.push_str(&format!(
            "目錄: {} 個符號, 客戶端套件: {}\n",
            report.catalog_size,
            report.client_packages.join(", ")
        ));
        output.push_str(&format!(
            "修正故障: {}, 修補故障: {}\n",
            report.failed_fix_count, report.failed_patch_count
        ));
        output.push('\n');

        if report.loaded.is_empty() {
            output.push_str("尚未載入任何替身\n");
        } else {
            output.push_str(&format!("已載入的替身 ({}):\n", report.loaded_count));
            for line in &report.loaded {
                output.push_str(&format!(" - {}\n", line));
            }
        }

        if !report.failed.is_empty() {
            output.push_str(&format!("\n實體化失敗 ({}):\n", report.failed_count));
            for symbol in &report.failed {
                output.push_str(&format!(" - {}\n", symbol));
            }
        }

        output
    }

    /// 格式化為JSON
    pub fn format_json(report: &StatusReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }
}

/// 已安裝插件的描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// 可能含有 `§x` 格式碼的顯示名稱
    pub display_name: String,
    pub file_name: String,
}

impl PluginInfo {
    pub fn new(display_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            file_name: file_name.into(),
        }
    }

    /// `顯示名稱 | 來源檔案`，顯示名稱去除格式碼
    pub fn list_line(&self) -> String {
        format!(
            "{} | {}",
            strip_formatting_codes(&self.display_name),
            self.file_name
        )
    }
}

/// 去除 `§` 加一個字元的格式碼
pub fn strip_formatting_codes(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            output.push(c);
        }
    }
    output
}

/// 將插件清單寫入文字檔，每個插件一行；必要時建立上層目錄
pub fn write_plugin_list(path: &Path, plugins: &[PluginInfo]) -> ShimResult<usize> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut contents = String::new();
    for plugin in plugins {
        contents.push_str(&plugin.list_line());
        contents.push('\n');
    }
    fs::write(path, contents)?;

    info!("已將 {} 個插件寫入 {}", plugins.len(), path.display());
    Ok(plugins.len())
}
