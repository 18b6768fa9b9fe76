// symbol.rs - 符號識別碼
//
// 宿主以全限定名稱解析可載入單元（類型/類別）。名稱可能以點號或斜線分隔，
// 也可能帶有資源後綴，本模組將其正規化為唯一的點號形式。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 資源形式的後綴
const RESOURCE_SUFFIX: &str = ".class";

/// 全限定、已正規化的符號名稱
///
/// 建立後不可變，作為目錄、結果登記表與修補登記表的共同鍵。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    /// 從原始名稱建立符號識別碼
    ///
    /// 去除首尾空白，將 `/` 轉為 `.`，再去除所有重複的 `.class` 後綴；
    /// 巢狀類型的 `$` 保留不變。
    pub fn new(raw: impl AsRef<str>) -> Self {
        let dotted = raw.as_ref().trim().replace('/', ".");
        let mut stem = dotted.as_str();
        while let Some(rest) = stem.strip_suffix(RESOURCE_SUFFIX) {
            stem = rest;
        }
        Self(stem.to_string())
    }

    /// 正規化後的名稱
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 斜線形式的資源路徑，例如 `gfx/Screen.class`
    pub fn resource_path(&self) -> String {
        format!("{}{}", self.0.replace('.', "/"), RESOURCE_SUFFIX)
    }

    /// 最後一段簡單名稱
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// 是否位於指定（已正規化）套件前綴之下
    pub fn is_within(&self, prefix: &PackagePrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SymbolId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for SymbolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 套件前綴，一律以 `.` 結尾
///
/// `gfx` 與 `gfx.` 都會正規化為 `gfx.`，因此不會誤配 `gfxtra.Widget`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackagePrefix(String);

impl PackagePrefix {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut normalized = raw.as_ref().trim().replace('/', ".");
        if !normalized.ends_with('.') {
            normalized.push('.');
        }
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackagePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
