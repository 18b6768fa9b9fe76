use crate::fault::Fault;
use crate::stub::standin::StandInKind;
use crate::symbol::SymbolId;
use thiserror::Error;

/// 替身實體化錯誤
#[derive(Error, Debug)]
pub enum StubError {
    /// 替身的封裝表示無法讀取
    #[error("無法讀取替身 {0} 的表示: {1}")]
    Unavailable(StandInKind, String),

    #[error("替身編碼錯誤: {0}")]
    Encode(String),

    #[error("替身解碼錯誤: {0}")]
    Decode(String),

    #[error("不支援的替身格式版本: {0}")]
    UnsupportedVersion(u16),
}

/// 符號解析錯誤
#[derive(Error, Debug)]
pub enum ResolveError {
    /// 宿主與替身都無法提供該符號
    #[error("符號解析失敗: {0}")]
    NotFound(#[source] Fault),
}

impl ResolveError {
    pub fn not_found(symbol: &SymbolId) -> Self {
        ResolveError::NotFound(Fault::missing_reference(symbol))
    }
}

/// 替身結果類型別名
pub type StubResult<T> = Result<T, StubError>;
