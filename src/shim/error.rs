use thiserror::Error;

/// 上下文層級錯誤
#[derive(Error, Debug)]
pub enum ShimError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("日誌初始化錯誤: {0}")]
    Logging(String),
}

/// 上下文結果類型別名
pub type ShimResult<T> = Result<T, ShimError>;
