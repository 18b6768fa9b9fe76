use crate::fault::kind::FaultKind;
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// 越過圍堵邊界的故障統一以此型別傳遞
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

// `Option::unwrap()` 遇到 `None` 時標準庫的 panic 訊息
const NONE_UNWRAP_MESSAGE: &str = "called `Option::unwrap()` on a `None` value";

/// 帶種類的結構化故障
///
/// 成因鏈透過 `Error::source` 暴露，因此分類器可以走訪任何普通的 Rust 錯誤鏈。
/// 成因以 `Arc` 保存，使故障可以被複製（例如從 panic 載荷中取回）。
#[derive(Debug, Clone)]
pub struct Fault {
    kind: FaultKind,
    message: String,
    cause: Option<Arc<dyn Error + Send + Sync + 'static>>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// 附加成因
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(Arc::from(cause.into()));
        self
    }

    pub fn missing_reference(symbol: impl fmt::Display) -> Self {
        Self::new(
            FaultKind::MissingReference,
            format!("找不到符號 {}", symbol),
        )
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 從 panic 載荷還原故障
    ///
    /// 以 `panic_any` 拋出的 `Fault` 保留原本的種類；`Option::unwrap()` 於 `None`
    /// 視為空值解參考；其他載荷一律視為沒有結構化資訊的 panic。
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(fault) = payload.downcast_ref::<Fault>() {
            return fault.clone();
        }

        let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "非字串的 panic 載荷".to_string()
        };

        let kind = if message.starts_with(NONE_UNWRAP_MESSAGE) {
            FaultKind::NullDereference
        } else {
            FaultKind::Panic
        };

        Self::new(kind, message)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// 取得錯誤的故障種類；只有 `Fault` 攜帶種類
pub fn kind_of(error: &(dyn Error + 'static)) -> Option<FaultKind> {
    error.downcast_ref::<Fault>().map(Fault::kind)
}
