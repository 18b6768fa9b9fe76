use crate::stub::error::StubResult;
use crate::stub::standin::{StandInKind, StubImage};

/// 替身封裝表示的來源
///
/// 讀取可能涉及 I/O，結果由呼叫端依替身種類快取。
pub trait StubSource: Send + Sync {
    fn read_image(&self, kind: StandInKind) -> StubResult<Vec<u8>>;
}

/// 由內建惰性型別形狀編碼出表示的來源
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedStubSource;

impl StubSource for EmbeddedStubSource {
    fn read_image(&self, kind: StandInKind) -> StubResult<Vec<u8>> {
        StubImage::for_kind(kind).encode()
    }
}
