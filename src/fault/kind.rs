use serde::{Deserialize, Serialize};
use std::fmt;

/// 故障種類
///
/// 以標記枚舉表示，並以明確的上層關係表（`parent`）取代語言層面的子型別圖。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// 符號解析失敗（泛稱）
    Resolution,
    /// 引用的符號完全找不到
    MissingReference,
    /// 兩個已解析的定義在結構上不相容
    LinkIncompatibility,
    /// 找到符號但其定義缺失或不完整
    MissingTypeDefinition,
    /// 類別結構在編譯後發生了不相容的變更
    IncompatibleChange,
    /// 存取控制違規
    IllegalAccess,
    /// 引用的成員不存在
    MissingMember,
    /// 原生連結失敗
    UnsatisfiedLink,
    /// 定義未通過驗證
    Verification,
    /// 相依項的一次性初始化失敗
    InitializationFailure,
    /// 執行期故障（泛稱）
    Runtime,
    /// 空值解參考
    NullDereference,
    /// 物件處於不允許該操作的狀態
    InvalidState,
    /// 沒有結構化資訊的 panic
    Panic,
}

impl FaultKind {
    pub const ALL: [FaultKind; 14] = [
        FaultKind::Resolution,
        FaultKind::MissingReference,
        FaultKind::LinkIncompatibility,
        FaultKind::MissingTypeDefinition,
        FaultKind::IncompatibleChange,
        FaultKind::IllegalAccess,
        FaultKind::MissingMember,
        FaultKind::UnsatisfiedLink,
        FaultKind::Verification,
        FaultKind::InitializationFailure,
        FaultKind::Runtime,
        FaultKind::NullDereference,
        FaultKind::InvalidState,
        FaultKind::Panic,
    ];

    /// 直接上層種類
    pub fn parent(self) -> Option<FaultKind> {
        use FaultKind::*;
        match self {
            MissingReference => Some(Resolution),
            MissingTypeDefinition | IncompatibleChange | UnsatisfiedLink | Verification
            | InitializationFailure => Some(LinkIncompatibility),
            IllegalAccess | MissingMember => Some(IncompatibleChange),
            NullDereference | InvalidState => Some(Runtime),
            Resolution | LinkIncompatibility | Runtime | Panic => None,
        }
    }

    /// 由近到遠的所有上層種類
    pub fn ancestors(self) -> impl Iterator<Item = FaultKind> {
        std::iter::successors(self.parent(), |kind| kind.parent())
    }

    /// `self` 是否等於 `other` 或為其後代
    pub fn is_a(self, other: FaultKind) -> bool {
        self == other || self.ancestors().any(|kind| kind == other)
    }

    pub fn as_str(self) -> &'static str {
        use FaultKind::*;
        match self {
            Resolution => "resolution",
            MissingReference => "missing_reference",
            LinkIncompatibility => "link_incompatibility",
            MissingTypeDefinition => "missing_type_definition",
            IncompatibleChange => "incompatible_change",
            IllegalAccess => "illegal_access",
            MissingMember => "missing_member",
            UnsatisfiedLink => "unsatisfied_link",
            Verification => "verification",
            InitializationFailure => "initialization_failure",
            Runtime => "runtime",
            NullDereference => "null_dereference",
            InvalidState => "invalid_state",
            Panic => "panic",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
