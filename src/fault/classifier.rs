use crate::fault::error::kind_of;
use crate::fault::kind::FaultKind;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use tracing::debug;

/// 故障分類條目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultClassification {
    pub kind: FaultKind,
    /// 人類可讀的標籤
    pub label: String,
    pub description: String,
    /// 命中時是否視為已處理
    pub suppress: bool,
}

/// 故障分類表
///
/// 在初始化階段建立並註冊條目，之後以 `Arc` 共享、只讀，不需要鎖。
#[derive(Debug, Clone, Default)]
pub struct FaultClassifier {
    entries: HashMap<FaultKind, FaultClassification>,
}

impl FaultClassifier {
    /// 建立空的分類表
    pub fn new() -> Self {
        Self::default()
    }

    /// 建立包含常見故障種類的分類表
    ///
    /// 六種已知種類全部抑制。`LinkIncompatibility` 同樣抑制：受限模式下缺席的子系統
    /// 本來就會讓部分連結失敗，讓宿主繼續運行是首要目標；部署端若要讓真正的相容性
    /// 破壞浮現，可在共享之前以 `register` 覆寫此條目。
    pub fn with_defaults() -> Self {
        let mut classifier = Self::new();
        classifier.register(
            FaultKind::MissingReference,
            "MissingReference",
            "嘗試載入不存在的符號時發生",
            true,
        );
        classifier.register(
            FaultKind::MissingTypeDefinition,
            "MissingTypeDefinition",
            "找不到所需符號的定義時發生",
            true,
        );
        classifier.register(
            FaultKind::IllegalAccess,
            "IllegalAccess",
            "嘗試存取不可存取的類別、欄位或方法時發生",
            true,
        );
        classifier.register(
            FaultKind::LinkIncompatibility,
            "LinkIncompatibility",
            "類別的相依項彼此不相容時發生",
            true,
        );
        classifier.register(
            FaultKind::NullDereference,
            "NullDereference",
            "在需要物件的地方使用了空值時發生",
            true,
        );
        classifier.register(
            FaultKind::InitializationFailure,
            "InitializationFailure",
            "靜態初始化期間拋出故障時發生",
            true,
        );
        classifier
    }

    /// 註冊（或覆寫）故障種類的分類
    pub fn register(
        &mut self,
        kind: FaultKind,
        label: impl Into<String>,
        description: impl Into<String>,
        suppress: bool,
    ) {
        let entry = FaultClassification {
            kind,
            label: label.into(),
            description: description.into(),
            suppress,
        };
        debug!("註冊故障分類: {} (suppress={})", entry.label, suppress);
        self.entries.insert(kind, entry);
    }

    /// 依種類查找：先精確比對，再由近到遠走訪上層種類
    pub fn lookup(&self, kind: FaultKind) -> Option<&FaultClassification> {
        self.entries.get(&kind).or_else(|| {
            kind.ancestors()
                .find_map(|ancestor| self.entries.get(&ancestor))
        })
    }

    /// 分類故障：取根因的種類後查表；根因不帶種類時為未分類
    pub fn classify(&self, fault: &(dyn Error + 'static)) -> Option<&FaultClassification> {
        kind_of(root_cause(fault)).and_then(|kind| self.lookup(kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// 成因鏈走訪的深度上限
const MAX_CAUSE_DEPTH: usize = 64;

/// 從故障本身開始的成因鏈
///
/// 遇到先前出現過的成因時停止，因此環狀鏈也會終止；鏈長不超過固定上限。
pub fn cause_chain<'a>(fault: &'a (dyn Error + 'static)) -> Vec<&'a (dyn Error + 'static)> {
    let mut chain = vec![fault];
    let mut current = fault;
    while let Some(next) = current.source() {
        if chain.len() >= MAX_CAUSE_DEPTH || chain.iter().any(|seen| same_error(*seen, next)) {
            break;
        }
        chain.push(next);
        current = next;
    }
    chain
}

/// 成因鏈最內層的故障
pub fn root_cause<'a>(fault: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    cause_chain(fault).last().copied().unwrap_or(fault)
}

// 位址與具體類型都相同才算同一個錯誤；包裝類型的第一個欄位與外層共用位址
fn same_error(a: &(dyn Error + 'static), b: &(dyn Error + 'static)) -> bool {
    std::ptr::eq(a as *const dyn Error, b as *const dyn Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Fault;
    use rstest::rstest;
    use std::fmt;

    #[derive(Debug)]
    struct SelfLoop(u8);

    impl fmt::Display for SelfLoop {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "self loop {}", self.0)
        }
    }

    impl Error for SelfLoop {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct Wrapper(Fault);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped: {}", self.0)
        }
    }

    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[derive(Debug)]
    struct Ping(u8);
    #[derive(Debug)]
    struct Pong(u8);

    static PING: Ping = Ping(1);
    static PONG: Pong = Pong(2);

    impl fmt::Display for Ping {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "ping {}", self.0)
        }
    }

    impl fmt::Display for Pong {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "pong {}", self.0)
        }
    }

    impl Error for Ping {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&PONG)
        }
    }

    impl Error for Pong {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&PING)
        }
    }

    #[rstest]
    #[case(FaultKind::MissingReference, Some(FaultKind::MissingReference))]
    #[case(FaultKind::IllegalAccess, Some(FaultKind::IllegalAccess))]
    #[case(FaultKind::MissingMember, Some(FaultKind::LinkIncompatibility))]
    #[case(FaultKind::Verification, Some(FaultKind::LinkIncompatibility))]
    #[case(FaultKind::InvalidState, None)]
    #[case(FaultKind::Resolution, None)]
    #[case(FaultKind::Panic, None)]
    fn test_lookup_exact_then_ancestor(
        #[case] kind: FaultKind,
        #[case] expected: Option<FaultKind>,
    ) {
        let classifier = FaultClassifier::with_defaults();
        assert_eq!(classifier.lookup(kind).map(|entry| entry.kind), expected);
    }

    #[test]
    fn test_most_specific_ancestor_wins() {
        let mut classifier = FaultClassifier::with_defaults();
        classifier.register(
            FaultKind::IncompatibleChange,
            "IncompatibleChange",
            "class changed",
            false,
        );

        let entry = classifier.lookup(FaultKind::MissingMember).unwrap();
        assert_eq!(entry.kind, FaultKind::IncompatibleChange);
        assert!(!entry.suppress);
    }

    #[test]
    fn test_classify_uses_root_cause() {
        let classifier = FaultClassifier::with_defaults();
        let fault = Fault::new(FaultKind::Panic, "outer").with_cause(
            Fault::new(FaultKind::Runtime, "middle")
                .with_cause(Fault::new(FaultKind::NullDereference, "inner")),
        );

        let entry = classifier.classify(&fault).unwrap();
        assert_eq!(entry.kind, FaultKind::NullDereference);
        assert_eq!(cause_chain(&fault).len(), 3);
    }

    #[test]
    fn test_classify_untyped_root_is_unclassified() {
        let classifier = FaultClassifier::with_defaults();
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let fault = Fault::new(FaultKind::MissingReference, "outer").with_cause(io);
        assert!(classifier.classify(&fault).is_none());
    }

    #[test]
    fn test_self_referencing_cause_terminates() {
        // 同一類型的 vtable 可能在不同編譯單元各有一份，至多多走一步
        let looped = SelfLoop(7);
        let chain = cause_chain(&looped);
        assert!(chain.len() <= 2);
        assert_eq!(root_cause(&looped).to_string(), "self loop 7");
    }

    #[test]
    fn test_two_step_cycle_terminates() {
        let chain = cause_chain(&PING);
        assert!((2..=4).contains(&chain.len()));
        assert!(FaultClassifier::with_defaults().classify(&PING).is_none());
    }

    #[test]
    fn test_newtype_wrapper_reaches_inner_fault() {
        let wrapped = Wrapper(Fault::new(FaultKind::NullDereference, "registry not ready"));

        let chain = cause_chain(&wrapped);
        assert_eq!(chain.len(), 2);
        assert_eq!(root_cause(&wrapped).to_string(), "registry not ready");

        let classifier = FaultClassifier::with_defaults();
        let entry = classifier.classify(&wrapped).unwrap();
        assert_eq!(entry.kind, FaultKind::NullDereference);
        assert!(entry.suppress);
    }

    #[test]
    fn test_deep_chain_is_capped() {
        let mut fault = Fault::new(FaultKind::IllegalAccess, "innermost");
        for depth in 0..100 {
            fault = Fault::new(FaultKind::Runtime, format!("layer {}", depth)).with_cause(fault);
        }

        assert_eq!(cause_chain(&fault).len(), MAX_CAUSE_DEPTH);
    }
}
