//! 替身模組
//!
//! 目錄決定哪些符號受管理，載入掛鉤在宿主解析失敗時提供替身的二進位表示，
//! 結果登記表記錄每次成功或失敗的替換。

pub mod catalog;
pub mod error;
pub mod hook;
pub mod registry;
pub mod source;
pub mod standin;

pub use catalog::StubCatalog;
pub use error::{ResolveError, StubError, StubResult};
pub use hook::{FallbackResolver, HostResolver, LoaderHook, MapHostResolver};
pub use registry::{OutcomeRecord, OutcomeRegistry};
pub use source::{EmbeddedStubSource, StubSource};
pub use standin::{
    DefaultValue, InertBufferBuilder, InertKeyMapping, InertModelPart, InertRenderSystem,
    InertResourceLocation, InertScreen, MemberSig, StandInDescriptor, StandInKind, StubImage,
    STUB_IMAGE_VERSION, TRANSPARENT_IDENTITY,
};
