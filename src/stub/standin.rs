//! 替身實作庫
//!
//! 一組固定、行為惰性的型別，滿足呼叫端對缺席子系統型別的結構預期：
//! 方法不做任何事，存取器回傳預設值。每種替身同時提供宣告式的成員清單，
//! 作為其二進位表示（`StubImage`）的內容。

use crate::stub::error::StubError;
use crate::symbol::SymbolId;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 二進位表示的格式版本
pub const STUB_IMAGE_VERSION: u16 = 1;

/// 透明替身的識別名稱
pub const TRANSPARENT_IDENTITY: &str = "Transparent";

/// 固定的替身種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandInKind {
    Screen,
    KeyMapping,
    BufferBuilder,
    ModelPart,
    RenderSystem,
    ResourceLocation,
}

impl StandInKind {
    pub const ALL: [StandInKind; 6] = [
        StandInKind::Screen,
        StandInKind::KeyMapping,
        StandInKind::BufferBuilder,
        StandInKind::ModelPart,
        StandInKind::RenderSystem,
        StandInKind::ResourceLocation,
    ];

    /// 替身的識別名稱，即對應惰性型別的名稱
    pub fn identity(self) -> &'static str {
        match self {
            StandInKind::Screen => "InertScreen",
            StandInKind::KeyMapping => "InertKeyMapping",
            StandInKind::BufferBuilder => "InertBufferBuilder",
            StandInKind::ModelPart => "InertModelPart",
            StandInKind::RenderSystem => "InertRenderSystem",
            StandInKind::ResourceLocation => "InertResourceLocation",
        }
    }

    /// 惰性型別的成員簽名
    pub fn members(self) -> Vec<MemberSig> {
        use DefaultValue::*;
        match self {
            StandInKind::Screen => vec![
                MemberSig::method("width", &[], Int(0)),
                MemberSig::method("height", &[], Int(0)),
                MemberSig::method("title", &[], Text("Stub Screen".to_string())),
            ],
            StandInKind::KeyMapping => vec![
                MemberSig::method("name", &[], Text(String::new())),
                MemberSig::method("key_code", &[], Int(0)),
                MemberSig::method("category", &[], Text(String::new())),
                MemberSig::method("is_down", &[], Bool(false)),
                MemberSig::method("is_pressed", &[], Bool(false)),
            ],
            StandInKind::BufferBuilder => vec![
                MemberSig::method("begin", &["i32", "i32"], Unit),
                MemberSig::method("end", &[], Unit),
                MemberSig::method("is_building", &[], Bool(false)),
                MemberSig::method("vertex_count", &[], Int(0)),
            ],
            StandInKind::ModelPart => vec![
                MemberSig::method("render", &[], Unit),
                MemberSig::method("render_with_rotation", &["f32"], Unit),
                MemberSig::method("set_rotation_point", &["f32", "f32", "f32"], Unit),
                MemberSig::method("set_rotation_angles", &["f32", "f32", "f32"], Unit),
            ],
            StandInKind::RenderSystem => vec![
                MemberSig::function("set_shader_color", &["f32", "f32", "f32", "f32"], Unit),
                MemberSig::function("enable_blend", &[], Unit),
                MemberSig::function("disable_blend", &[], Unit),
                MemberSig::function("enable_cull", &[], Unit),
                MemberSig::function("disable_cull", &[], Unit),
                MemberSig::function("enable_depth_test", &[], Unit),
                MemberSig::function("disable_depth_test", &[], Unit),
                MemberSig::function(
                    "set_shader_texture",
                    &["i32", "InertResourceLocation"],
                    Unit,
                ),
            ],
            StandInKind::ResourceLocation => vec![
                MemberSig::method("namespace", &[], Text("minecraft".to_string())),
                MemberSig::method("path", &[], Text(String::new())),
            ],
        }
    }
}

impl fmt::Display for StandInKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identity())
    }
}

/// 替身描述
///
/// `Transparent` 表示呼叫端從不檢查成員，任何型別都能滿足，是退化的情況。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandInDescriptor {
    Concrete(StandInKind),
    Transparent,
}

impl StandInDescriptor {
    pub fn identity(&self) -> &'static str {
        match self {
            StandInDescriptor::Concrete(kind) => kind.identity(),
            StandInDescriptor::Transparent => TRANSPARENT_IDENTITY,
        }
    }

    pub fn concrete(&self) -> Option<StandInKind> {
        match self {
            StandInDescriptor::Concrete(kind) => Some(*kind),
            StandInDescriptor::Transparent => None,
        }
    }
}

impl From<StandInKind> for StandInDescriptor {
    fn from(kind: StandInKind) -> Self {
        StandInDescriptor::Concrete(kind)
    }
}

/// 成員回傳的預設值
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum DefaultValue {
    Unit,
    Bool(bool),
    Int(i64),
    Text(String),
}

/// 宣告式成員簽名，行為一律為空操作
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MemberSig {
    pub name: String,
    pub params: Vec<String>,
    pub returns: DefaultValue,
    /// 是否為不需要接收者的關聯函式
    pub is_static: bool,
}

impl MemberSig {
    fn method(name: &str, params: &[&str], returns: DefaultValue) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|param| param.to_string()).collect(),
            returns,
            is_static: false,
        }
    }

    fn function(name: &str, params: &[&str], returns: DefaultValue) -> Self {
        Self {
            is_static: true,
            ..Self::method(name, params, returns)
        }
    }
}

/// 替身的二進位表示
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StubImage {
    pub format_version: u16,
    /// 透明替身會帶上所代替的符號；具體替身與符號無關
    pub symbol: Option<String>,
    pub stand_in: String,
    pub members: Vec<MemberSig>,
}

impl StubImage {
    pub fn for_kind(kind: StandInKind) -> Self {
        Self {
            format_version: STUB_IMAGE_VERSION,
            symbol: None,
            stand_in: kind.identity().to_string(),
            members: kind.members(),
        }
    }

    pub fn transparent(symbol: &SymbolId) -> Self {
        Self {
            format_version: STUB_IMAGE_VERSION,
            symbol: Some(symbol.to_string()),
            stand_in: TRANSPARENT_IDENTITY.to_string(),
            members: Vec::new(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StubError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| StubError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StubError> {
        let (image, _) =
            bincode::decode_from_slice::<StubImage, _>(bytes, bincode::config::standard())
                .map_err(|e| StubError::Decode(e.to_string()))?;
        if image.format_version != STUB_IMAGE_VERSION {
            return Err(StubError::UnsupportedVersion(image.format_version));
        }
        Ok(image)
    }
}

// 以下為各替身的惰性型別

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InertScreen {
    width: i32,
    height: i32,
    title: String,
}

impl Default for InertScreen {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            title: "Stub Screen".to_string(),
        }
    }
}

impl InertScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InertKeyMapping {
    name: String,
    key_code: i32,
    category: String,
}

impl InertKeyMapping {
    pub fn new(name: impl Into<String>, key_code: i32, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_code,
            category: category.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_code(&self) -> i32 {
        self.key_code
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// 伺服器上沒有鍵盤
    pub fn is_down(&self) -> bool {
        false
    }

    pub fn is_pressed(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InertBufferBuilder {
    vertex_count: usize,
    building: bool,
}

impl InertBufferBuilder {
    pub fn with_capacity(_initial_capacity: usize) -> Self {
        Self::default()
    }

    pub fn begin(&mut self, _mode: i32, _format: i32) {
        self.building = true;
    }

    pub fn end(&mut self) {
        self.building = false;
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InertModelPart;

impl InertModelPart {
    pub fn render(&self) {}

    pub fn render_with_rotation(&self, _partial_ticks: f32) {}

    pub fn set_rotation_point(&mut self, _x: f32, _y: f32, _z: f32) {}

    pub fn set_rotation_angles(&mut self, _x: f32, _y: f32, _z: f32) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InertRenderSystem;

impl InertRenderSystem {
    pub fn set_shader_color(_r: f32, _g: f32, _b: f32, _a: f32) {}

    pub fn enable_blend() {}

    pub fn disable_blend() {}

    pub fn enable_cull() {}

    pub fn disable_cull() {}

    pub fn enable_depth_test() {}

    pub fn disable_depth_test() {}

    pub fn set_shader_texture(_texture_unit: i32, _texture: &InertResourceLocation) {}
}

/// `namespace:path` 形式的資源位置，未指定命名空間時為 `minecraft`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InertResourceLocation {
    namespace: String,
    path: String,
}

impl InertResourceLocation {
    pub fn parse(resource_name: &str) -> Self {
        match resource_name.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new("minecraft", resource_name),
        }
    }

    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for InertResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}
