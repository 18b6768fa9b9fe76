use crate::stub::standin::{StandInDescriptor, StandInKind};
use crate::symbol::{PackagePrefix, SymbolId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// 替身目錄
///
/// 符號到替身描述的對應，加上整個屬於缺席子系統的套件前綴集合。
/// 在初始化階段填入，之後只讀共享。
#[derive(Debug, Clone, Default)]
pub struct StubCatalog {
    entries: HashMap<SymbolId, StandInDescriptor>,
    client_packages: Vec<PackagePrefix>,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以圖形客戶端的已知符號建立目錄
    pub fn with_defaults() -> Self {
        use StandInDescriptor::Transparent;
        use StandInKind::*;

        let mut catalog = Self::new();
        let entries: [(&str, StandInDescriptor); 45] = [
            ("net.minecraft.client.KeyMapping", KeyMapping.into()),
            ("net.minecraft.client.gui.screens.Screen", Screen.into()),
            ("com.mojang.blaze3d.vertex.BufferBuilder", BufferBuilder.into()),
            ("net.minecraft.client.model.geom.ModelPart", ModelPart.into()),
            ("net.minecraft.client.renderer.RenderType", Transparent),
            ("net.minecraft.client.renderer.GameRenderer", Transparent),
            ("net.minecraft.client.renderer.texture.TextureAtlas", Transparent),
            ("net.minecraft.client.renderer.texture.TextureManager", Transparent),
            ("net.minecraft.client.renderer.entity.EntityRenderer", Transparent),
            ("net.minecraft.client.renderer.entity.EntityRendererProvider", Transparent),
            ("net.minecraft.client.renderer.blockentity.BlockEntityRenderer", Transparent),
            ("net.minecraft.client.renderer.RenderSystem", RenderSystem.into()),
            (
                "net.minecraft.client.resources.model.ModelResourceLocation",
                ResourceLocation.into(),
            ),
            ("net.minecraft.client.Minecraft", Transparent),
            ("net.minecraft.client.gui.Font", Transparent),
            ("net.minecraft.client.gui.GuiGraphics", Transparent),
            ("net.minecraft.client.gui.components.AbstractWidget", Transparent),
            ("net.minecraft.client.gui.components.Button", Transparent),
            ("net.minecraft.client.gui.components.EditBox", Transparent),
            ("net.minecraft.client.gui.components.events.GuiEventListener", Transparent),
            ("net.minecraft.client.gui.narration.NarrationElementOutput", Transparent),
            (
                "net.minecraft.client.gui.screens.inventory.AbstractContainerScreen",
                Screen.into(),
            ),
            ("net.minecraft.client.gui.screens.inventory.InventoryScreen", Screen.into()),
            ("net.minecraft.client.gui.screens.TitleScreen", Screen.into()),
            ("net.minecraft.client.gui.screens.MenuScreens", Transparent),
            ("net.minecraft.client.gui.screens.MenuScreens$ScreenConstructor", Transparent),
            (
                "net.minecraft.client.gui.screens.worldselection.WorldSelectionList",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.worldselection.WorldSelectionList$WorldListEntry",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.worldselection.SelectWorldScreen",
                Screen.into(),
            ),
            (
                "net.minecraft.client.gui.screens.worldselection.CreateWorldScreen",
                Screen.into(),
            ),
            (
                "net.minecraft.client.gui.screens.worldselection.EditWorldScreen",
                Screen.into(),
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.JoinMultiplayerScreen",
                Screen.into(),
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerSelectionList",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerSelectionList$Entry",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerSelectionList$OnlineServerEntry",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerSelectionList$NetworkServerEntry",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerSelectionList$LanServerEntry",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerSelectionList$AddServerEntry",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.EditServerScreen",
                Screen.into(),
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.ServerStatusPinger",
                Transparent,
            ),
            ("net.minecraft.client.gui.screens.multiplayer.ServerData", Transparent),
            (
                "net.minecraft.client.gui.screens.multiplayer.LanServerDetection",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.LanServerDetection$LanServerList",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.LanServerDetection$LanServerDetector",
                Transparent,
            ),
            (
                "net.minecraft.client.gui.screens.multiplayer.LanServerDetection$LanServer",
                Transparent,
            ),
        ];

        for (symbol, stand_in) in entries {
            catalog.register(symbol, stand_in);
        }
        catalog.register_client_package("net.minecraft.client");
        catalog.register_client_package("com.mojang.blaze3d");
        catalog
    }

    /// 註冊替身；同一符號後註冊者覆蓋先前的條目
    pub fn register(&mut self, symbol: impl Into<SymbolId>, stand_in: impl Into<StandInDescriptor>) {
        let symbol = symbol.into();
        let stand_in = stand_in.into();
        debug!("註冊替身: {} -> {}", symbol, stand_in.identity());
        self.entries.insert(symbol, stand_in);
    }

    /// 宣告整個套件屬於缺席子系統
    pub fn register_client_package(&mut self, prefix: &str) {
        let prefix = PackagePrefix::new(prefix);
        if self.client_packages.contains(&prefix) {
            return;
        }
        debug!("註冊客戶端套件: {}", prefix);
        self.client_packages.push(prefix);
    }

    /// 精確查找
    pub fn lookup(&self, symbol: &SymbolId) -> Option<StandInDescriptor> {
        self.entries.get(symbol).copied()
    }

    /// 有明確條目或落在客戶端套件內的符號
    pub fn is_managed_symbol(&self, symbol: &SymbolId) -> bool {
        self.entries.contains_key(symbol) || self.in_client_package(symbol)
    }

    pub fn in_client_package(&self, symbol: &SymbolId) -> bool {
        self.client_packages
            .iter()
            .any(|prefix| symbol.is_within(prefix))
    }

    /// 明確條目的快照，不含僅由套件前綴涵蓋的符號
    pub fn all_managed_symbols(&self) -> BTreeSet<SymbolId> {
        self.entries.keys().cloned().collect()
    }

    pub fn client_packages(&self) -> &[PackagePrefix] {
        &self.client_packages
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_catalog_contents() {
        let catalog = StubCatalog::with_defaults();
        assert_eq!(catalog.len(), 45);
        assert_eq!(catalog.client_packages().len(), 2);
        assert_eq!(
            catalog.lookup(&SymbolId::new("net.minecraft.client.gui.screens.TitleScreen")),
            Some(StandInDescriptor::Concrete(StandInKind::Screen))
        );
        assert_eq!(
            catalog.lookup(&SymbolId::new("net/minecraft/client/Minecraft.class")),
            Some(StandInDescriptor::Transparent)
        );
    }

    #[test]
    fn test_register_last_wins() {
        let mut catalog = StubCatalog::new();
        catalog.register("gfx.Screen", StandInDescriptor::Transparent);
        catalog.register("gfx.Screen", StandInKind::Screen);

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.lookup(&SymbolId::new("gfx.Screen")),
            Some(StandInDescriptor::Concrete(StandInKind::Screen))
        );
    }

    #[rstest]
    #[case("gfx.Screen", true)]
    #[case("gfx.Widget", true)]
    #[case("gfx.ui.Button", true)]
    #[case("gfxtra.Widget", false)]
    #[case("unrelated.pkg.Thing", false)]
    fn test_is_managed_symbol(#[case] symbol: &str, #[case] managed: bool) {
        let mut catalog = StubCatalog::new();
        catalog.register("gfx.Screen", StandInKind::Screen);
        catalog.register_client_package("gfx");

        assert_eq!(catalog.is_managed_symbol(&SymbolId::new(symbol)), managed);
    }

    #[test]
    fn test_all_managed_symbols_excludes_prefix_matches() {
        let mut catalog = StubCatalog::new();
        catalog.register("gfx.Screen", StandInKind::Screen);
        catalog.register_client_package("gfx.");
        catalog.register_client_package("gfx");

        let symbols = catalog.all_managed_symbols();
        assert_eq!(symbols.len(), 1);
        assert!(symbols.contains(&SymbolId::new("gfx.Screen")));
        assert_eq!(catalog.client_packages().len(), 1);
    }
}
