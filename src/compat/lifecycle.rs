use crate::compat::registry::PatchRegistry;
use crate::config::SettingsHandle;
use crate::fault::{install_panic_observer, BoxError, FaultBoundary};
use std::sync::Arc;
use tracing::info;

/// 已知需要相容性處理的插件
pub const PROBLEMATIC_PLUGINS: [&str; 4] = ["create", "kubejs", "apotheosis", "ars_nouveau"];

/// 宿主啟動期間套用插件修正的檢查點
#[derive(Debug)]
pub struct CompatLifecycle {
    patches: Arc<PatchRegistry>,
    boundary: Arc<FaultBoundary>,
    settings: SettingsHandle,
    plugins: Vec<String>,
    install_observer: bool,
}

impl CompatLifecycle {
    pub fn new(
        patches: Arc<PatchRegistry>,
        boundary: Arc<FaultBoundary>,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            patches,
            boundary,
            settings,
            plugins: PROBLEMATIC_PLUGINS.iter().map(|id| id.to_string()).collect(),
            install_observer: true,
        }
    }

    /// 替換需要處理的插件清單
    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    /// 早期檢查點不安裝全域故障觀察器
    pub fn without_observer(mut self) -> Self {
        self.install_observer = false;
        self
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// 其他插件初始化之前：套用修正，然後安裝全域故障觀察器
    ///
    /// 回傳至少有一個修正成功的插件數。
    pub fn early_checkpoint(&self) -> usize {
        let applied = self.run_checkpoint("早期");
        if self.install_observer {
            install_panic_observer(self.boundary.clone());
        }
        applied
    }

    /// 所有插件初始化之後再套用一次修正
    pub fn late_checkpoint(&self) -> usize {
        self.run_checkpoint("後期")
    }

    /// 按需套用單一插件的修正
    pub fn apply_on_demand(&self, scope: &str) -> bool {
        if !self.settings.enable_compatibility_fixes() {
            return false;
        }
        self.patches.apply_fixes(scope)
    }

    fn run_checkpoint(&self, stage: &str) -> usize {
        if !self.settings.enable_compatibility_fixes() {
            info!("已停用相容性修正，略過{}檢查點", stage);
            return 0;
        }

        info!("套用{}相容性修正", stage);
        self.plugins
            .iter()
            .filter(|plugin| {
                let context = format!("套用 {} 的{}修正", plugin, stage);
                self.boundary.run_guarded_with_default(
                    || Ok::<_, BoxError>(self.patches.apply_fixes(plugin)),
                    &context,
                    false,
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShimConfig;
    use crate::fault::FaultClassifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lifecycle_with(settings: SettingsHandle, runs: Arc<AtomicUsize>) -> CompatLifecycle {
        let boundary = Arc::new(FaultBoundary::new(
            Arc::new(FaultClassifier::with_defaults()),
            settings.clone(),
        ));
        let mut patches = PatchRegistry::new(boundary.clone());
        for plugin in ["create", "kubejs"] {
            let runs = runs.clone();
            patches.register_fix(plugin, "count", move || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            });
        }
        CompatLifecycle::new(Arc::new(patches), boundary, settings).without_observer()
    }

    #[test]
    fn test_checkpoints_apply_known_plugins() {
        let runs = Arc::new(AtomicUsize::new(0));
        let lifecycle = lifecycle_with(SettingsHandle::new(), runs.clone());

        assert_eq!(lifecycle.plugins().len(), 4);
        assert_eq!(lifecycle.early_checkpoint(), 2);
        assert_eq!(lifecycle.late_checkpoint(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_disabled_fixes_skip_everything() {
        let mut config = ShimConfig::default();
        config.compat.enable_compatibility_fixes = false;
        let runs = Arc::new(AtomicUsize::new(0));
        let lifecycle = lifecycle_with(SettingsHandle::with_config(config), runs.clone());

        assert_eq!(lifecycle.early_checkpoint(), 0);
        assert_eq!(lifecycle.late_checkpoint(), 0);
        assert!(!lifecycle.apply_on_demand("create"));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_custom_plugin_list_and_on_demand() {
        let runs = Arc::new(AtomicUsize::new(0));
        let lifecycle = lifecycle_with(SettingsHandle::new(), runs.clone()).with_plugins(["kubejs"]);

        assert_eq!(lifecycle.late_checkpoint(), 1);
        assert!(lifecycle.apply_on_demand("create"));
        assert!(!lifecycle.apply_on_demand("apotheosis"));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
