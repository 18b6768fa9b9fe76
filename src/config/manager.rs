use crate::config::loader::{ConfigLoader, Environment};
use crate::config::types::ShimConfig;
use crate::config::validation::Validator;
use config::ConfigError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

// 尚未載入配置時使用的預設值
static DEFAULT_CONFIG: Lazy<Arc<ShimConfig>> = Lazy::new(|| Arc::new(ShimConfig::default()));

/// 延遲讀取的配置句柄
///
/// 由行程根上下文建立一次，複製後分發給載入鉤子、故障邊界與修補檢查點。
/// 宿主可能在這些元件開始工作之後才載入配置，因此每個開關都是在查詢時才讀取，
/// 未載入時回落到預設值而不是失敗。
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Option<Arc<ShimConfig>>>>,
}

impl SettingsHandle {
    /// 建立尚未載入配置的句柄
    pub fn new() -> Self {
        Self::default()
    }

    /// 建立已載入指定配置的句柄
    pub fn with_config(config: ShimConfig) -> Self {
        let handle = Self::new();
        handle.load(config);
        handle
    }

    /// 安裝（或重新載入）配置
    pub fn load(&self, config: ShimConfig) {
        if let Err(err) = config.validate() {
            warn!("配置驗證失敗: {}", err);
        } else {
            debug!("配置驗證通過");
        }

        let reloaded = self.inner.write().replace(Arc::new(config)).is_some();
        debug!("配置已{}", if reloaded { "重新載入" } else { "載入" });
    }

    /// 從環境變數指定的環境載入配置
    pub fn load_from_env(&self) -> Result<(), ConfigError> {
        self.load(ShimConfig::load_from_env()?);
        Ok(())
    }

    /// 是否已載入配置
    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }

    /// 當前生效的配置；未載入時為預設值
    pub fn current(&self) -> Arc<ShimConfig> {
        match self.inner.read().as_ref() {
            Some(config) => Arc::clone(config),
            None => Arc::clone(&DEFAULT_CONFIG),
        }
    }

    pub fn enable_stub_classes(&self) -> bool {
        self.current().stubs.enable_stub_classes
    }

    pub fn log_stub_loading(&self) -> bool {
        self.current().stubs.log_stub_loading
    }

    pub fn log_loaded_stubs(&self) -> bool {
        self.current().stubs.log_loaded_stubs
    }

    pub fn enable_compatibility_fixes(&self) -> bool {
        self.current().compat.enable_compatibility_fixes
    }

    pub fn log_exceptions(&self) -> bool {
        self.current().faults.log_exceptions
    }

    pub fn log_exception_stack_traces(&self) -> bool {
        self.current().faults.log_exception_stack_traces
    }
}

/// ShimConfig 加載方法實現
impl ShimConfig {
    /// 從環境變數指定的環境加載配置
    pub fn load_from_env() -> Result<Self, ConfigError> {
        ConfigLoader::from_env().load()
    }

    /// 從指定目錄與環境加載配置
    pub fn load_from_dir(config_dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        ConfigLoader::new(config_dir, env).load()
    }
}
