use crate::config::types::ShimConfig;
use config::{Config, ConfigError, Environment as EnvSource, File};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 選擇配置環境的環境變數
pub const ENV_VAR: &str = "SHIM_ENV";
/// 配置目錄的環境變數，預設為 `config`
pub const CONFIG_DIR_VAR: &str = "SHIM_CONFIG_DIR";
// `SHIM__STUBS__ENABLE_STUB_CLASSES=false` 形式的覆寫
const OVERRIDE_PREFIX: &str = "SHIM";
const DEFAULT_CONFIG_DIR: &str = "config";

/// 配置環境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// 讀取 `SHIM_ENV`；未設定或無法識別時為開發環境
    pub fn from_env() -> Self {
        env::var(ENV_VAR)
            .map(|name| Self::parse(&name))
            .unwrap_or(Environment::Development)
    }

    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

/// 配置加載器
///
/// 合併環境對應的配置文件（可不存在）與環境變數覆寫，後者優先。
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
    environment: Environment,
}

impl ConfigLoader {
    pub fn new(dir: impl Into<PathBuf>, environment: Environment) -> Self {
        Self {
            dir: dir.into(),
            environment,
        }
    }

    /// 依 `SHIM_CONFIG_DIR` 與 `SHIM_ENV` 建立
    pub fn from_env() -> Self {
        let dir = env::var(CONFIG_DIR_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        Self::new(dir, Environment::from_env())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(self.environment.file_name())
    }

    /// 合併後的原始配置
    pub fn build(&self) -> Result<Config, ConfigError> {
        let path = self.config_path();
        debug!("載入配置: {} ({:?})", path.display(), self.environment);

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                EnvSource::with_prefix(OVERRIDE_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
    }

    pub fn load(&self) -> Result<ShimConfig, ConfigError> {
        self.build()?.try_deserialize()
    }
}
