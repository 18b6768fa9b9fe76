use crate::config::LogConfig;
use crate::shim::{ShimError, ShimResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全域日誌
///
/// `RUST_LOG` 存在時優先於配置的等級。重複初始化回傳錯誤。
pub fn init_logging(config: &LogConfig) -> ShimResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ShimError::Logging(format!("無效的日誌等級 {}: {}", config.level, e)))?;

    let result = if config.is_json() {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_thread_names(true)
                .finish(),
        )
    };
    result.map_err(|e| ShimError::Logging(format!("設置日誌系統失敗: {}", e)))?;

    info!("日誌系統初始化完成");
    Ok(())
}
