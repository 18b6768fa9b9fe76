use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use symbol_shim::config::{LogConfig, SettingsHandle, ShimConfig};
use symbol_shim::shim::{write_plugin_list, PluginInfo, ReportFormatter};
use symbol_shim::stub::{MapHostResolver, StubImage};
use symbol_shim::{init_logging, Distribution, ShimContext, SymbolId};
use tracing::{info, warn};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// 受限模式（圖形子系統缺席）
    Server,
    Client,
}

#[derive(Parser)]
#[command(name = "symbol_shim", about = "符號替換與故障圍堵層示範")]
struct Cli {
    /// 宿主的發行型態
    #[arg(short, long, value_enum, default_value = "server")]
    mode: Mode,

    /// 啟動後要解析的符號，可重複
    #[arg(short, long)]
    resolve: Vec<String>,

    /// 已安裝的插件，格式為 `顯示名稱|檔案名稱`，可重複
    #[arg(short, long)]
    plugin: Vec<String>,

    /// 將插件清單寫入此路徑
    #[arg(long)]
    plugin_list: Option<PathBuf>,

    /// 以 JSON 輸出狀態報告
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 載入配置，失敗時使用預設值
    let (config, load_error) = match ShimConfig::load_from_env() {
        Ok(config) => (config, None),
        Err(e) => (ShimConfig::default(), Some(e)),
    };
    init_logging(&config.log).or_else(|_| init_logging(&LogConfig::default()))?;
    if let Some(e) = load_error {
        warn!("無法載入配置，使用預設值: {}", e);
    }

    let distribution = match cli.mode {
        Mode::Server => Distribution::DedicatedServer,
        Mode::Client => Distribution::Client,
    };

    // 宿主本身提供的符號
    let host = MapHostResolver::new()
        .with_symbol("net.minecraft.resources.ResourceKey", b"host".to_vec())
        .with_symbol("net.minecraft.core.Registry", b"host".to_vec());

    let context = ShimContext::builder()
        .distribution(distribution)
        .settings(SettingsHandle::with_config(config))
        .host_resolver(Arc::new(host))
        .build();

    context.on_restricted_mode_detected();
    context.on_host_startup_complete();
    info!("{}", context.client_status());

    for raw in &cli.resolve {
        let symbol = SymbolId::new(raw);
        match context.resolve(&symbol) {
            Ok(bytes) => match StubImage::decode(&bytes) {
                Ok(image) => info!("{} -> {} ({} bytes)", symbol, image.stand_in, bytes.len()),
                Err(_) => info!("{} 由宿主提供 ({} bytes)", symbol, bytes.len()),
            },
            Err(e) => warn!("{}", e),
        }
    }

    if let Some(path) = &cli.plugin_list {
        let plugins = cli
            .plugin
            .iter()
            .map(|entry| {
                entry
                    .split_once('|')
                    .map(|(display, file)| PluginInfo::new(display.trim(), file.trim()))
                    .ok_or_else(|| anyhow!("無效的插件描述: {}", entry))
            })
            .collect::<Result<Vec<_>>>()?;
        write_plugin_list(path, &plugins)
            .with_context(|| format!("無法寫入插件清單 {}", path.display()))?;
    }

    let report = context.status_report();
    if cli.json {
        println!("{}", ReportFormatter::format_json(&report)?);
    } else {
        print!("{}", ReportFormatter::format_text(&report));
    }

    Ok(())
}
