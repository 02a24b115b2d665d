//! rsfootprint 命令行入口
//!
//! 运行命令：
//! cargo run --features cli -- alice -s GitHub -s Reddit

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rsfootprint::{
    builtin_registry, CancellationToken, ConfigManager, GlobalConfig, PacingPolicy, Scanner,
    ServiceLoader,
};
use tracing_subscriber::EnvFilter;

/// 用户名足迹探测：检查用户名在各第三方服务上是否已注册
#[derive(Parser, Debug)]
#[command(name = "rsfootprint", version, about)]
struct Cli {
    /// 待探测的用户名
    #[arg(required_unless_present = "list")]
    username: Option<String>,

    /// 指定服务（可重复；不指定则扫描全部）
    #[arg(short = 's', long = "service", value_name = "NAME")]
    services: Vec<String>,

    /// 自定义服务定义文件（JSON数组）
    #[arg(long, value_name = "PATH")]
    services_file: Option<PathBuf>,

    /// 并发探测数
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// 相邻两次探测的最小间隔（毫秒，0 表示不限速）
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// 单次探测超时（秒）
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// 整次扫描截止时间（秒）
    #[arg(long)]
    scan_timeout_secs: Option<u64>,

    /// 以JSON输出报告
    #[arg(long)]
    json: bool,

    /// 列出可用服务后退出
    #[arg(long)]
    list: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. 构建配置并初始化日志
    let pacing = match cli.interval_ms {
        0 => PacingPolicy::None,
        ms => PacingPolicy::MinInterval(Duration::from_millis(ms)),
    };
    let config = ConfigManager::custom()
        .concurrency(cli.concurrency)
        .pacing(pacing)
        .http_timeout(Duration::from_secs(cli.timeout_secs))
        .scan_timeout(cli.scan_timeout_secs.map(Duration::from_secs))
        .verbose(cli.verbose)
        .build()?;
    init_logging(&config);

    // 2. 加载服务注册表
    let registry = match &cli.services_file {
        Some(path) => ServiceLoader::from_file(path)
            .await
            .with_context(|| format!("failed to load services from {}", path.display()))?,
        None => builtin_registry()?.clone(),
    };

    if cli.list {
        for profile in registry.all() {
            println!(
                "{:<14} {:<15} risk={:<6} {}",
                profile.name,
                profile.strategy.tag(),
                profile.risk.to_string(),
                profile.display_url("{}")
            );
        }
        return Ok(());
    }

    // 3. 构建扫描器
    let scanner = Scanner::new(Arc::new(registry), &config)?;

    let services: Vec<String> = if cli.services.is_empty() {
        scanner.registry().names().into_iter().map(str::to_string).collect()
    } else {
        cli.services.clone()
    };

    // 4. Ctrl-C 取消扫描
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    // 5. 执行扫描并输出
    let username = cli.username.unwrap_or_default();
    let report = scanner
        .scan_with_cancel(&username, services.as_slice(), cancel)
        .await
        .context("scan failed")?;

    if cli.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn init_logging(config: &GlobalConfig) {
    let level = if config.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rsfootprint={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
