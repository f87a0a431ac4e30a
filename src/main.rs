// src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use prebid_edge::adapter::{Builder, SmartAdServerBuilder};
use prebid_edge::api;
use prebid_edge::bidding::ExchangeClient;
use prebid_edge::config::load_config_bytes;
use prebid_edge::logging::RuntimeLogger;
use prebid_edge::mock_exchange;
use prebid_edge::AppState;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "An OpenRTB edge auction server for Smart AdServer")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// PBS 配置文件路径
    #[arg(short, long, default_value = "pbs.yaml")]
    config: PathBuf,
    /// 发往交易所的单次请求超时（毫秒）
    #[arg(long, default_value_t = 1000)]
    exchange_timeout_ms: u64,
    /// 设置后在该端口启动模拟交易所
    #[arg(long)]
    mock_exchange_port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let log_file = rolling::hourly(&args.log_dir, "edge_log.json");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(non_blocking));
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    // 运行日志：服务状态与每次竞价的汇总
    let runtime_logger = RuntimeLogger::new(&args.log_dir, "runtime", 1000, 100, 1000);
    runtime_logger.log("INFO", "edge server is starting...").await;

    // 冷启动时构建一次适配器；配置无效或未启用时拒绝对外服务
    let bidder = match load_config_bytes(&args.config)
        .and_then(|raw| SmartAdServerBuilder.build_bidder(&raw))
    {
        Ok(bidder) => bidder,
        Err(e) => {
            error!(config = %args.config.display(), error = %e, "failed to build bidder");
            runtime_logger
                .log("ERROR", &format!("failed to build bidder: {}", e))
                .await;
            runtime_logger.shutdown().await;
            return ExitCode::FAILURE;
        }
    };
    info!(bidder = bidder.name(), "built bidder");
    runtime_logger
        .log("INFO", &format!("built {} bidder", bidder.name()))
        .await;

    if let Some(port) = args.mock_exchange_port {
        tokio::spawn(async move {
            if let Err(e) = mock_exchange::start_mock_exchange(port).await {
                error!(port, error = %e, "mock exchange stopped");
            }
        });
    }

    let state = Arc::new(AppState {
        bidder: Arc::from(bidder),
        transport: ExchangeClient::new(args.exchange_timeout_ms),
        runtime_logger: runtime_logger.clone(),
    });
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "failed to bind listener");
            runtime_logger.shutdown().await;
            return ExitCode::FAILURE;
        }
    };
    info!("edge server starting on port {}", args.port);
    runtime_logger
        .log("INFO", &format!("edge server running at http://{}", addr))
        .await;

    let served = serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await;

    let exit = match served {
        Ok(()) => {
            runtime_logger.log("INFO", "edge server shut down.").await;
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "server error");
            runtime_logger.log("ERROR", &format!("server error: {}", e)).await;
            ExitCode::FAILURE
        }
    };
    runtime_logger.shutdown().await;
    exit
}
