use std::path::Path;
use std::process::ExitCode;

use anti_judol::utils::logging::init_log_file;
use anti_judol::{logger, App, Config};
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            // 配置加载失败时日志可能还没初始化
            logger::init();
            error!("❌ 启动失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<u8> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    init_log_file(&config.output_log_file)?;
    logger::init_with_file(Path::new(&config.output_log_file))?;

    // Ctrl+C 只设置取消标记，由采集会话在状态边界处响应
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到 Ctrl+C，正在保存已采集的数据...");
            watcher.cancel();
        }
    });

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    let summary = app.run(&cancel).await;

    Ok(summary.exit_code())
}
