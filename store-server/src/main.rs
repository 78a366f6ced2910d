use store_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    setup_environment()?;

    // 2. 加载配置
    let config = Config::from_env();

    if !config.is_production() {
        print_banner();
    }

    tracing::info!("Laptop store server starting...");
    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        primary = config.primary_snapshot_url.as_deref().unwrap_or("-"),
        mirror = config.mirror_snapshot_url.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    // 3. 初始化服务器状态 (本地缓存水合)
    let state = ServerState::initialize(&config)?;

    // 4. 启动 HTTP 服务器 (Server::run 会自动启动后台任务)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
