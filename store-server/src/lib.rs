//! Laptop Store Server - 笔记本电脑门店实体存储
//!
//! # 架构概述
//!
//! - **实体存储** (`store`): 内存中的门店文档，所有写操作自动审计
//! - **审计** (`audit`): 追加式审计日志和查询
//! - **撤销/重做** (`history`): 可逆命令和有界历史
//! - **注册流程** (`registration`): 自助注册、邮箱确认、审批
//! - **同步** (`sync`): redb 本地缓存 + outbox，推送到主远程和镜像
//! - **HTTP API** (`api`): 快照主机、备份下载、同步状态
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── audit/         # 审计日志
//! ├── auth/          # Argon2 密码哈希
//! ├── history/       # 命令模式撤销/重做
//! ├── registration/  # 注册审批流程
//! ├── services/      # 快照文件存储
//! ├── store/         # 实体存储
//! ├── sync/          # 持久化同步
//! └── utils/         # 错误类型、日志
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod history;
pub mod registration;
pub mod services;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use history::CommandHistory;
pub use store::EntityStore;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 设置运行环境
///
/// 1. 加载 `.env`
/// 2. 创建工作目录
/// 3. 初始化日志 (`LOG_LEVEL`, `LOG_DIR`)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 可选
    let _ = dotenv::dotenv();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
    std::fs::create_dir_all(&work_dir)?;

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    if let Some(dir) = &log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __                __
   / /   ____ _____  / /_____  ____
  / /   / __ `/ __ \/ __/ __ \/ __ \
 / /___/ /_/ / /_/ / /_/ /_/ / /_/ /
/_____/\__,_/ .___/\__/\____/ .___/
           /_/             /_/
         Store Server v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
