use std::path::PathBuf;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录（redb 缓存、快照文件、日志） |
/// | HTTP_PORT | 3000 | 快照主机端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | PRIMARY_SNAPSHOT_URL | 未设置 | 主远程地址，未设置则禁用 |
/// | MIRROR_SNAPSHOT_URL | 未设置 | 镜像地址，未设置则禁用 |
/// | BACKUP_PREFIX | laptop-store | 备份文件名前缀 |
/// | HISTORY_LIMIT | 50 | 撤销深度 |
/// | SYNC_MAX_RETRIES | 3 | 推送重试次数（之后进入死信） |
/// | SYNC_RETRY_BASE_MS | 500 | 首次退避延迟 |
/// | REQUEST_TIMEOUT_MS | 30000 | 远程请求超时 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | 未设置 | 设置后启用文件日志 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/laptop-store PRIMARY_SNAPSHOT_URL=http://10.0.0.2:3000/api/snapshot/primary cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub primary_snapshot_url: Option<String>,
    pub mirror_snapshot_url: Option<String>,
    pub backup_prefix: String,
    pub history_limit: usize,
    pub sync_max_retries: u32,
    pub sync_retry_base_ms: u64,
    /// 远程请求超时 (毫秒)
    pub request_timeout_ms: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置，未设置的使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            primary_snapshot_url: env_opt("PRIMARY_SNAPSHOT_URL"),
            mirror_snapshot_url: env_opt("MIRROR_SNAPSHOT_URL"),
            backup_prefix: std::env::var("BACKUP_PREFIX")
                .unwrap_or_else(|_| "laptop-store".into()),
            history_limit: env_parse("HISTORY_LIMIT", 50),
            sync_max_retries: env_parse("SYNC_MAX_RETRIES", 3),
            sync_retry_base_ms: env_parse("SYNC_RETRY_BASE_MS", 500),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
        }
    }

    /// 使用自定义工作目录和端口覆盖（测试场景）
    ///
    /// 远程地址清空，避免测试访问环境里配置的真实远程。
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.primary_snapshot_url = None;
        config.mirror_snapshot_url = None;
        config
    }

    /// redb 本地缓存文件
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("store.redb")
    }

    /// 快照主机的文件目录
    pub fn snapshots_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("snapshots")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
