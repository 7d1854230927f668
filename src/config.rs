//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，API Key 可由环境变量覆盖

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::services::quote::{CachePolicy, OnRefreshFailure};

/// 行情提供方 API Key 的环境变量名
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 行情提供方配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 接口地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API Key
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 行情缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存有效期（秒）
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// 刷新失败时的处理方式
    #[serde(default)]
    pub on_refresh_failure: OnRefreshFailure,
    /// SQLite 数据库文件路径
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// 连接池大小
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 行情提供方配置
    #[serde(default)]
    pub provider: ProviderConfig,
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_base_url() -> String { "https://www.alphavantage.co/query".to_string() }
fn default_api_key() -> String { "demo".to_string() }
fn default_timeout() -> u64 { 10 }
fn default_connect_timeout() -> u64 { 5 }
fn default_ttl() -> u64 { 24 * 60 * 60 }
fn default_database_path() -> String { "quotes.db".to_string() }
fn default_pool_size() -> u32 { 8 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            on_refresh_failure: OnRefreshFailure::default(),
            database_path: default_database_path(),
            pool_size: default_pool_size(),
        }
    }
}

impl CacheConfig {
    /// 转换为编排器使用的缓存策略，有效期超出范围时报错
    pub fn policy(&self) -> anyhow::Result<CachePolicy> {
        let ttl = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .with_context(|| format!("cache.ttl_secs 超出范围: {}", self.ttl_secs))?;

        Ok(CachePolicy {
            ttl,
            on_refresh_failure: self.on_refresh_failure,
        })
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
        Ok(config)
    }

    /// 加载配置，优先从文件，文件不存在则使用默认值
    ///
    /// 返回配置及其来源文件；日志系统此时尚未初始化，来源由调用方记录
    pub fn load() -> anyhow::Result<(Self, Option<&'static str>)> {
        let config_paths = ["config.json", "config/config.json"];

        let mut source = None;
        let mut config = Self::default();
        for path in config_paths {
            if Path::new(path).exists() {
                config = Self::from_file(path)?;
                source = Some(path);
                break;
            }
        }

        config.apply_env(env::var(API_KEY_ENV).ok());
        config
            .validate()
            .with_context(|| format!("配置校验失败 ({})", source.unwrap_or("默认配置")))?;
        Ok((config, source))
    }

    /// 校验无法由 serde 默认值保证的取值
    pub fn validate(&self) -> anyhow::Result<()> {
        self.cache.policy()?;
        Ok(())
    }

    /// 应用环境变量覆盖
    fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = key.trim().to_string();
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
