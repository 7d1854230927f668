//! 行情缓存后端服务
//!
//! 为 Alpha Vantage 行情接口提供带有效期的持久化缓存，
//! 有效期内重复查询同一标的不再访问上游

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::io;
use std::sync::Arc;

use crate::config::{AppConfig, API_KEY_ENV};
use crate::services::quote::{AlphaVantageClient, QuoteService, SqliteQuoteStore};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// 应用程序入口
///
/// 加载配置，初始化缓存存储与行情客户端，启动 HTTP 服务器
#[actix_web::main]
async fn main() -> io::Result<()> {
    let (config, source) = AppConfig::load().map_err(|e| startup_error("加载配置失败", format!("{:#}", e)))?;

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match source {
        Some(path) => log::info!("从 {} 加载配置成功", path),
        None => log::info!("未找到配置文件，使用默认配置"),
    }
    if config.provider.api_key == "demo" {
        log::warn!("未设置 {}，使用 demo Key（仅支持 IBM）", API_KEY_ENV);
    }

    let store = SqliteQuoteStore::open(&config.cache.database_path, config.cache.pool_size)
        .map_err(|e| startup_error("打开缓存数据库失败", e))?;
    let client = AlphaVantageClient::new(&config.provider)
        .map_err(|e| startup_error("创建行情客户端失败", e))?;

    let policy = config
        .cache
        .policy()
        .map_err(|e| startup_error("缓存配置无效", format!("{:#}", e)))?;
    log::info!(
        "缓存有效期 {} 秒，刷新失败策略 {:?}",
        config.cache.ttl_secs,
        policy.on_refresh_failure
    );

    let service = web::Data::new(QuoteService::new(Arc::new(client), Arc::new(store), policy));

    let bind_addr = config.bind_addr();
    log::info!("启动行情缓存服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(service.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
