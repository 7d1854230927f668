//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod quote; // 行情缓存服务
