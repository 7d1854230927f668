//! 行情缓存服务
//!
//! 以持久化缓存为行情提供方（Alpha Vantage）做回源代理：
//! 有效期内的重复查询直接由缓存返回，过期或缺失时回源刷新并写回

mod alphavantage;
mod cache;
mod common;
mod diff;
mod error;
mod freshness;
mod normalize;
mod provider;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use alphavantage::AlphaVantageClient;
pub use cache::{CachePolicy, OnRefreshFailure, QuoteService};
pub use store::SqliteQuoteStore;

#[cfg(test)]
pub use provider::ClientError;
