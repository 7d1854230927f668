//! 行情查询错误

use actix_web::http::StatusCode;
use thiserror::Error;

use super::provider::ClientError;

/// `get_quote` 返回的错误，可克隆以便合并请求的调用方共享同一结果
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuoteError {
    /// 标的代码缺失或格式错误
    #[error("{0}")]
    InvalidArgument(String),
    /// 行情提供方没有该标的的数据
    #[error("No data found for the specified symbol: {0}")]
    NotFound(String),
    /// 行情提供方不可用
    #[error("Error fetching stock data: {0}")]
    Upstream(String),
}

impl QuoteError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            QuoteError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            QuoteError::NotFound(_) => StatusCode::NOT_FOUND,
            QuoteError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClientError> for QuoteError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Empty(symbol) => QuoteError::NotFound(symbol),
            ClientError::Unavailable(reason) => QuoteError::Upstream(reason),
        }
    }
}
