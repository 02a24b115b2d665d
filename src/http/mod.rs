//! HTTP模块：探测请求的出站边界
//! 探测器只依赖 `HttpClient` trait，生产环境使用 reqwest 实现，测试中注入模拟客户端
pub mod client;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use self::client::ReqwestHttpClient;

/// 单次探测的网络层错误（不会越过探测器边界）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("redirect failed: {0}")]
    Redirect(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("failed to read body: {0}")]
    Body(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// 已完成的HTTP响应（重定向跟随之后）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// 最终响应状态码
    pub status: u16,
    /// 跟随重定向后的最终地址
    pub final_url: String,
    /// 响应体文本（按上限截断，非UTF-8字节有损替换）
    pub body: String,
    /// 响应体是否因超出上限被截断
    pub truncated: bool,
}

impl HttpResponse {
    pub fn new(status: u16, final_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            body: body.into(),
            truncated: false,
        }
    }

    /// 标记响应体已截断
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

/// 探测用HTTP客户端
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// 发起一次 GET 请求，自动跟随重定向
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}
