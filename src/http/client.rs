//! 基于 reqwest 的探测客户端
//! 连接池复用、浏览器请求头、固定超时、自动跟随重定向、Cookie 会话

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;

use super::{HttpClient, HttpResponse, TransportError};
use crate::config::GlobalConfig;
use crate::error::{RsfResult, RsfootprintError};

/// reqwest 探测客户端（clone 共享同一连接池）
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    max_body_bytes: usize,
}

impl ReqwestHttpClient {
    /// 按全局配置构建客户端
    pub fn new(config: &GlobalConfig) -> RsfResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, Self::header_value("User-Agent", &config.user_agent)?);
        headers.insert(ACCEPT, Self::header_value("Accept", &config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, Self::header_value("Accept-Language", &config.accept_language)?);
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .cookie_store(true)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// 使用外部构建的 reqwest 客户端
    pub fn from_client(client: Client, max_body_bytes: usize) -> Self {
        Self { client, max_body_bytes }
    }

    fn header_value(name: &str, value: &str) -> RsfResult<HeaderValue> {
        HeaderValue::from_str(value)
            .map_err(|e| RsfootprintError::InvalidConfig(format!("无效Header {}：{}", name, e)))
    }

    // reqwest 错误归类
    fn classify_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_redirect() {
            TransportError::Redirect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidUrl(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::classify_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await.map_err(Self::classify_error)? {
            let remaining = self.max_body_bytes - body.len();
            // 恰好读满上限时继续读下一块，确认是否还有剩余数据
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                debug!("Response body of {} truncated at {} bytes", url, self.max_body_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse::new(status, final_url, String::from_utf8_lossy(&body).into_owned())
            .with_truncated(truncated))
    }
}
