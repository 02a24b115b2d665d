//! 存在性检测器核心：一次抓取 + 按策略判定
//! 网络层失败在这里被显式折叠为"无法判定"（found = false），不会向调用方抛出

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::analyzer::classify;
use crate::config::GlobalConfig;
use crate::error::RsfResult;
use crate::http::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};
use crate::service::{InconclusiveReason, ProbeResult, ServiceProfile, Verdict};

/// 默认单次探测超时
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 存在性检测器
#[derive(Clone)]
pub struct PresenceDetector {
    client: Arc<dyn HttpClient>,
    probe_timeout: Duration,
}

impl fmt::Debug for PresenceDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceDetector")
            .field("probe_timeout", &self.probe_timeout)
            .finish_non_exhaustive()
    }
}

impl PresenceDetector {
    /// 使用外部传入的客户端创建检测器
    pub fn new(client: Arc<dyn HttpClient>, probe_timeout: Duration) -> Self {
        Self { client, probe_timeout }
    }

    /// 按全局配置创建检测器（内部构建 reqwest 客户端）
    pub fn with_config(config: &GlobalConfig) -> RsfResult<Self> {
        let client = ReqwestHttpClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.http_timeout))
    }

    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.client
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// 探测单个服务
    pub async fn detect(&self, username: &str, profile: &ServiceProfile) -> ProbeResult {
        detect_with_timeout(self.client.as_ref(), self.probe_timeout, username, profile).await
    }
}

/// 探测单个服务（默认超时）
pub async fn detect(username: &str, profile: &ServiceProfile, client: &dyn HttpClient) -> ProbeResult {
    detect_with_timeout(client, DEFAULT_PROBE_TIMEOUT, username, profile).await
}

async fn detect_with_timeout(
    client: &dyn HttpClient,
    probe_timeout: Duration,
    username: &str,
    profile: &ServiceProfile,
) -> ProbeResult {
    // 1. 构建探测地址与展示地址
    let target_url = profile.target_url(username);
    let display_url = profile.display_url(username);

    // 2. 发起请求，网络层失败折叠为无法判定
    let verdict = match probe(client, probe_timeout, &target_url).await {
        Ok(response) => {
            // 3. 按策略判定
            let verdict = classify(&profile.strategy, &response);
            debug!(
                "Probed [{}] via {}: status={}, final_url={}, verdict={:?}",
                profile.name,
                profile.strategy.tag(),
                response.status,
                response.final_url,
                verdict
            );
            verdict
        }
        Err(err) => {
            warn!("Probe of [{}] at {} failed: {}", profile.name, target_url, err);
            Verdict::Inconclusive(InconclusiveReason::Transport(err))
        }
    };

    // 4. 组装结果
    ProbeResult::new(profile, verdict, display_url)
}

// 单次请求，附加独立于客户端实现的超时
async fn probe(
    client: &dyn HttpClient,
    probe_timeout: Duration,
    url: &str,
) -> Result<HttpResponse, TransportError> {
    match tokio::time::timeout(probe_timeout, client.get(url)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    }
}
