//! 扫描编排器
//! 输入校验 → 解析服务 → 有界并发探测（含节奏控制）→ 按请求顺序汇总
//! 结果顺序 = 请求顺序（重复服务只探测一次，保留首次出现的位置）

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::pacing::{pacer_for, Pacer};
use super::report::ScanReport;
use crate::config::GlobalConfig;
use crate::detector::{PresenceDetector, DEFAULT_PROBE_TIMEOUT};
use crate::error::{RsfResult, RsfootprintError};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::service::{ProbeResult, ServiceRegistry};

/// 扫描器
#[derive(Clone)]
pub struct Scanner {
    registry: Arc<ServiceRegistry>,
    detector: PresenceDetector,
    pacer: Arc<dyn Pacer>,
    concurrency: usize,
    scan_timeout: Option<Duration>,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("services", &self.registry.len())
            .field("detector", &self.detector)
            .field("concurrency", &self.concurrency)
            .field("scan_timeout", &self.scan_timeout)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// 按全局配置创建扫描器（内部构建 reqwest 客户端，整个扫描器生命周期内复用连接池）
    pub fn new(registry: Arc<ServiceRegistry>, config: &GlobalConfig) -> RsfResult<Self> {
        let client = ReqwestHttpClient::new(config)?;
        Self::builder(registry, Arc::new(client)).config(config).build()
    }

    /// 自定义构建（注入客户端/节奏策略）
    pub fn builder(registry: Arc<ServiceRegistry>, client: Arc<dyn HttpClient>) -> ScannerBuilder {
        ScannerBuilder::new(registry, client)
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// 扫描指定服务
    pub async fn scan<S: AsRef<str>>(&self, username: &str, services: &[S]) -> RsfResult<ScanReport> {
        self.scan_with_cancel(username, services, CancellationToken::new()).await
    }

    /// 扫描注册表中的全部服务（注册顺序）
    pub async fn scan_all(&self, username: &str) -> RsfResult<ScanReport> {
        let names: Vec<String> = self.registry.names().into_iter().map(str::to_string).collect();
        self.scan(username, names.as_slice()).await
    }

    /// 可取消的扫描：取消或超过整体截止时间时中止所有在途请求，丢弃部分结果
    pub async fn scan_with_cancel<S: AsRef<str>>(
        &self,
        username: &str,
        services: &[S],
        cancel: CancellationToken,
    ) -> RsfResult<ScanReport> {
        // 1. 输入校验（不产生任何网络请求）
        let username = username.trim();
        if username.is_empty() {
            return Err(RsfootprintError::EmptyUsername);
        }
        if services.is_empty() {
            return Err(RsfootprintError::NoServicesRequested);
        }

        // 2. 解析服务，未知服务直接失败
        let profiles = self.registry.resolve(services)?;
        let total = profiles.len();
        if cancel.is_cancelled() {
            return Err(RsfootprintError::ScanCancelled { completed: 0, total });
        }
        info!("Scanning username [{}] across {} services", username, total);

        // 3. 有界并发探测
        let username: Arc<str> = Arc::from(username);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (position, profile) in profiles.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let pacer = Arc::clone(&self.pacer);
            let detector = self.detector.clone();
            let username = Arc::clone(&username);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| RsfootprintError::AsyncTaskError(e.to_string()))?;
                pacer.pace().await;
                let result = detector.detect(&username, &profile).await;
                Ok::<_, RsfootprintError>((position, result))
            });
        }

        // 4. 按请求位置回填结果
        let mut slots: Vec<Option<ProbeResult>> = vec![None; total];
        let mut completed = 0;
        let scan_timeout = self.scan_timeout;
        let deadline = async move {
            match scan_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    warn!("Scan of [{}] cancelled after {}/{} probes", username, completed, total);
                    return Err(RsfootprintError::ScanCancelled { completed, total });
                }
                _ = &mut deadline => {
                    tasks.abort_all();
                    let timeout = scan_timeout.unwrap_or_default();
                    warn!("Scan of [{}] exceeded {:?} after {}/{} probes", username, timeout, completed, total);
                    return Err(RsfootprintError::ScanTimedOut(timeout));
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok((position, result)))) => {
                        debug!("Probe {}/{} finished: {}", completed + 1, total, result);
                        slots[position] = Some(result);
                        completed += 1;
                    }
                    Some(Ok(Err(e))) => {
                        tasks.abort_all();
                        return Err(e);
                    }
                    Some(Err(join_err)) => {
                        tasks.abort_all();
                        return Err(RsfootprintError::AsyncTaskError(join_err.to_string()));
                    }
                },
            }
        }

        let results = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| RsfootprintError::AsyncTaskError("probe result missing".to_string()))?;

        let report = ScanReport::new(username.as_ref(), results);
        info!(
            "Scan of [{}] finished: {}/{} found",
            report.username, report.found_count, report.total_scanned
        );
        Ok(report)
    }
}

/// 扫描器构建器
pub struct ScannerBuilder {
    registry: Arc<ServiceRegistry>,
    client: Arc<dyn HttpClient>,
    pacer: Option<Arc<dyn Pacer>>,
    probe_timeout: Duration,
    concurrency: usize,
    scan_timeout: Option<Duration>,
}

impl ScannerBuilder {
    pub fn new(registry: Arc<ServiceRegistry>, client: Arc<dyn HttpClient>) -> Self {
        let defaults = GlobalConfig::default();
        Self {
            registry,
            client,
            pacer: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            concurrency: defaults.concurrency,
            scan_timeout: defaults.scan_timeout,
        }
    }

    /// 从全局配置读取超时、并发与节奏
    pub fn config(mut self, config: &GlobalConfig) -> Self {
        self.probe_timeout = config.http_timeout;
        self.concurrency = config.concurrency;
        self.scan_timeout = config.scan_timeout;
        self.pacer = Some(pacer_for(config.pacing));
        self
    }

    pub fn pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn scan_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn build(self) -> RsfResult<Scanner> {
        if self.concurrency == 0 {
            return Err(RsfootprintError::InvalidConfig("concurrency 必须大于 0".to_string()));
        }
        let pacer = self
            .pacer
            .unwrap_or_else(|| pacer_for(GlobalConfig::default().pacing));
        Ok(Scanner {
            registry: self.registry,
            detector: PresenceDetector::new(self.client, self.probe_timeout),
            pacer,
            concurrency: self.concurrency,
            scan_timeout: self.scan_timeout,
        })
    }
}
