//! 全局配置管理,存储所有可配置项

use std::time::Duration;

use crate::error::{RsfResult, RsfootprintError};

/// 默认浏览器请求头（部分目标站点会对默认/爬虫UA返回降级或拦截页面）
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// 探测节奏策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingPolicy {
    /// 不限速
    None,
    /// 全局最小请求间隔（所有探测共享同一个闸门）
    MinInterval(Duration),
}

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 单次探测超时
    pub http_timeout: Duration,
    // 整次扫描的截止时间（None 表示不限制）
    pub scan_timeout: Option<Duration>,
    // 并发探测数上限
    pub concurrency: usize,
    // 探测节奏
    pub pacing: PacingPolicy,
    // 最大跟随重定向次数
    pub max_redirects: usize,
    // 响应体读取上限（字节）
    pub max_body_bytes: usize,
    // 请求头
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    // 是否启用详细日志（命令行据此选择日志级别）
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            scan_timeout: None,
            concurrency: 4,
            pacing: PacingPolicy::MinInterval(Duration::from_millis(500)),
            max_redirects: 10,
            max_body_bytes: 2 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            verbose: false,
        }
    }
}

impl GlobalConfig {
    /// 校验配置合法性
    pub fn validate(&self) -> RsfResult<()> {
        if self.concurrency == 0 {
            return Err(RsfootprintError::InvalidConfig("concurrency 必须大于 0".to_string()));
        }
        if self.http_timeout.is_zero() {
            return Err(RsfootprintError::InvalidConfig("http_timeout 必须大于 0".to_string()));
        }
        if self.scan_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RsfootprintError::InvalidConfig("scan_timeout 必须大于 0".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(RsfootprintError::InvalidConfig("max_body_bytes 必须大于 0".to_string()));
        }
        Ok(())
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn scan_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.scan_timeout = timeout;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn pacing(mut self, pacing: PacingPolicy) -> Self {
        self.config.pacing = pacing;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.config.max_body_bytes = max_body_bytes;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// 构建并校验配置
    pub fn build(self) -> RsfResult<GlobalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_probe_contract() {
        let config = ConfigManager::get_default();
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.pacing, PacingPolicy::MinInterval(Duration::from_millis(500)));
        assert!(config.user_agent.contains("Mozilla/5.0"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_zero_concurrency() {
        let result = ConfigManager::custom().concurrency(0).build();
        assert!(matches!(result, Err(RsfootprintError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_zero_scan_timeout() {
        let result = ConfigManager::custom()
            .scan_timeout(Some(Duration::ZERO))
            .build();
        assert!(matches!(result, Err(RsfootprintError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_chains_values() {
        let config = ConfigManager::custom()
            .concurrency(2)
            .pacing(PacingPolicy::None)
            .http_timeout(Duration::from_secs(3))
            .verbose(true)
            .build()
            .unwrap();
        assert_eq!(config.concurrency, 2);
        assert!(config.verbose);
        assert_eq!(config.pacing, PacingPolicy::None);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }
}
