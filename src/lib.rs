//! rsfootprint - Rust 用户名足迹探测工具
//! 对一组第三方服务逐一探测，判断给定用户名是否已注册，并附带风险等级与处置建议

// 导出全局错误类型
pub use self::error::{RsfootprintError, RsfResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, GlobalConfig, PacingPolicy};

// 导出服务模块核心接口
pub use self::service::{
    DetectionStrategy, InconclusiveReason, ProbeResult, RiskLevel, ServiceDefinition,
    ServiceLoader, ServiceProfile, ServiceRegistry, UrlTemplate, Verdict,
};

// 导出HTTP模块核心接口
pub use self::http::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};

// 导出检测模块核心接口
pub use self::detector::{builtin_registry, classify, detect, PresenceDetector};

// 导出扫描模块核心接口
pub use self::scan::{
    IntervalPacer, NoPacing, Pacer, ProbeStatus, ReportEntry, ScanReport, Scanner, ScannerBuilder,
};

// 取消扫描所用的令牌
pub use tokio_util::sync::CancellationToken;

// 声明所有子模块
pub mod config;
pub mod error;
pub mod service;
pub mod http;
pub mod detector;
pub mod scan;
