//! 服务模块：负责服务画像的数据模型、加载与注册表
pub mod model;
pub mod loader;
pub mod registry;

// 导出核心接口
pub use self::model::{
    DetectionStrategy, InconclusiveReason, ProbeResult, RiskLevel, ServiceDefinition,
    ServiceProfile, SharedProfile, UrlTemplate, Verdict,
};
pub use self::loader::{ServiceLoader, BUILTIN_SERVICES_JSON};
pub use self::registry::ServiceRegistry;
