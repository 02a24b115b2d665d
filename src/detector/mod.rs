//! 检测模块：存在性判定核心逻辑
pub mod global;
pub mod analyzer;
pub mod detector;

// 导出核心接口
pub use self::global::builtin_registry;
pub use self::analyzer::{
    classify, JsonAnalyzer, RedirectAnalyzer, StatusAnalyzer, TextAnalyzer,
};
pub use self::detector::{detect, PresenceDetector, DEFAULT_PROBE_TIMEOUT};
