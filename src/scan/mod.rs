//! 扫描模块：编排多服务探测、节奏控制与报告汇总
pub mod pacing;
pub mod report;
pub mod scanner;

// 导出核心接口
pub use self::pacing::{pacer_for, IntervalPacer, NoPacing, Pacer};
pub use self::report::{ProbeStatus, ReportEntry, ScanReport};
pub use self::scanner::{Scanner, ScannerBuilder};
