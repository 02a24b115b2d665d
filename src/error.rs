//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use std::time::Duration;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum RsfootprintError {
    // 输入校验错误（扫描开始前返回，不产生任何网络请求）
    #[error("用户名不能为空")]
    EmptyUsername,
    #[error("未指定任何待扫描的服务")]
    NoServicesRequested,
    #[error("未知服务：{0}")]
    UnknownService(String),

    // 服务配置错误（注册表加载期返回）
    #[error("服务 [{service}] 的URL模板无效：{reason}")]
    InvalidTemplate { service: String, reason: String },
    #[error("服务 [{service}] 的检测策略未知：{strategy}")]
    UnknownStrategy { service: String, strategy: String },
    #[error("服务名称重复：{0}")]
    DuplicateService(String),
    #[error("服务注册表加载失败：{0}")]
    RegistryLoadError(String),
    #[error("配置无效：{0}")]
    InvalidConfig(String),

    // 扫描运行期错误
    #[error("HTTP客户端初始化失败：{0}")]
    HttpClientInit(#[from] reqwest::Error),
    #[error("扫描已取消（已完成 {completed}/{total}），部分结果已丢弃")]
    ScanCancelled { completed: usize, total: usize },
    #[error("扫描超时（{0:?}），部分结果已丢弃")]
    ScanTimedOut(Duration),
    #[error("异步任务执行失败：{0}")]
    AsyncTaskError(String),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
}

impl RsfootprintError {
    /// 是否为调用方输入错误（对外接口层应映射为 400 类错误）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyUsername | Self::NoServicesRequested | Self::UnknownService(_)
        )
    }
}

// 全局Result类型
pub type RsfResult<T> = Result<T, RsfootprintError>;
