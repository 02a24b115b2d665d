//! 服务画像数据模型定义
//! 服务画像只描述"如何探测、如何判定"，加载后不可变；探测结果为一次性值对象

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RsfResult, RsfootprintError};
use crate::http::TransportError;

/// 用户名替换槽位
pub const USERNAME_SLOT: &str = "{}";

/// JSON 策略默认的存在性键
pub const DEFAULT_PRESENCE_KEYS: &[&str] = &["data", "kind"];
/// 重定向策略默认的否定标记（命中即视为被跳转到通用页面）
pub const DEFAULT_NEGATIVE_MARKERS: &[&str] = &["login", "home.php", "auth", "signup", "unavailable", "404"];
/// 文本策略默认的缺失标记
pub const DEFAULT_ABSENCE_MARKER: &str = "not found";

// 匹配任意 {...} 占位符
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*\}").expect("placeholder regex is valid")
});

/// 带唯一用户名槽位的URL模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
}

impl UrlTemplate {
    /// 解析并校验模板：必须恰好包含一个 `{}`，且替换后是合法的 http(s) 地址
    pub fn parse(service: &str, raw: &str) -> RsfResult<Self> {
        let invalid = |reason: String| RsfootprintError::InvalidTemplate {
            service: service.to_string(),
            reason,
        };

        let mut slots = 0;
        for placeholder in PLACEHOLDER_RE.find_iter(raw) {
            if placeholder.as_str() != USERNAME_SLOT {
                return Err(invalid(format!("不支持的占位符 {}", placeholder.as_str())));
            }
            slots += 1;
        }
        if slots != 1 {
            return Err(invalid(format!("需要恰好 1 个 {{}} 槽位，实际 {} 个", slots)));
        }

        let sample = raw.replacen(USERNAME_SLOT, "probe", 1);
        let parsed = Url::parse(&sample).map_err(|e| invalid(format!("{}：{}", sample, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("不支持的协议 {}", parsed.scheme())));
        }

        Ok(Self { raw: raw.to_string() })
    }

    /// 原样替换用户名（不做编码，与目标站点的路径规则保持一致）
    pub fn render(&self, username: &str) -> String {
        self.raw.replacen(USERNAME_SLOT, username, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// 风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// 检测策略（封闭枚举，参数随变体携带）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionStrategy {
    /// 规范主页返回 200 即视为存在
    Status,
    /// 200 且解析为对象、无 error 键、含任一存在性键
    Json { presence_keys: Vec<String> },
    /// 最终URL不含否定标记且状态码为 200
    RedirectCheck { negative_markers: Vec<String> },
    /// 200 且响应体不含缺失标记
    TextSearch { absence_marker: String },
}

impl DetectionStrategy {
    pub fn json() -> Self {
        Self::Json {
            presence_keys: DEFAULT_PRESENCE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn redirect_check() -> Self {
        Self::RedirectCheck {
            negative_markers: DEFAULT_NEGATIVE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn text_search(absence_marker: impl Into<String>) -> Self {
        Self::TextSearch {
            absence_marker: absence_marker.into().to_lowercase(),
        }
    }

    /// 配置文件中的策略标签
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Json { .. } => "json",
            Self::RedirectCheck { .. } => "redirect_check",
            Self::TextSearch { .. } => "text_search",
        }
    }
}

/// 服务探测画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfile {
    pub name: String,
    pub url_template: UrlTemplate,
    pub display_url_template: Option<UrlTemplate>,
    pub strategy: DetectionStrategy,
    pub risk: RiskLevel,
    pub advice: String,
}

impl ServiceProfile {
    pub fn new(
        name: impl Into<String>,
        url_template: &str,
        strategy: DetectionStrategy,
        risk: RiskLevel,
        advice: impl Into<String>,
    ) -> RsfResult<Self> {
        let name = name.into();
        let url_template = UrlTemplate::parse(&name, url_template)?;
        Ok(Self {
            name,
            url_template,
            display_url_template: None,
            strategy,
            risk,
            advice: advice.into(),
        })
    }

    pub fn with_display_url(mut self, display_url_template: &str) -> RsfResult<Self> {
        self.display_url_template = Some(UrlTemplate::parse(&self.name, display_url_template)?);
        Ok(self)
    }

    /// 探测地址
    pub fn target_url(&self, username: &str) -> String {
        self.url_template.render(username)
    }

    /// 展示地址（未配置时与探测地址一致）
    pub fn display_url(&self, username: &str) -> String {
        self.display_url_template
            .as_ref()
            .unwrap_or(&self.url_template)
            .render(username)
    }
}

/// 服务定义（配置文件原始格式）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    #[serde(rename = "type")]
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_markers: Option<Vec<String>>,
    pub risk: RiskLevel,
    #[serde(default)]
    pub advice: String,
}

/// 无法给出确定结论的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconclusiveReason {
    /// 网络层失败（DNS/TLS/连接/超时等）
    Transport(TransportError),
    /// 被限流
    RateLimited(u16),
    /// 目标站点服务端错误
    ServerError(u16),
    /// 响应体不是合法的结构化数据
    MalformedPayload,
    /// 响应体超出读取上限，已读部分不足以下结论
    TruncatedBody,
}

impl fmt::Display for InconclusiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "request failed: {}", e),
            Self::RateLimited(code) => write!(f, "rate limited (HTTP {})", code),
            Self::ServerError(code) => write!(f, "server error (HTTP {})", code),
            Self::MalformedPayload => f.write_str("unparsable response payload"),
            Self::TruncatedBody => f.write_str("response body exceeded the read limit"),
        }
    }
}

/// 探测结论（三态）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Found,
    NotFound,
    Inconclusive(InconclusiveReason),
}

impl Verdict {
    pub fn found(&self) -> bool {
        matches!(self, Verdict::Found)
    }

    pub fn from_found(found: bool) -> Self {
        if found { Verdict::Found } else { Verdict::NotFound }
    }
}

/// 单个服务的探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub service_name: String,
    pub verdict: Verdict,
    pub display_url: String,
    pub risk: RiskLevel,
    pub advice: String,
}

impl ProbeResult {
    pub fn new(profile: &ServiceProfile, verdict: Verdict, display_url: String) -> Self {
        Self {
            service_name: profile.name.clone(),
            verdict,
            display_url,
            risk: profile.risk,
            advice: profile.advice.clone(),
        }
    }

    pub fn found(&self) -> bool {
        self.verdict.found()
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.found() { "FOUND" } else { "NOT_FOUND" };
        write!(f, "{} [{}] {}", self.service_name, status, self.display_url)
    }
}

/// 共享的服务画像
pub type SharedProfile = Arc<ServiceProfile>;
