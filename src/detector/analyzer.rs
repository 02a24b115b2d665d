//! 检测分析器：按服务画像的策略对已获取的响应做判定
//! 所有分析器都是纯函数，给定相同响应结果恒定，不会失败

use serde_json::Value;
use tracing::debug;

use crate::http::HttpResponse;
use crate::service::{DetectionStrategy, InconclusiveReason, Verdict};

const HTTP_OK: u16 = 200;
const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// 状态码分析器
pub struct StatusAnalyzer;

impl StatusAnalyzer {
    /// 规范主页可达（200）即视为存在，不检查内容
    pub fn analyze(response: &HttpResponse) -> bool {
        response.status == HTTP_OK
    }
}

/// JSON接口分析器
pub struct JsonAnalyzer;

impl JsonAnalyzer {
    /// 200 + 可解析对象 + 无 error 键 + 含任一存在性键
    /// 响应体无法解析时返回 Err，交由调用方标记为无法判定
    pub fn analyze(response: &HttpResponse, presence_keys: &[String]) -> Result<bool, InconclusiveReason> {
        if response.status != HTTP_OK {
            return Ok(false);
        }

        let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
            debug!("JSON payload from {} is unparsable: {}", response.final_url, e);
            InconclusiveReason::MalformedPayload
        })?;

        let Value::Object(map) = payload else {
            return Ok(false);
        };
        if map.contains_key("error") {
            return Ok(false);
        }
        Ok(presence_keys.iter().any(|key| map.contains_key(key)))
    }
}

/// 重定向分析器
pub struct RedirectAnalyzer;

impl RedirectAnalyzer {
    /// 最终地址是否命中否定标记（大小写不敏感）
    pub fn hits_negative_marker(response: &HttpResponse, negative_markers: &[String]) -> bool {
        let final_url = response.final_url.to_lowercase();
        match negative_markers
            .iter()
            .find(|marker| final_url.contains(marker.to_lowercase().as_str()))
        {
            Some(marker) => {
                debug!("Final URL {} hits negative marker `{}`", response.final_url, marker);
                true
            }
            None => false,
        }
    }

    pub fn analyze(response: &HttpResponse, negative_markers: &[String]) -> bool {
        !Self::hits_negative_marker(response, negative_markers) && response.status == HTTP_OK
    }
}

/// 页面文本分析器
pub struct TextAnalyzer;

impl TextAnalyzer {
    /// 200 且响应体不含缺失标记（大小写不敏感）
    /// 响应体被截断且已读部分未见标记时返回 Err，标记可能位于未读部分
    pub fn analyze(response: &HttpResponse, absence_marker: &str) -> Result<bool, InconclusiveReason> {
        if response.status != HTTP_OK {
            return Ok(false);
        }
        if response.body.to_lowercase().contains(&absence_marker.to_lowercase()) {
            return Ok(false);
        }
        if response.truncated {
            debug!("Marker `{}` not in truncated body of {}", absence_marker, response.final_url);
            return Err(InconclusiveReason::TruncatedBody);
        }
        Ok(true)
    }
}

/// 按策略分派判定（穷尽匹配，新增策略未处理时无法编译）
pub fn classify(strategy: &DetectionStrategy, response: &HttpResponse) -> Verdict {
    let found = match strategy {
        DetectionStrategy::Status => StatusAnalyzer::analyze(response),
        DetectionStrategy::Json { presence_keys } => {
            match JsonAnalyzer::analyze(response, presence_keys) {
                Ok(found) => found,
                Err(reason) => return Verdict::Inconclusive(reason),
            }
        }
        DetectionStrategy::RedirectCheck { negative_markers } => {
            // 跳转到通用页面是明确的否定信号，与状态码无关
            if RedirectAnalyzer::hits_negative_marker(response, negative_markers) {
                return Verdict::NotFound;
            }
            RedirectAnalyzer::analyze(response, negative_markers)
        }
        DetectionStrategy::TextSearch { absence_marker } => {
            match TextAnalyzer::analyze(response, absence_marker) {
                Ok(found) => found,
                Err(reason) => return Verdict::Inconclusive(reason),
            }
        }
    };

    if found {
        return Verdict::Found;
    }
    match response.status {
        HTTP_TOO_MANY_REQUESTS => Verdict::Inconclusive(InconclusiveReason::RateLimited(response.status)),
        500..=599 => Verdict::Inconclusive(InconclusiveReason::ServerError(response.status)),
        _ => Verdict::NotFound,
    }
}
