//! 扫描报告
//! 结果顺序与请求顺序一致；对外输出形如
//! `{ username, total_scanned, found_count, results: [ {service, status, risk, url, advice, note?} ] }`

use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::RsfResult;
use crate::service::{ProbeResult, RiskLevel, Verdict};

/// 对外展示的二态结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Found,
    NotFound,
}

/// 报告中的单行
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReportEntry {
    pub service: String,
    pub status: ProbeStatus,
    pub risk: RiskLevel,
    pub url: String,
    pub advice: String,
    /// 无法判定时的说明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&ProbeResult> for ReportEntry {
    fn from(result: &ProbeResult) -> Self {
        let (status, note) = match &result.verdict {
            Verdict::Found => (ProbeStatus::Found, None),
            Verdict::NotFound => (ProbeStatus::NotFound, None),
            Verdict::Inconclusive(reason) => (ProbeStatus::NotFound, Some(reason.to_string())),
        };
        Self {
            service: result.service_name.clone(),
            status,
            risk: result.risk,
            url: result.display_url.clone(),
            advice: result.advice.clone(),
            note,
        }
    }
}

/// 完整扫描报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub username: String,
    pub total_scanned: usize,
    pub found_count: usize,
    pub results: Vec<ProbeResult>,
}

impl ScanReport {
    pub fn new(username: impl Into<String>, results: Vec<ProbeResult>) -> Self {
        let found_count = results.iter().filter(|r| r.found()).count();
        Self {
            username: username.into(),
            total_scanned: results.len(),
            found_count,
            results,
        }
    }

    /// 命中的服务
    pub fn found(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.found())
    }

    pub fn inconclusive_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.verdict, Verdict::Inconclusive(_)))
            .count()
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.results.iter().map(ReportEntry::from).collect()
    }

    pub fn to_json_pretty(&self) -> RsfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for ScanReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScanReport", 4)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field("total_scanned", &self.total_scanned)?;
        state.serialize_field("found_count", &self.found_count)?;
        state.serialize_field("results", &self.entries())?;
        state.end()
    }
}

// ======== 终端输出 ========
impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Footprint of '{}': {} of {} services found",
            self.username, self.found_count, self.total_scanned
        )?;
        let width = self
            .results
            .iter()
            .map(|r| r.service_name.chars().count())
            .max()
            .unwrap_or(0);
        for entry in self.entries() {
            let status = match entry.status {
                ProbeStatus::Found => "FOUND",
                ProbeStatus::NotFound => "NOT_FOUND",
            };
            writeln!(
                f,
                "  {:<width$}  {:<9}  {:<6}  {}",
                entry.service,
                status,
                entry.risk.to_string(),
                entry.url,
                width = width
            )?;
            if let Some(note) = &entry.note {
                writeln!(f, "  {:<width$}  note: {}", "", note, width = width)?;
            } else if entry.status == ProbeStatus::Found && !entry.advice.is_empty() {
                writeln!(f, "  {:<width$}  advice: {}", "", entry.advice, width = width)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportError;
    use crate::service::InconclusiveReason;
    use serde_json::json;

    fn result(name: &str, verdict: Verdict) -> ProbeResult {
        ProbeResult {
            service_name: name.to_string(),
            verdict,
            display_url: format!("https://{}.test/alice", name.to_lowercase()),
            risk: RiskLevel::Medium,
            advice: "Set account to Private.".to_string(),
        }
    }

    #[test]
    fn test_counts() {
        let report = ScanReport::new(
            "alice",
            vec![
                result("A", Verdict::Found),
                result("B", Verdict::NotFound),
                result("C", Verdict::Inconclusive(InconclusiveReason::RateLimited(429))),
            ],
        );
        assert_eq!(report.total_scanned, 3);
        assert_eq!(report.found_count, 1);
        assert_eq!(report.inconclusive_count(), 1);
        assert_eq!(report.found().map(|r| r.service_name.as_str()).collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn test_json_shape() {
        let report = ScanReport::new(
            "alice",
            vec![
                result("Instagram", Verdict::Found),
                result(
                    "Reddit",
                    Verdict::Inconclusive(InconclusiveReason::Transport(TransportError::Timeout)),
                ),
            ],
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "username": "alice",
                "total_scanned": 2,
                "found_count": 1,
                "results": [
                    {
                        "service": "Instagram",
                        "status": "FOUND",
                        "risk": "Medium",
                        "url": "https://instagram.test/alice",
                        "advice": "Set account to Private."
                    },
                    {
                        "service": "Reddit",
                        "status": "NOT_FOUND",
                        "risk": "Medium",
                        "url": "https://reddit.test/alice",
                        "advice": "Set account to Private.",
                        "note": "request failed: timed out"
                    }
                ]
            })
        );
    }

    #[test]
    fn test_display_lists_every_service() {
        let report = ScanReport::new(
            "alice",
            vec![result("GitHub", Verdict::Found), result("Pinterest", Verdict::NotFound)],
        );
        let text = report.to_string();
        assert!(text.contains("1 of 2 services found"));
        assert!(text.contains("GitHub"));
        assert!(text.contains("NOT_FOUND"));
    }
}
