//! 服务注册表加载器
//! 负责从内置数据、JSON文本或本地文件构建并校验服务注册表
//! 所有配置错误（模板、策略、重名）都在此处拒绝，运行期不做兜底

use std::path::Path;

use tracing::{debug, warn};

use super::model::{
    DetectionStrategy, ServiceDefinition, ServiceProfile, DEFAULT_ABSENCE_MARKER,
};
use super::registry::ServiceRegistry;
use crate::error::{RsfResult, RsfootprintError};

/// 内置服务数据
pub const BUILTIN_SERVICES_JSON: &str = include_str!("../../data/services.json");

/// 服务注册表加载器
pub struct ServiceLoader;

impl ServiceLoader {
    /// 加载内置服务注册表
    pub fn builtin() -> RsfResult<ServiceRegistry> {
        Self::from_json_str(BUILTIN_SERVICES_JSON)
    }

    /// 从JSON文本加载（数组顺序即注册顺序）
    pub fn from_json_str(json: &str) -> RsfResult<ServiceRegistry> {
        let definitions: Vec<ServiceDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// 从本地JSON文件加载
    pub async fn from_file(path: impl AsRef<Path>) -> RsfResult<ServiceRegistry> {
        let path = path.as_ref();
        let data = tokio::fs::read_to_string(path).await?;
        debug!("Read service definitions from {}, {} bytes", path.display(), data.len());
        Self::from_json_str(&data)
    }

    /// 从服务定义列表构建注册表
    pub fn from_definitions(definitions: Vec<ServiceDefinition>) -> RsfResult<ServiceRegistry> {
        let profiles = definitions
            .into_iter()
            .map(Self::build_profile)
            .collect::<RsfResult<Vec<_>>>()?;

        let registry = ServiceRegistry::new(profiles)?;
        debug!("Service registry built, {} services", registry.len());
        Ok(registry)
    }

    /// 将单条服务定义转换为已校验的服务画像
    pub fn build_profile(definition: ServiceDefinition) -> RsfResult<ServiceProfile> {
        let name = definition.name.trim().to_string();
        if name.is_empty() {
            return Err(RsfootprintError::RegistryLoadError("服务名称不能为空".to_string()));
        }

        let strategy = Self::build_strategy(&name, &definition)?;
        let mut profile = ServiceProfile::new(
            name,
            &definition.url,
            strategy,
            definition.risk,
            definition.advice,
        )?;
        if let Some(display_url) = &definition.display_url {
            profile = profile.with_display_url(display_url)?;
        }
        Ok(profile)
    }

    /// 解析策略标签及其参数
    fn build_strategy(name: &str, definition: &ServiceDefinition) -> RsfResult<DetectionStrategy> {
        let tag = definition.strategy.trim().to_lowercase();
        let strategy = match tag.as_str() {
            "status" => DetectionStrategy::Status,
            "json" => match &definition.presence_keys {
                Some(keys) => {
                    let keys: Vec<String> = keys
                        .iter()
                        .map(|k| k.trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect();
                    if keys.is_empty() {
                        return Err(RsfootprintError::RegistryLoadError(format!(
                            "服务 [{}] 的 presence_keys 不能为空",
                            name
                        )));
                    }
                    DetectionStrategy::Json { presence_keys: keys }
                }
                None => DetectionStrategy::json(),
            },
            "redirect_check" => match &definition.negative_markers {
                Some(markers) => {
                    let markers: Vec<String> = markers
                        .iter()
                        .map(|m| m.trim().to_lowercase())
                        .filter(|m| !m.is_empty())
                        .collect();
                    if markers.is_empty() {
                        return Err(RsfootprintError::RegistryLoadError(format!(
                            "服务 [{}] 的 negative_markers 不能为空",
                            name
                        )));
                    }
                    DetectionStrategy::RedirectCheck { negative_markers: markers }
                }
                None => DetectionStrategy::redirect_check(),
            },
            "text_search" => {
                let marker = definition
                    .error_text
                    .as_deref()
                    .unwrap_or(DEFAULT_ABSENCE_MARKER)
                    .trim();
                if marker.is_empty() {
                    return Err(RsfootprintError::RegistryLoadError(format!(
                        "服务 [{}] 的 error_text 不能为空",
                        name
                    )));
                }
                DetectionStrategy::text_search(marker)
            }
            _ => {
                return Err(RsfootprintError::UnknownStrategy {
                    service: name.to_string(),
                    strategy: definition.strategy.clone(),
                });
            }
        };

        Self::warn_unused_params(name, &strategy, definition);
        Ok(strategy)
    }

    // 参数与策略不匹配时仅告警
    fn warn_unused_params(name: &str, strategy: &DetectionStrategy, definition: &ServiceDefinition) {
        let unused = [
            ("error_text", definition.error_text.is_some(), "text_search"),
            ("presence_keys", definition.presence_keys.is_some(), "json"),
            ("negative_markers", definition.negative_markers.is_some(), "redirect_check"),
        ];
        for (field, present, owner) in unused {
            if present && strategy.tag() != owner {
                warn!(
                    "Service [{}] sets `{}` but uses strategy `{}`, field ignored",
                    name,
                    field,
                    strategy.tag()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::model::RiskLevel;

    #[test]
    fn test_builtin_registry_loads_in_order() {
        let registry = ServiceLoader::builtin().unwrap();
        assert_eq!(
            registry.names(),
            vec!["GitHub", "Reddit", "Facebook", "Instagram", "Twitter (X)", "Pinterest"]
        );

        let pinterest = registry.lookup("Pinterest").unwrap();
        assert_eq!(pinterest.risk, RiskLevel::Low);
        assert_eq!(pinterest.strategy, DetectionStrategy::text_search("user not found"));

        let twitter = registry.lookup("Twitter (X)").unwrap();
        assert_eq!(twitter.target_url("alice"), "https://nitter.net/alice");
        assert_eq!(twitter.display_url("alice"), "https://x.com/alice");
    }

    #[test]
    fn test_text_search_defaults_marker() {
        let registry = ServiceLoader::from_json_str(
            r#"[{"name": "Site", "url": "https://example.test/{}", "type": "text_search", "risk": "Low"}]"#,
        )
        .unwrap();
        assert_eq!(
            registry.lookup("Site").unwrap().strategy,
            DetectionStrategy::TextSearch { absence_marker: "not found".to_string() }
        );
    }

    #[test]
    fn test_unknown_strategy_rejected_at_load() {
        let err = ServiceLoader::from_json_str(
            r#"[{"name": "Site", "url": "https://example.test/{}", "type": "heuristic", "risk": "Low"}]"#,
        )
        .unwrap_err();
        match err {
            RsfootprintError::UnknownStrategy { service, strategy } => {
                assert_eq!(service, "Site");
                assert_eq!(strategy, "heuristic");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_without_slot_rejected_at_load() {
        let err = ServiceLoader::from_json_str(
            r#"[{"name": "Site", "url": "https://example.test/profile", "type": "status", "risk": "Low"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, RsfootprintError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_bad_display_template_rejected_at_load() {
        let err = ServiceLoader::from_json_str(
            r#"[{"name": "Site", "url": "https://example.test/{}", "display_url": "https://example.test/{}/{}", "type": "status", "risk": "Low"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, RsfootprintError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let err = ServiceLoader::from_json_str(
            r#"[
                {"name": "Site", "url": "https://a.test/{}", "type": "status", "risk": "Low"},
                {"name": "Site", "url": "https://b.test/{}", "type": "status", "risk": "High"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, RsfootprintError::DuplicateService(name) if name == "Site"));
    }

    #[test]
    fn test_empty_marker_lists_rejected() {
        let err = ServiceLoader::from_json_str(
            r#"[{"name": "Site", "url": "https://a.test/{}", "type": "redirect_check", "negative_markers": [" "], "risk": "Low"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, RsfootprintError::RegistryLoadError(_)));
    }

    #[test]
    fn test_custom_markers_are_lowercased() {
        let registry = ServiceLoader::from_json_str(
            r#"[{"name": "Site", "url": "https://a.test/{}", "type": "redirect_check", "negative_markers": ["LOGIN", "Gate"], "risk": "High"}]"#,
        )
        .unwrap();
        assert_eq!(
            registry.lookup("Site").unwrap().strategy,
            DetectionStrategy::RedirectCheck {
                negative_markers: vec!["login".to_string(), "gate".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_from_missing_file_is_io_error() {
        let err = ServiceLoader::from_file("/nonexistent/rsfootprint/services.json")
            .await
            .unwrap_err();
        assert!(matches!(err, RsfootprintError::IoError(_)));
    }
}
