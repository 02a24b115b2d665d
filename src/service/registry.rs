//! 服务注册表
//! 构建后不可变，按注册顺序迭代；无写入方，无需加锁

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::model::{ServiceProfile, SharedProfile};
use crate::error::{RsfResult, RsfootprintError};

/// 服务注册表
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    profiles: Vec<SharedProfile>,
    index: HashMap<String, usize>,
}

impl ServiceRegistry {
    /// 创建注册表（拒绝重名服务）
    pub fn new(profiles: Vec<ServiceProfile>) -> RsfResult<Self> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (pos, profile) in profiles.iter().enumerate() {
            if index.insert(profile.name.clone(), pos).is_some() {
                return Err(RsfootprintError::DuplicateService(profile.name.clone()));
            }
        }

        Ok(Self {
            profiles: profiles.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// 按名称查找
    pub fn lookup(&self, name: &str) -> RsfResult<&SharedProfile> {
        self.index
            .get(name)
            .map(|&pos| &self.profiles[pos])
            .ok_or_else(|| RsfootprintError::UnknownService(name.to_string()))
    }

    /// 按注册顺序返回全部画像
    pub fn all(&self) -> &[SharedProfile] {
        &self.profiles
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// 按请求顺序解析服务列表：重复项保留首次出现，遇到未知服务立即失败
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> RsfResult<Vec<SharedProfile>> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let profile = self.lookup(name)?;
            if seen.insert(name) {
                resolved.push(Arc::clone(profile));
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::model::{DetectionStrategy, RiskLevel};

    fn profile(name: &str) -> ServiceProfile {
        ServiceProfile::new(
            name,
            "https://example.test/{}",
            DetectionStrategy::Status,
            RiskLevel::Low,
            "advice",
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_unknown_service() {
        let registry = ServiceRegistry::new(vec![profile("A")]).unwrap();
        assert!(registry.contains("A"));
        assert!(!registry.contains("B"));
        assert!(!registry.contains("a"));
        assert!(registry.lookup("A").is_ok());
        assert!(matches!(
            registry.lookup("B"),
            Err(RsfootprintError::UnknownService(name)) if name == "B"
        ));
    }

    #[test]
    fn test_all_is_registration_order_and_stable() {
        let registry = ServiceRegistry::new(vec![profile("C"), profile("A"), profile("B")]).unwrap();
        let first: Vec<_> = registry.all().iter().map(|p| p.name.clone()).collect();
        let second: Vec<_> = registry.all().iter().map(|p| p.name.clone()).collect();
        assert_eq!(first, vec!["C", "A", "B"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_keeps_request_order_and_dedupes() {
        let registry = ServiceRegistry::new(vec![profile("A"), profile("B"), profile("C")]).unwrap();
        let resolved = registry.resolve(&["C", "A", "C", "B"]).unwrap();
        let names: Vec<_> = resolved.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_resolve_fails_on_unknown() {
        let registry = ServiceRegistry::new(vec![profile("A")]).unwrap();
        assert!(matches!(
            registry.resolve(&["A", "Myspace"]),
            Err(RsfootprintError::UnknownService(name)) if name == "Myspace"
        ));
    }
}
