//! 内置服务注册表单例管理
//! 注册表只读，进程内仅构建一次；HTTP客户端不在此处共享，由调用方显式传入
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::RsfResult;
use crate::service::{ServiceLoader, ServiceRegistry};

/// 全局内置注册表
static BUILTIN_REGISTRY: OnceCell<ServiceRegistry> = OnceCell::new();

/// 获取内置注册表（首次访问时加载并校验）
pub fn builtin_registry() -> RsfResult<&'static ServiceRegistry> {
    BUILTIN_REGISTRY.get_or_try_init(|| {
        let registry = ServiceLoader::builtin()?;
        debug!("Builtin service registry initialized, {} services", registry.len());
        Ok(registry)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_shared() {
        let first = builtin_registry().unwrap();
        let second = builtin_registry().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.len(), 6);
    }
}
