//! 进程级环境注册表
//!
//! "全局可用"的服务通过这里进入任意嵌套的容器：任何解析器在本地
//! 注册表找不到依赖时，都会回落到环境注册表查找。
//!
//! 原生全局状态被改造成显式的上下文对象：内部是 `Arc` 句柄，
//! 克隆廉价，由引导代码按引用传递；配合 [`clear`] 实现测试隔离。
//! 上下文构造之前没有任何可用操作，[`clear`] 之后所有查找都会落空。
//!
//! [`clear`]: AmbientContext::clear

use crate::container::ServiceLookup;
use crate::resolver::ObjectResolver;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use runtime_common::{ConfigurationError, DiResult, ResolveError, TypeKey};
use std::sync::Arc;
use tracing::{debug, info};

struct AmbientEntry {
    resolver: Arc<dyn ObjectResolver>,
    hidden: bool,
}

/// 环境注册表
///
/// 注册与移除可能和查找并发发生，底层映射保证每个操作原子完成。
#[derive(Clone, Default)]
pub struct AmbientContext {
    entries: Arc<DashMap<TypeKey, AmbientEntry>>,
}

impl AmbientContext {
    /// 创建空的环境注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个解析器
    ///
    /// 键已存在时报重复注册错误，绝不静默覆盖。
    /// `hidden` 标记该键只允许作为依赖被内部解析，公共接口拒绝访问。
    pub fn register(
        &self,
        key: TypeKey,
        resolver: Arc<dyn ObjectResolver>,
        hidden: bool,
    ) -> DiResult<()> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(ConfigurationError::DuplicateRegistration {
                key: key.name.to_string(),
                registry: "环境注册表",
            }
            .into()),
            Entry::Vacant(vacant) => {
                info!("注册环境服务: {} (hidden: {})", key, hidden);
                vacant.insert(AmbientEntry { resolver, hidden });
                Ok(())
            }
        }
    }

    /// 以类型参数注册解析器
    pub fn register_of<T: ?Sized + 'static>(
        &self,
        resolver: Arc<dyn ObjectResolver>,
        hidden: bool,
    ) -> DiResult<()> {
        self.register(TypeKey::of::<T>(), resolver, hidden)
    }

    /// 移除一个注册项，返回其解析器
    pub fn remove(&self, key: TypeKey) -> Option<Arc<dyn ObjectResolver>> {
        self.entries.remove(&key).map(|(_, entry)| {
            debug!("移除环境服务: {}", key);
            entry.resolver
        })
    }

    /// 以类型参数移除注册项
    pub fn remove_of<T: ?Sized + 'static>(&self) -> Option<Arc<dyn ObjectResolver>> {
        self.remove(TypeKey::of::<T>())
    }

    /// 清空全部注册项
    ///
    /// 仅用于进程收尾或测试隔离
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// 内部依赖查找路径，忽略隐藏标记
    pub fn lookup(&self, key: TypeKey) -> Option<Arc<dyn ObjectResolver>> {
        self.entries.get(&key).map(|entry| entry.resolver.clone())
    }

    /// 键是否被标记为隐藏
    pub fn is_hidden(&self, key: TypeKey) -> bool {
        self.entries
            .get(&key)
            .map(|entry| entry.hidden)
            .unwrap_or(false)
    }

    /// 键是否已注册
    pub fn contains_key(&self, key: TypeKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// 注册项数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ServiceLookup for AmbientContext {
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        let key = TypeKey::of::<T>();
        if self.is_hidden(key) {
            return Err(ResolveError::AccessDenied { type_name: key.name }.into());
        }
        match self.lookup(key) {
            None => Ok(None),
            Some(resolver) => resolver.resolve()?.open::<T>().map(Some),
        }
    }

    fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.contains_key(TypeKey::of::<T>())
    }
}

impl std::fmt::Debug for AmbientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientContext")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ErasedInstance;
    use runtime_common::DiResult;

    #[derive(Debug)]
    struct Fixed;

    struct FixedResolver;

    impl ObjectResolver for FixedResolver {
        fn is_resolved(&self) -> bool {
            true
        }

        fn resolve(&self) -> DiResult<ErasedInstance> {
            Ok(ErasedInstance::seal::<Fixed>(Arc::new(Fixed)))
        }

        fn target(&self) -> TypeKey {
            TypeKey::of::<Fixed>()
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let ambient = AmbientContext::new();
        let key = TypeKey::of::<Fixed>();

        ambient.register(key, Arc::new(FixedResolver), false).unwrap();
        assert!(ambient.register(key, Arc::new(FixedResolver), false).is_err());

        ambient.remove(key);
        assert!(ambient.register(key, Arc::new(FixedResolver), false).is_ok());
    }

    #[test]
    fn racing_registrations_admit_exactly_one() {
        let ambient = AmbientContext::new();
        let key = TypeKey::of::<Fixed>();

        let successes: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let ambient = ambient.clone();
                    scope.spawn(move || {
                        usize::from(ambient.register(key, Arc::new(FixedResolver), false).is_ok())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(successes, 1);
        assert!(ambient.contains_key(key));
    }

    #[test]
    fn hidden_entries_deny_public_lookup_but_allow_internal() {
        let ambient = AmbientContext::new();
        let key = TypeKey::of::<Fixed>();
        ambient.register(key, Arc::new(FixedResolver), true).unwrap();

        assert!(ambient.get::<Fixed>().unwrap_err().is_access_denied());
        assert!(ambient.lookup(key).is_some());
        assert!(ambient.is_hidden(key));
    }
}
