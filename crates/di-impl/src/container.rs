//! 依赖注入容器

use crate::resolvers::LocalRegistry;
use di_abstractions::{AmbientContext, ServiceLookup};
use runtime_common::{DiResult, ResolveError, TypeKey};
use std::sync::Arc;
use tracing::{debug, info};

/// 依赖注入容器
///
/// 由 [`ContainerBuilder::build`] 产出的不可变注册表视图。
/// 建议缓存并持有到使用结束，结束后调用 [`dispose`] 释放。
///
/// 构建完成后查找可并发进行；`get` 对缺失返回 `Ok(None)`，
/// 隐藏键无论是否注册一律报访问拒绝。
///
/// [`ContainerBuilder::build`]: crate::builder::ContainerBuilder::build
/// [`dispose`]: Container::dispose
pub struct Container {
    registry: LocalRegistry,
    ambient: AmbientContext,
}

impl Container {
    pub(crate) fn new(registry: LocalRegistry, ambient: AmbientContext) -> Self {
        Self { registry, ambient }
    }

    /// 销毁容器
    ///
    /// 对每个已解析的解析器执行释放（可释放单例的清理恰好一次），
    /// 随后清空注册表；对已清空的容器再次调用为空操作。
    /// 销毁后所有查找返回 `Ok(None)`。
    pub fn dispose(&self) {
        let drained: Vec<(TypeKey, Arc<dyn di_abstractions::ObjectResolver>)> = {
            let mut map = self.registry.write();
            map.drain().collect()
        };
        if drained.is_empty() {
            return;
        }

        for (key, resolver) in drained {
            if resolver.is_resolved() {
                debug!("释放服务: {}", key);
                resolver.dispose();
            }
        }
        info!("容器已销毁");
    }

    /// 注册的服务数量
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    /// 容器是否为空（已销毁的容器为空）
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }
}

impl ServiceLookup for Container {
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        let key = TypeKey::of::<T>();
        if self.ambient.is_hidden(key) {
            return Err(ResolveError::AccessDenied { type_name: key.name }.into());
        }

        let resolver = self.registry.read().get(&key).cloned();
        match resolver {
            None => Ok(None),
            Some(resolver) => resolver.resolve()?.open::<T>().map(Some),
        }
    }

    fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.read().contains_key(&TypeKey::of::<T>())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.registry.read().len())
            .finish()
    }
}
