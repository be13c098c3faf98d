//! 容器构建器

use crate::container::Container;
use crate::registration::{Configurable, RegistrationSet};
use crate::resolvers::LocalRegistry;
use di_abstractions::{AmbientContext, Construct};
use parking_lot::RwLock;
use runtime_common::DiResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 容器构建器
///
/// 累积类型键注册，`build()` 把注册冻结为不可变的 [`Container`]。
/// 构建消费 `self`，构建器不可复用；注册阶段由调用方串行化。
///
/// 容器内的解析器先查容器本地注册表，未命中的依赖回落到
/// 环境注册表；容器内的对象本身不会进入环境注册表。
pub struct ContainerBuilder {
    ambient: AmbientContext,
    registry: LocalRegistry,
    set: RegistrationSet,
}

impl ContainerBuilder {
    /// 创建新的容器构建器
    pub fn new(ambient: &AmbientContext) -> Self {
        Self {
            ambient: ambient.clone(),
            registry: Arc::new(RwLock::new(HashMap::new())),
            set: RegistrationSet::new(),
        }
    }

    /// 注册具体类型单例
    pub fn add_singleton<C: Construct>(&mut self) -> Configurable<C> {
        self.set.add_singleton::<C>()
    }

    /// 以抽象键注册单例
    pub fn add_singleton_as<A, C>(
        &mut self,
        cast: impl Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    ) -> Configurable<C>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Construct,
    {
        self.set.add_singleton_as::<A, C>(cast)
    }

    /// 注册具体类型瞬时组件
    pub fn add_transient<C: Construct>(&mut self) -> Configurable<C> {
        self.set.add_transient::<C>()
    }

    /// 以抽象键注册瞬时组件
    pub fn add_transient_as<A, C>(
        &mut self,
        cast: impl Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    ) -> Configurable<C>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Construct,
    {
        self.set.add_transient_as::<A, C>(cast)
    }

    /// 构建容器
    ///
    /// 物化全部注册并驱动预解析单例的构造；任何一步失败都会
    /// 使整次构建失败并向调用方传播
    pub fn build(self) -> DiResult<Container> {
        let eager_keys = self.set.materialize_local(&self.registry, &self.ambient)?;

        for key in eager_keys {
            let resolver = self.registry.read().get(&key).cloned();
            if let Some(resolver) = resolver {
                debug!("预解析单例: {}", key);
                resolver.resolve()?;
            }
        }

        info!("构建容器完成，注册了 {} 个服务", self.registry.read().len());
        Ok(Container::new(self.registry, self.ambient))
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("pending", &self.set.len())
            .finish()
    }
}
