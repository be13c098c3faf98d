//! 进程级应用上下文

use crate::application::AppBuilder;
use crate::injection::InjectorRegistry;
use di_abstractions::AmbientContext;
use di_impl::{ContainerBuilder, KeyedBuilder, ScopeBuilder};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::info;

/// 应用上下文
///
/// 进程内唯一的共享状态集合：环境注册表、作用域注册表和
/// 注入器登记处。内部全部是 `Arc` 句柄，克隆廉价；由引导代码
/// 构造后按引用传递，而不是藏在真正的全局变量里。
///
/// 上下文构造之前没有任何可用操作；[`reset`] 之后同样如此，
/// 需要重新注册后才能继续使用。
///
/// [`reset`]: AppContext::reset
#[derive(Clone, Default, Debug)]
pub struct AppContext {
    ambient: AmbientContext,
    scopes: di_impl::ScopeRegistry,
    injectors: InjectorRegistry,
}

impl AppContext {
    /// 创建新的应用上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 环境注册表
    pub fn ambient(&self) -> &AmbientContext {
        &self.ambient
    }

    /// 作用域注册表
    pub fn scopes(&self) -> &di_impl::ScopeRegistry {
        &self.scopes
    }

    /// 注入器登记处
    pub fn injectors(&self) -> &InjectorRegistry {
        &self.injectors
    }

    /// 创建容器构建器
    pub fn container_builder(&self) -> ContainerBuilder {
        ContainerBuilder::new(&self.ambient)
    }

    /// 创建 ID 键容器构建器
    pub fn keyed_builder<K>(&self) -> KeyedBuilder<K>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    {
        KeyedBuilder::new(&self.ambient)
    }

    /// 创建作用域构建器
    pub fn scope_builder(&self, name: impl Into<String>) -> ScopeBuilder {
        ScopeBuilder::new(name, &self.ambient, &self.scopes)
    }

    /// 创建应用构建器
    pub fn app_builder(&self) -> AppBuilder {
        AppBuilder::new(self)
    }

    /// 重置上下文
    ///
    /// 清空三个注册表，用于测试隔离；已发出的容器与生命周期句柄
    /// 不受影响，但后续查找都会落空
    pub fn reset(&self) {
        info!("重置应用上下文");
        self.ambient.clear();
        self.scopes.clear();
        self.injectors.clear();
    }
}
