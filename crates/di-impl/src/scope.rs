//! 命名作用域
//!
//! 作用域是挂在进程级名字下的独立容器，用于成组登记短生命周期
//! 的注册；生成的注入代码按名字在注入时拉取作用域内服务。

use crate::builder::ContainerBuilder;
use crate::container::Container;
use crate::registration::Configurable;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use di_abstractions::{AmbientContext, Construct, ServiceLookup};
use runtime_common::{DiResult, ScopeError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// 作用域注册表
///
/// 进程级的 作用域名 → 存活容器 映射。同名作用域同一时刻至多
/// 存活一个；注册与移除可能和查找并发，每个操作原子完成。
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    scopes: Arc<DashMap<String, Arc<ScopeContainer>>>,
}

impl ScopeRegistry {
    /// 创建空的作用域注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 按名字取存活的作用域容器
    ///
    /// 不存在时报作用域缺失错误
    pub fn get(&self, name: &str) -> DiResult<Arc<ScopeContainer>> {
        self.scopes
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                ScopeError::NotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// 移除一个作用域映射（不触发容器释放）
    pub fn remove_scope(&self, name: &str) {
        self.scopes.remove(name);
    }

    /// 清空全部作用域映射
    ///
    /// 只断开名字关联；容器本身由其持有方释放
    pub fn clear(&self) {
        self.scopes.clear();
    }

    /// 名字是否有存活作用域
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// 存活作用域数量
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    fn register(&self, name: String, container: Arc<ScopeContainer>) -> DiResult<()> {
        match self.scopes.entry(name) {
            Entry::Occupied(occupied) => Err(ScopeError::AlreadyRegistered {
                name: occupied.key().clone(),
            }
            .into()),
            Entry::Vacant(vacant) => {
                vacant.insert(container);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("scopes", &self.scopes.len())
            .finish()
    }
}

/// 作用域构建器
///
/// 带名字的容器构建器；`build()` 在产出容器的同时把它登记进
/// 作用域注册表，名字被占用时整次构建失败。
pub struct ScopeBuilder {
    name: String,
    inner: ContainerBuilder,
    scopes: ScopeRegistry,
}

impl ScopeBuilder {
    /// 创建新的作用域构建器
    pub fn new(
        name: impl Into<String>,
        ambient: &AmbientContext,
        scopes: &ScopeRegistry,
    ) -> Self {
        Self {
            name: name.into(),
            inner: ContainerBuilder::new(ambient),
            scopes: scopes.clone(),
        }
    }

    /// 注册具体类型单例
    pub fn add_singleton<C: Construct>(&mut self) -> Configurable<C> {
        self.inner.add_singleton::<C>()
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
        self.inner.add_singleton_as::<A, C>(cast)
    }

    /// 注册具体类型瞬时组件
    pub fn add_transient<C: Construct>(&mut self) -> Configurable<C> {
        self.inner.add_transient::<C>()
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
        self.inner.add_transient_as::<A, C>(cast)
    }

    /// 构建并登记作用域
    ///
    /// 名字已被存活作用域占用时报错；登记成功后可通过
    /// [`ScopeRegistry::get`] 按名字取回
    pub fn build(self) -> DiResult<Arc<ScopeContainer>> {
        // 提前拦截已占用的名字，避免无谓构建；最终裁决在原子登记处
        if self.scopes.contains(&self.name) {
            return Err(ScopeError::AlreadyRegistered { name: self.name }.into());
        }

        let container = self.inner.build()?;
        let scope = Arc::new(ScopeContainer {
            name: self.name.clone(),
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            inner: container,
            scopes: self.scopes.clone(),
            disposed: AtomicBool::new(false),
        });
        self.scopes.register(self.name.clone(), scope.clone())?;

        info!("注册作用域: {} ({})", self.name, scope.id);
        Ok(scope)
    }
}

/// 作用域容器
///
/// 内部容器加一个注册句柄：释放时先释放内部容器，再移除名字
/// 映射，之后同名作用域可以重新注册。
pub struct ScopeContainer {
    name: String,
    id: uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    inner: Container,
    scopes: ScopeRegistry,
    disposed: AtomicBool,
}

impl ScopeContainer {
    /// 作用域名字
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 作用域实例ID
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// 作用域创建时间
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    /// 销毁作用域
    ///
    /// 幂等：释放内部容器并解除名字注册，重复调用为空操作
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.dispose();
        self.scopes.remove_scope(&self.name);
        info!("作用域已销毁: {}", self.name);
    }
}

impl ServiceLookup for ScopeContainer {
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.inner.get::<T>()
    }

    fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.inner.contains::<T>()
    }
}

impl std::fmt::Debug for ScopeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeContainer")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}
