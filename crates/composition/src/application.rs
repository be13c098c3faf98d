//! 应用级注册与生命周期
//!
//! 应用构建器把"全局可用"的服务登记进环境注册表，并返回一个
//! 生命周期句柄；句柄负责整个进程收尾：释放已解析的环境单例、
//! 解除登记、执行附加清理、清空作用域注册表。

use crate::context::AppContext;
use di_abstractions::{AmbientContext, Construct};
use di_impl::{Configurable, RegistrationSet, ScopeRegistry};
use runtime_common::{DiResult, Disposable, DisposableCollection, TypeKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 环境注册集合
///
/// 与容器构建器同一套注册面，目标是环境注册表
#[derive(Default)]
pub struct AmbientCollection {
    set: RegistrationSet,
}

impl AmbientCollection {
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

    /// 已累积的注册数量
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// 集合是否为空
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// 应用构建器
///
/// 维护两个注册集合：`resolvers` 中的服务可通过公共接口获取；
/// `hidden` 中的服务只能作为依赖被注入，公共获取一律被拒绝。
/// 隐藏设计让内部服务层可以铺得很宽而不泄漏访问面。
pub struct AppBuilder {
    ambient: AmbientContext,
    scopes: ScopeRegistry,
    resolvers: AmbientCollection,
    hidden: AmbientCollection,
    cleanup: Option<DisposableCollection>,
}

impl AppBuilder {
    /// 创建新的应用构建器
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            ambient: ctx.ambient().clone(),
            scopes: ctx.scopes().clone(),
            resolvers: AmbientCollection::default(),
            hidden: AmbientCollection::default(),
            cleanup: None,
        }
    }

    /// 公开服务注册集合
    pub fn resolvers(&mut self) -> &mut AmbientCollection {
        &mut self.resolvers
    }

    /// 隐藏服务注册集合
    ///
    /// 这里注册的对象不可静态获取，但可以被依赖注入使用
    pub fn hidden(&mut self) -> &mut AmbientCollection {
        &mut self.hidden
    }

    /// 设置附加清理集合，随生命周期收尾执行
    pub fn with_cleanup(&mut self, cleanup: DisposableCollection) -> &mut Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// 构建应用
    ///
    /// 先登记隐藏集合再登记公开集合；任何重复键都会使整次构建
    /// 失败。启动边界的调用方应把构建错误视为致命错误。
    pub fn build(self) -> DiResult<AppLifetime> {
        info!(
            "构建应用: {} 个公开服务, {} 个隐藏服务",
            self.resolvers.len(),
            self.hidden.len()
        );

        let (hidden_keys, hidden_eager) =
            self.hidden.set.materialize_ambient(&self.ambient, true)?;
        let (visible_keys, visible_eager) =
            self.resolvers.set.materialize_ambient(&self.ambient, false)?;

        for key in hidden_eager.into_iter().chain(visible_eager) {
            if let Some(resolver) = self.ambient.lookup(key) {
                debug!("预解析环境单例: {}", key);
                resolver.resolve()?;
            }
        }

        let mut registered = hidden_keys;
        registered.extend(visible_keys);

        info!("应用构建完成");
        Ok(AppLifetime {
            ambient: self.ambient,
            scopes: self.scopes,
            registered,
            cleanup: self.cleanup,
            disposed: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("resolvers", &self.resolvers.len())
            .field("hidden", &self.hidden.len())
            .finish()
    }
}

/// 应用生命周期句柄
///
/// 持有到进程结束；[`dispose`] 幂等，句柄被丢弃时也会自动收尾。
///
/// [`dispose`]: AppLifetime::dispose
pub struct AppLifetime {
    ambient: AmbientContext,
    scopes: ScopeRegistry,
    registered: Vec<TypeKey>,
    cleanup: Option<DisposableCollection>,
    disposed: AtomicBool,
}

impl AppLifetime {
    /// 收尾整个应用
    ///
    /// 释放每个已解析的环境单例并解除其登记，执行附加清理，
    /// 最后清空作用域注册表
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("应用收尾开始");

        for key in &self.registered {
            if let Some(resolver) = self.ambient.remove(*key) {
                if resolver.is_resolved() {
                    resolver.dispose();
                }
            }
        }

        if let Some(cleanup) = &self.cleanup {
            cleanup.dispose();
        }

        self.scopes.clear();
        info!("应用收尾完成");
    }

    /// 登记的环境服务数量
    pub fn registered_len(&self) -> usize {
        self.registered.len()
    }
}

impl Drop for AppLifetime {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for AppLifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppLifetime")
            .field("registered", &self.registered.len())
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish()
    }
}
