//! 组件注册机
//!
//! 构建器的可变半边：注册被先累积为种子，`build()` 时一次性物化为
//! 解析器。每次注册返回一个类型化的配置句柄，供链式补充配置。

use crate::factory::{Caster, Configure, FactoryOverride, InstancePipeline};
use crate::resolvers::{DependencySource, LocalRegistry, SingletonResolver, TransientResolver};
use di_abstractions::{AmbientContext, Construct, ObjectResolver};
use parking_lot::Mutex;
use runtime_common::{ConfigurationError, DiResult, Lifetime, TypeKey};
use std::sync::Arc;
use tracing::info;

/// 种子上的可变配置状态，注册句柄与种子共享
struct SeedState<C: Construct> {
    configure: Configure<C>,
    factory_override: Option<FactoryOverride<C>>,
    eager: bool,
}

/// 注册配置句柄
///
/// 由 `add_singleton` / `add_transient` 系列返回，链式补充配置：
///
/// ```ignore
/// builder
///     .add_singleton::<AudioMixer>()
///     .with_configuration(|mixer| mixer.muted(false))
///     .eager();
/// ```
pub struct Configurable<C: Construct> {
    state: Arc<Mutex<SeedState<C>>>,
}

impl<C: Construct> Configurable<C> {
    /// 设置配置变换
    ///
    /// 在每个新实例（含工厂覆盖产出的实例）上执行，默认恒等
    pub fn with_configuration(self, configure: impl Fn(C) -> C + Send + Sync + 'static) -> Self {
        self.state.lock().configure = Arc::new(configure);
        self
    }

    /// 设置工厂覆盖
    ///
    /// 完全取代常规构造与依赖收集；配置变换仍作用于其产出
    pub fn with_factory(self, factory: impl Fn() -> C + Send + Sync + 'static) -> Self {
        self.state.lock().factory_override = Some(Arc::new(factory));
        self
    }

    /// 标记为预解析
    ///
    /// `build()` 在冻结注册表后立即驱动该单例构造
    pub fn eager(self) -> Self {
        self.state.lock().eager = true;
        self
    }
}

/// 解析器种子，物化前的注册记录
pub(crate) trait ResolverSeed: Send + Sync {
    /// 注册键（抽象键，未指定抽象时为具体类型键）
    fn key(&self) -> TypeKey;

    /// 生命周期
    fn lifetime(&self) -> Lifetime;

    /// 是否预解析
    fn eager(&self) -> bool;

    /// 以给定依赖来源物化为解析器
    fn build_resolver(&self, source: DependencySource) -> Arc<dyn ObjectResolver>;
}

struct Seed<A: ?Sized + Send + Sync + 'static, C: Construct> {
    key: TypeKey,
    lifetime: Lifetime,
    caster: Caster<A, C>,
    state: Arc<Mutex<SeedState<C>>>,
}

impl<A: ?Sized + Send + Sync + 'static, C: Construct> ResolverSeed for Seed<A, C> {
    fn key(&self) -> TypeKey {
        self.key
    }

    fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    fn eager(&self) -> bool {
        self.state.lock().eager
    }

    fn build_resolver(&self, source: DependencySource) -> Arc<dyn ObjectResolver> {
        let state = self.state.lock();
        let pipeline = InstancePipeline::new(
            self.caster.clone(),
            state.configure.clone(),
            state.factory_override.clone(),
        );
        match self.lifetime {
            Lifetime::Singleton => Arc::new(SingletonResolver::new(source, pipeline)),
            Lifetime::Transient => Arc::new(TransientResolver::new(source, pipeline)),
        }
    }
}

/// 创建一对种子与配置句柄
pub(crate) fn new_seed<A, C>(
    lifetime: Lifetime,
    caster: Caster<A, C>,
) -> (Box<dyn ResolverSeed>, Configurable<C>)
where
    A: ?Sized + Send + Sync + 'static,
    C: Construct,
{
    let state = Arc::new(Mutex::new(SeedState {
        configure: Arc::new(|instance| instance),
        factory_override: None,
        eager: false,
    }));
    let seed = Seed::<A, C> {
        key: TypeKey::of::<A>(),
        lifetime,
        caster,
        state: state.clone(),
    };
    (Box::new(seed), Configurable { state })
}

/// 注册集合
///
/// 类型键注册的累积容器，供容器构建器、作用域构建器与
/// 环境注册集合复用。
#[derive(Default)]
pub struct RegistrationSet {
    seeds: Vec<Box<dyn ResolverSeed>>,
}

impl RegistrationSet {
    /// 创建空注册集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册具体类型单例
    pub fn add_singleton<C: Construct>(&mut self) -> Configurable<C> {
        self.add::<C, C>(Lifetime::Singleton, Arc::new(|instance| instance))
    }

    /// 以抽象键注册单例
    ///
    /// `cast` 把具体句柄收窄为抽象句柄，调用处写
    /// `|svc| svc as Arc<dyn Renderer>`
    pub fn add_singleton_as<A, C>(
        &mut self,
        cast: impl Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    ) -> Configurable<C>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Construct,
    {
        self.add::<A, C>(Lifetime::Singleton, Arc::new(cast))
    }

    /// 注册具体类型瞬时组件
    pub fn add_transient<C: Construct>(&mut self) -> Configurable<C> {
        self.add::<C, C>(Lifetime::Transient, Arc::new(|instance| instance))
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
        self.add::<A, C>(Lifetime::Transient, Arc::new(cast))
    }

    fn add<A, C>(&mut self, lifetime: Lifetime, caster: Caster<A, C>) -> Configurable<C>
    where
        A: ?Sized + Send + Sync + 'static,
        C: Construct,
    {
        let (seed, handle) = new_seed::<A, C>(lifetime, caster);
        self.seeds.push(seed);
        handle
    }

    /// 已累积的注册数量
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// 集合是否为空
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// 物化进容器本地注册表
    ///
    /// 同键重复注册立即报错，绝不静默覆盖；返回需要预解析的键
    pub(crate) fn materialize_local(
        self,
        registry: &LocalRegistry,
        ambient: &AmbientContext,
    ) -> DiResult<Vec<TypeKey>> {
        let mut eager_keys = Vec::new();
        let mut map = registry.write();

        for seed in &self.seeds {
            let key = seed.key();
            if map.contains_key(&key) {
                return Err(ConfigurationError::DuplicateRegistration {
                    key: key.name.to_string(),
                    registry: "容器注册表",
                }
                .into());
            }

            let resolver = seed.build_resolver(DependencySource::local(
                registry.clone(),
                ambient.clone(),
            ));
            info!("注册容器服务: {} ({:?})", key, seed.lifetime());
            if seed.eager() {
                eager_keys.push(key);
            }
            map.insert(key, resolver);
        }

        Ok(eager_keys)
    }

    /// 物化进环境注册表
    ///
    /// 返回 (已登记键, 预解析键)；已登记键供应用生命周期收尾时移除
    pub fn materialize_ambient(
        self,
        ambient: &AmbientContext,
        hidden: bool,
    ) -> DiResult<(Vec<TypeKey>, Vec<TypeKey>)> {
        let mut registered = Vec::with_capacity(self.seeds.len());
        let mut eager_keys = Vec::new();

        for seed in &self.seeds {
            let key = seed.key();
            let resolver = seed.build_resolver(DependencySource::ambient(ambient.clone()));
            ambient.register(key, resolver, hidden)?;
            registered.push(key);
            if seed.eager() {
                eager_keys.push(key);
            }
        }

        Ok((registered, eager_keys))
    }
}

impl std::fmt::Debug for RegistrationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationSet")
            .field("seeds", &self.seeds.len())
            .finish()
    }
}
