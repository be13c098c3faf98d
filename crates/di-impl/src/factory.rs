//! 对象工厂
//!
//! 把类型化的构造函数编译成实例产出管线。管线在注册时建成一次
//! （单态化直接调用，无运行时反射），解析时只执行，不再组装。

use crate::resolvers::DependencySource;
use di_abstractions::{Construct, DependencyList, ErasedInstance};
use runtime_common::{DiResult, TypeKey};
use std::sync::Arc;

/// 抽象句柄转换函数
///
/// 注册时捕获 `Arc<C>` 到 `Arc<A>` 的收窄（具体类型时为恒等）
pub(crate) type Caster<A, C> = Arc<dyn Fn(Arc<C>) -> Arc<A> + Send + Sync>;

/// 配置变换函数，默认恒等
pub(crate) type Configure<C> = Arc<dyn Fn(C) -> C + Send + Sync>;

/// 工厂覆盖函数，存在时完全取代常规构造
pub(crate) type FactoryOverride<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// 实例产出管线
///
/// 固定流程：依赖收集 → 构造（或工厂覆盖，覆盖时跳过依赖收集）
/// → 配置变换 → 句柄封装。
pub(crate) struct InstancePipeline<A: ?Sized + Send + Sync + 'static, C: Construct> {
    factory: fn(&mut DependencyList) -> DiResult<C>,
    factory_override: Option<FactoryOverride<C>>,
    configure: Configure<C>,
    caster: Caster<A, C>,
}

impl<A: ?Sized + Send + Sync + 'static, C: Construct> InstancePipeline<A, C> {
    /// 以注册参数组装管线
    pub(crate) fn new(
        caster: Caster<A, C>,
        configure: Configure<C>,
        factory_override: Option<FactoryOverride<C>>,
    ) -> Self {
        Self {
            factory: C::construct,
            factory_override,
            configure,
            caster,
        }
    }

    /// 产出一个实例
    ///
    /// 返回具体句柄（供释放逻辑使用）和封装句柄（供消费方使用）
    pub(crate) fn produce(
        &self,
        source: &DependencySource,
        requirements: &[TypeKey],
    ) -> DiResult<(Arc<C>, ErasedInstance)> {
        let constructed = match &self.factory_override {
            Some(factory) => factory(),
            None => {
                let mut deps = source.gather(TypeKey::of::<C>(), requirements)?;
                let instance = (self.factory)(&mut deps)?;
                deps.finish()?;
                instance
            }
        };

        let configured = (self.configure)(constructed);
        let typed = Arc::new(configured);
        let erased = ErasedInstance::seal::<A>((self.caster)(typed.clone()));
        Ok((typed, erased))
    }
}

impl<C: Construct> InstancePipeline<C, C> {
    /// 恒等管线：具体类型注册、无配置、无工厂覆盖
    pub(crate) fn identity() -> Self {
        Self::new(Arc::new(|instance| instance), Arc::new(|instance| instance), None)
    }
}
