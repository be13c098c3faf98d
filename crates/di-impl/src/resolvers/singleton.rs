//! 单例解析器

use crate::factory::{Caster, InstancePipeline};
use crate::resolvers::DependencySource;
use di_abstractions::{AmbientContext, Construct, ErasedInstance, ObjectResolver};
use once_cell::sync::OnceCell;
use runtime_common::{ConfigurationError, DiResult, Disposable, TypeKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 单例解析器
///
/// 首次解析构造并缓存实例，之后直接返回缓存，不再触发依赖收集、
/// 构造与配置变换。首次构造由一次性初始化单元保护，并发调用
/// 只会观察到一次构造。
pub struct SingletonResolver<A: ?Sized + Send + Sync + 'static, C: Construct> {
    requirements: Vec<TypeKey>,
    pipeline: InstancePipeline<A, C>,
    source: DependencySource,
    cell: OnceCell<(Arc<C>, ErasedInstance)>,
    disposed: AtomicBool,
}

impl<A: ?Sized + Send + Sync + 'static, C: Construct> SingletonResolver<A, C> {
    pub(crate) fn new(source: DependencySource, pipeline: InstancePipeline<A, C>) -> Self {
        Self {
            requirements: C::dependencies(),
            pipeline,
            source,
            cell: OnceCell::new(),
            disposed: AtomicBool::new(false),
        }
    }
}

impl<C: Construct> SingletonResolver<C, C> {
    /// 创建以环境注册表为依赖来源的单例解析器
    ///
    /// 供直接向环境注册表登记解析器的调用方使用
    pub fn ambient(ambient: AmbientContext) -> Self {
        Self::new(
            DependencySource::ambient(ambient),
            InstancePipeline::identity(),
        )
    }

    /// 同上，并带工厂覆盖
    pub fn ambient_with_factory(
        ambient: AmbientContext,
        factory: impl Fn() -> C + Send + Sync + 'static,
    ) -> Self {
        let caster: Caster<C, C> = Arc::new(|instance| instance);
        Self::new(
            DependencySource::ambient(ambient),
            InstancePipeline::new(caster, Arc::new(|instance| instance), Some(Arc::new(factory))),
        )
    }
}

impl<A: ?Sized + Send + Sync + 'static, C: Construct> ObjectResolver for SingletonResolver<A, C> {
    fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    fn resolve(&self) -> DiResult<ErasedInstance> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(ConfigurationError::ResolvedAfterDispose {
                type_name: std::any::type_name::<C>(),
            }
            .into());
        }

        let (_, erased) = self.cell.get_or_try_init(|| {
            debug!("首次解析单例: {}", std::any::type_name::<C>());
            self.pipeline.produce(&self.source, &self.requirements)
        })?;
        Ok(erased.clone())
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some((typed, _)) = self.cell.get() {
            debug!("释放单例实例: {}", std::any::type_name::<C>());
            typed.dispose();
        }
    }

    fn target(&self) -> TypeKey {
        TypeKey::of::<C>()
    }
}
