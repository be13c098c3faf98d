//! 瞬时解析器

use crate::factory::InstancePipeline;
use crate::resolvers::DependencySource;
use di_abstractions::{AmbientContext, Construct, ErasedInstance, ObjectResolver};
use runtime_common::{DiResult, TypeKey};
use std::sync::atomic::{AtomicBool, Ordering};

/// 瞬时解析器
///
/// 每次解析都完整执行依赖收集、构造与配置变换，从不缓存。
/// 瞬时实例归取用方所有，容器释放时不追踪它们。
pub struct TransientResolver<A: ?Sized + Send + Sync + 'static, C: Construct> {
    requirements: Vec<TypeKey>,
    pipeline: InstancePipeline<A, C>,
    source: DependencySource,
    resolved_once: AtomicBool,
}

impl<A: ?Sized + Send + Sync + 'static, C: Construct> TransientResolver<A, C> {
    pub(crate) fn new(source: DependencySource, pipeline: InstancePipeline<A, C>) -> Self {
        Self {
            requirements: C::dependencies(),
            pipeline,
            source,
            resolved_once: AtomicBool::new(false),
        }
    }
}

impl<C: Construct> TransientResolver<C, C> {
    /// 创建以环境注册表为依赖来源的瞬时解析器
    pub fn ambient(ambient: AmbientContext) -> Self {
        Self::new(
            DependencySource::ambient(ambient),
            InstancePipeline::identity(),
        )
    }
}

impl<A: ?Sized + Send + Sync + 'static, C: Construct> ObjectResolver for TransientResolver<A, C> {
    fn is_resolved(&self) -> bool {
        self.resolved_once.load(Ordering::Acquire)
    }

    fn resolve(&self) -> DiResult<ErasedInstance> {
        let (_, erased) = self.pipeline.produce(&self.source, &self.requirements)?;
        self.resolved_once.store(true, Ordering::Release);
        Ok(erased)
    }

    fn target(&self) -> TypeKey {
        TypeKey::of::<C>()
    }
}
