//! 注入器登记处
//!
//! 源码生成工具为每个带注入字段的类型生成一段填充代码，并在进程
//! 启动时登记到这里；运行期用新构造的实例调用注入器，由它从环境
//! 注册表与作用域按需拉取字段值。登记处本身不做任何字段扫描。

use crate::context::AppContext;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use runtime_common::{ConfigurationError, DiResult, ResolveError};
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, info};

/// 可注入类型 trait
///
/// 注入闩锁：同一实例只允许注入一次。生成代码负责实现，
/// 手写实现通常内嵌一个布尔字段。
pub trait Injectable: 'static {
    /// 实例是否已被注入
    fn injected(&self) -> bool;

    /// 标记实例已注入
    fn mark_injected(&mut self);
}

type ErasedInjector = Arc<dyn Fn(&mut dyn Any, &AppContext) -> DiResult<()> + Send + Sync>;

/// 注入器登记处
#[derive(Clone, Default)]
pub struct InjectorRegistry {
    injectors: Arc<DashMap<TypeId, ErasedInjector>>,
}

impl InjectorRegistry {
    /// 创建空登记处
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个类型的注入器
    ///
    /// 每个类型只登记一次，重复登记报配置错误
    pub fn register<T: Injectable>(
        &self,
        injector: impl Fn(&mut T, &AppContext) -> DiResult<()> + Send + Sync + 'static,
    ) -> DiResult<()> {
        match self.injectors.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => Err(ConfigurationError::DuplicateInjector {
                type_name: std::any::type_name::<T>(),
            }
            .into()),
            Entry::Vacant(vacant) => {
                info!("登记注入器: {}", std::any::type_name::<T>());
                vacant.insert(Arc::new(move |instance, ctx| {
                    let typed =
                        instance
                            .downcast_mut::<T>()
                            .ok_or_else(|| ResolveError::TypeMismatch {
                                declared: std::any::type_name::<T>(),
                                actual: "未知实例类型",
                            })?;
                    injector(typed, ctx)
                }));
                Ok(())
            }
        }
    }

    /// 对一个实例执行注入
    ///
    /// 未登记注入器或实例已被注入过都报配置错误
    pub fn inject<T: Injectable>(&self, instance: &mut T, ctx: &AppContext) -> DiResult<()> {
        let type_name = std::any::type_name::<T>();
        if instance.injected() {
            return Err(ConfigurationError::DoubleInjection { type_name }.into());
        }

        let injector = self
            .injectors
            .get(&TypeId::of::<T>())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ConfigurationError::InjectorNotRegistered { type_name })?;

        debug!("注入实例: {}", type_name);
        injector(instance, ctx)?;
        instance.mark_injected();
        Ok(())
    }

    /// 类型是否已登记注入器
    pub fn contains<T: Injectable>(&self) -> bool {
        self.injectors.contains_key(&TypeId::of::<T>())
    }

    /// 清空全部注入器
    pub fn clear(&self) {
        self.injectors.clear();
    }

    /// 已登记的注入器数量
    pub fn len(&self) -> usize {
        self.injectors.len()
    }

    /// 登记处是否为空
    pub fn is_empty(&self) -> bool {
        self.injectors.is_empty()
    }
}

impl std::fmt::Debug for InjectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectorRegistry")
            .field("injectors", &self.injectors.len())
            .finish()
    }
}
