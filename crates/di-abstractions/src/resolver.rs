//! 对象解析器抽象接口
//!
//! 提供类型擦除的实例句柄与解析器的核心抽象

use runtime_common::{DiResult, ResolveError, TypeKey};
use std::any::Any;
use std::sync::Arc;
use tracing::warn;

/// 类型擦除的实例句柄
///
/// 内部约定：`handle` 的具体负载永远是一个 `Arc<T>`（`T` 可为具体类型
/// 或 trait 对象），`key` 记录封装时使用的 `T`。同一个 `Arc` 重复封装后
/// 打开得到的句柄仍指向同一分配，单例的引用同一性由此保证。
#[derive(Clone)]
pub struct ErasedInstance {
    key: TypeKey,
    handle: Arc<dyn Any + Send + Sync>,
}

impl ErasedInstance {
    /// 封装一个共享句柄
    pub fn seal<T: ?Sized + Send + Sync + 'static>(handle: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            handle: Arc::new(handle),
        }
    }

    /// 按类型打开句柄
    ///
    /// 请求类型与封装类型不一致时报类型不匹配错误，双方类型都会记录
    pub fn open<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        match self.handle.downcast_ref::<Arc<T>>() {
            Some(handle) => Ok(handle.clone()),
            None => {
                let declared = std::any::type_name::<T>();
                warn!("依赖类型不匹配: 期望 {}, 实际 {}", declared, self.key);
                Err(ResolveError::TypeMismatch {
                    declared,
                    actual: self.key.name,
                }
                .into())
            }
        }
    }

    /// 封装时使用的类型键
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl std::fmt::Debug for ErasedInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasedInstance")
            .field("key", &self.key)
            .finish()
    }
}

/// 对象解析器 trait
///
/// 每个解析器负责产出一个目标类型的实例；单例变体同时持有实例缓存。
/// 解析流程固定为：注册表查找 → 依赖收集 → 构造 → 配置 → 缓存。
///
/// 循环依赖行为未定义（解析递归不做检测）。
pub trait ObjectResolver: Send + Sync {
    /// 是否已经解析过
    ///
    /// 释放逻辑用它区分"从未解析"与"已解析"，避免为了检查可释放性
    /// 而强制触发构造
    fn is_resolved(&self) -> bool;

    /// 解析出一个实例
    fn resolve(&self) -> DiResult<ErasedInstance>;

    /// 释放缓存的实例
    ///
    /// 无缓存时为空操作
    fn dispose(&self) {}

    /// 解析目标的具体类型键
    fn target(&self) -> TypeKey;
}
