//! 组件构造抽象接口
//!
//! 编译期注册替代运行时反射：核心只接受工厂，从不检视目标类型。
//! 源码生成工具（或手写代码）为每个组件实现 [`Construct`]。

use crate::resolver::ErasedInstance;
use runtime_common::{ConfigurationError, DiResult, Disposable, ResolveError, TypeKey};
use std::sync::Arc;
use tracing::warn;

/// 组件构造 trait
///
/// `dependencies` 返回的需求列表在注册时被固定，之后不再变化；
/// `construct` 按同样的顺序从 [`DependencyList`] 中逐个取出依赖。
pub trait Construct: Disposable + Send + Sync + Sized + 'static {
    /// 构造所需依赖的类型键，按构造参数顺序排列
    fn dependencies() -> Vec<TypeKey> {
        Vec::new()
    }

    /// 使用已收集的依赖构造组件实例
    fn construct(deps: &mut DependencyList) -> DiResult<Self>;
}

/// 已解析的依赖序列
///
/// 槽位顺序与需求列表一一对应，[`take`] 严格按位置消费，
/// 不做事后的类型重匹配；同一运行时类型出现多次也不会混淆。
///
/// [`take`]: DependencyList::take
pub struct DependencyList {
    requester: TypeKey,
    slots: Vec<(TypeKey, ErasedInstance)>,
    cursor: usize,
}

impl DependencyList {
    /// 创建依赖序列
    ///
    /// `requester` 为发起构造的具体类型，用于错误信息
    pub fn new(requester: TypeKey, slots: Vec<(TypeKey, ErasedInstance)>) -> Self {
        Self {
            requester,
            slots,
            cursor: 0,
        }
    }

    /// 按位置取出下一个依赖
    ///
    /// 请求类型必须与该槽位声明的类型键一致
    pub fn take<D: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<D>> {
        let Some((declared, instance)) = self.slots.get(self.cursor) else {
            return Err(ConfigurationError::ConstructionFailed {
                type_name: self.requester.name,
                message: format!("构造函数索取了超出需求列表的第 {} 个依赖", self.cursor + 1),
            }
            .into());
        };
        self.cursor += 1;

        let requested = TypeKey::of::<D>();
        if declared.id != requested.id {
            warn!(
                "依赖类型不匹配: {} 声明 {}, 实际索取 {}",
                self.requester, declared, requested
            );
            return Err(ResolveError::TypeMismatch {
                declared: declared.name,
                actual: requested.name,
            }
            .into());
        }

        instance.open::<D>()
    }

    /// 校验所有槽位都已被消费
    pub fn finish(&self) -> DiResult<()> {
        if self.cursor == self.slots.len() {
            return Ok(());
        }
        Err(ConfigurationError::ConstructionFailed {
            type_name: self.requester.name,
            message: format!(
                "构造函数只消费了 {} 个依赖, 需求列表共 {} 个",
                self.cursor,
                self.slots.len()
            ),
        }
        .into())
    }

    /// 槽位总数
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否没有任何依赖
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
