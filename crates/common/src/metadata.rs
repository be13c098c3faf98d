//! 元数据定义
//!
//! 提供抽象与具体类型的查找键信息

use std::any::TypeId;
use std::fmt;

/// 类型键
///
/// 注册表的查找键，可由具体类型或 trait 对象抽象生成。
/// 相等性与哈希基于 [`TypeId`]；`name` 仅用于日志与错误信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称
    pub name: &'static str,
}

impl TypeKey {
    /// 从类型获取类型键
    ///
    /// 支持 trait 对象，例如 `TypeKey::of::<dyn Renderer>()`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
