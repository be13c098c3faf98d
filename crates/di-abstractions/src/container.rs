//! 容器查找抽象接口

use runtime_common::{DiResult, ResolveError};
use std::sync::Arc;

/// 容器查找 trait
///
/// 所有容器形态（容器、作用域容器、环境注册表）共享的只读查找面。
///
/// `get` 对未注册的键返回 `Ok(None)`，绝不因单纯缺失而报错；
/// 隐藏键无论是否注册都报访问拒绝。返回的 `Option` 即携带了
/// "是否找到"的布尔结果，需要把缺失当作致命错误的调用方使用
/// [`get_required`]。
///
/// [`get_required`]: ServiceLookup::get_required
pub trait ServiceLookup {
    /// 按类型查找并解析一个服务
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>>;

    /// 按类型查找，缺失视为错误
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get::<T>()?.ok_or_else(|| {
            ResolveError::NotRegistered {
                type_name: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    /// 键是否已注册（不触发解析）
    fn contains<T: ?Sized + 'static>(&self) -> bool;
}
