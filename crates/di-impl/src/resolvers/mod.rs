//! 生命周期解析器变体
//!
//! 单例与瞬时两种变体共享同一套依赖收集逻辑，差别只在缓存策略；
//! ID 键与环境注册走仅环境来源的同一对变体。

pub mod singleton;
pub mod transient;

pub use singleton::SingletonResolver;
pub use transient::TransientResolver;

use di_abstractions::{AmbientContext, DependencyList, ObjectResolver};
use parking_lot::RwLock;
use runtime_common::{DiResult, ResolveError, TypeKey};
use std::collections::HashMap;
use std::sync::Arc;

/// 容器本地注册表
///
/// 构建器、容器与其中的解析器共享同一份映射
pub(crate) type LocalRegistry = Arc<RwLock<HashMap<TypeKey, Arc<dyn ObjectResolver>>>>;

/// 依赖来源
///
/// 容器内解析器先查本地注册表，落空的需求回落到环境注册表；
/// ID 键与环境解析器只查环境注册表。
#[derive(Clone)]
pub struct DependencySource {
    local: Option<LocalRegistry>,
    ambient: AmbientContext,
}

impl DependencySource {
    /// 仅环境注册表来源
    pub fn ambient(ambient: AmbientContext) -> Self {
        Self {
            local: None,
            ambient,
        }
    }

    /// 本地优先、环境回落的容器来源
    pub(crate) fn local(registry: LocalRegistry, ambient: AmbientContext) -> Self {
        Self {
            local: Some(registry),
            ambient,
        }
    }

    /// 收集一条需求对应的解析器
    ///
    /// 依赖查找忽略隐藏标记，隐藏只约束公共接口
    fn lookup(&self, requirement: TypeKey) -> Option<Arc<dyn ObjectResolver>> {
        if let Some(local) = &self.local {
            let found = local.read().get(&requirement).cloned();
            if found.is_some() {
                return found;
            }
        }
        self.ambient.lookup(requirement)
    }

    /// 按需求列表顺序收集依赖
    ///
    /// 先对整个列表做定位，任何一条缺失都会聚合进同一个
    /// 依赖缺失错误（指明请求方与全部缺失类型），不做部分构造；
    /// 定位完成后才逐槽解析，期间不持有任何注册表锁。
    pub fn gather(
        &self,
        requester: TypeKey,
        requirements: &[TypeKey],
    ) -> DiResult<DependencyList> {
        let mut located = Vec::with_capacity(requirements.len());
        let mut missing = Vec::new();

        for requirement in requirements {
            match self.lookup(*requirement) {
                Some(resolver) => located.push((*requirement, resolver)),
                None => missing.push(requirement.name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ResolveError::MissingDependencies {
                requester: requester.name,
                missing,
            }
            .into());
        }

        let mut slots = Vec::with_capacity(located.len());
        for (requirement, resolver) in located {
            slots.push((requirement, resolver.resolve()?));
        }

        Ok(DependencyList::new(requester, slots))
    }
}
