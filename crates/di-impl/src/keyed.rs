//! ID 键容器对
//!
//! 按调用方自选的 ID（而非类型）检索对象的容器。各 ID 下的对象
//! 类型之间没有任何相似性约束；这里只允许具体类型注册。
//!
//! ID 键注册的对象不会进入环境注册表，也不可静态访问；
//! 它们自身的依赖只从环境注册表解析。

use crate::registration::{new_seed, Configurable, ResolverSeed};
use crate::resolvers::DependencySource;
use di_abstractions::{AmbientContext, Construct, ObjectResolver};
use parking_lot::RwLock;
use runtime_common::{ConfigurationError, DiResult, Lifetime, ResolveError, TypeKey};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

/// ID 键容器构建器
pub struct KeyedBuilder<K> {
    ambient: AmbientContext,
    seeds: Vec<(K, Box<dyn ResolverSeed>)>,
}

impl<K> KeyedBuilder<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// 创建新的 ID 键构建器
    pub fn new(ambient: &AmbientContext) -> Self {
        Self {
            ambient: ambient.clone(),
            seeds: Vec::new(),
        }
    }

    /// 以 ID 注册单例
    pub fn add_singleton<C: Construct>(&mut self, id: K) -> Configurable<C> {
        self.add::<C>(id, Lifetime::Singleton)
    }

    /// 以 ID 注册瞬时组件
    pub fn add_transient<C: Construct>(&mut self, id: K) -> Configurable<C> {
        self.add::<C>(id, Lifetime::Transient)
    }

    fn add<C: Construct>(&mut self, id: K, lifetime: Lifetime) -> Configurable<C> {
        let (seed, handle) = new_seed::<C, C>(lifetime, Arc::new(|instance| instance));
        self.seeds.push((id, seed));
        handle
    }

    /// 构建 ID 键容器
    ///
    /// 重复 ID 立即报错；预解析标记在冻结后立即驱动构造
    pub fn build(self) -> DiResult<KeyedContainer<K>> {
        let mut map: HashMap<K, Arc<dyn ObjectResolver>> = HashMap::with_capacity(self.seeds.len());
        let mut eager_ids = Vec::new();

        for (id, seed) in &self.seeds {
            if map.contains_key(id) {
                return Err(ConfigurationError::DuplicateRegistration {
                    key: format!("{id:?}"),
                    registry: "ID 容器注册表",
                }
                .into());
            }

            let resolver = seed.build_resolver(DependencySource::ambient(self.ambient.clone()));
            info!("注册 ID 服务: {:?} -> {} ({:?})", id, seed.key(), seed.lifetime());
            if seed.eager() {
                eager_ids.push(id.clone());
            }
            map.insert(id.clone(), resolver);
        }

        for id in eager_ids {
            if let Some(resolver) = map.get(&id) {
                debug!("预解析 ID 单例: {:?}", id);
                resolver.resolve()?;
            }
        }

        Ok(KeyedContainer {
            registry: Arc::new(RwLock::new(map)),
            ambient: self.ambient,
        })
    }
}

/// ID 键容器
///
/// 由 [`KeyedBuilder::build`] 产出；建议缓存并持有到使用结束，
/// 结束后调用 [`dispose`] 释放。
///
/// [`dispose`]: KeyedContainer::dispose
pub struct KeyedContainer<K> {
    registry: Arc<RwLock<HashMap<K, Arc<dyn ObjectResolver>>>>,
    ambient: AmbientContext,
}

impl<K> KeyedContainer<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// 按 ID 查找并解析
    ///
    /// ID 缺失返回 `Ok(None)`；ID 存在但请求类型不符报类型不匹配；
    /// 隐藏类型一律报访问拒绝
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, id: &K) -> DiResult<Option<Arc<T>>> {
        let key = TypeKey::of::<T>();
        if self.ambient.is_hidden(key) {
            return Err(ResolveError::AccessDenied { type_name: key.name }.into());
        }

        let resolver = self.registry.read().get(id).cloned();
        match resolver {
            None => Ok(None),
            Some(resolver) => resolver.resolve()?.open::<T>().map(Some),
        }
    }

    /// 按 ID 查找，缺失视为错误
    pub fn get_required<T: ?Sized + Send + Sync + 'static>(&self, id: &K) -> DiResult<Arc<T>> {
        self.get::<T>(id)?.ok_or_else(|| {
            ResolveError::NotRegistered {
                type_name: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    /// ID 是否已注册（不触发解析）
    pub fn contains(&self, id: &K) -> bool {
        self.registry.read().contains_key(id)
    }

    /// 销毁容器
    ///
    /// 语义与类型键容器一致：释放已解析的可释放单例并清空注册表，
    /// 重复调用为空操作
    pub fn dispose(&self) {
        let drained: Vec<(K, Arc<dyn ObjectResolver>)> = {
            let mut map = self.registry.write();
            map.drain().collect()
        };
        if drained.is_empty() {
            return;
        }

        for (id, resolver) in drained {
            if resolver.is_resolved() {
                debug!("释放 ID 服务: {:?}", id);
                resolver.dispose();
            }
        }
        info!("ID 容器已销毁");
    }

    /// 注册的服务数量
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    /// 容器是否为空
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }
}

impl<K> std::fmt::Debug for KeyedContainer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedContainer")
            .field("services", &self.registry.read().len())
            .finish()
    }
}
