//! 组件生命周期管理

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// 单例模式 - 首次解析构造一次，之后返回缓存实例
    Singleton,
    /// 瞬时模式 - 每次解析都构造新实例，从不缓存
    Transient,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::Transient
    }
}

/// 组件释放能力 trait
///
/// 所有可构造组件都实现此 trait；持有资源的组件覆盖 [`dispose`]，
/// 其余组件保留空实现即可。
///
/// [`dispose`]: Disposable::dispose
pub trait Disposable: Send + Sync {
    /// 释放组件持有的资源
    fn dispose(&self) {}
}

/// 回调式释放器
///
/// 包装一个一次性清理闭包，重复释放时为空操作
pub struct CallbackDisposable {
    cleanup: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl CallbackDisposable {
    /// 创建新的回调释放器
    pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cleanup: Mutex::new(Some(Box::new(cleanup))),
        }
    }
}

impl Disposable for CallbackDisposable {
    fn dispose(&self) {
        if let Some(cleanup) = self.cleanup.lock().take() {
            cleanup();
        }
    }
}

/// 释放器集合
///
/// 按加入顺序逐个释放，整个集合只会释放一次
pub struct DisposableCollection {
    items: Vec<Box<dyn Disposable>>,
    disposed: AtomicBool,
}

impl DisposableCollection {
    /// 创建新的释放器集合
    pub fn new(items: Vec<Box<dyn Disposable>>) -> Self {
        Self {
            items,
            disposed: AtomicBool::new(false),
        }
    }

    /// 创建空集合
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// 追加一个释放器
    pub fn push(&mut self, item: Box<dyn Disposable>) {
        self.items.push(item);
    }

    /// 集合内释放器数量
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 集合是否为空
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Disposable for DisposableCollection {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for item in &self.items {
            item.dispose();
        }
    }
}
