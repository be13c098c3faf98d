//! # 依赖注入具体实现
//!
//! 提供具体的解析器、构建器、容器与作用域实现。
//!
//! ## 生命周期模型
//!
//! - 构建器的变更与 `build()` 由调用方串行化，构建消费 `self`，
//!   二次构建在类型层面不可表达
//! - 容器构建完成后并发读取安全；单例首次构造由一次性初始化
//!   原语保护，不会重复构造
//!
//! ## 核心类型
//!
//! - [`ContainerBuilder`] / [`Container`] - 类型键容器对
//! - [`KeyedBuilder`] / [`KeyedContainer`] - ID 键容器对
//! - [`ScopeBuilder`] / [`ScopeContainer`] / [`ScopeRegistry`] - 命名作用域
//! - [`SingletonResolver`] / [`TransientResolver`] - 生命周期解析器变体

pub mod builder;
pub mod container;
mod factory;
pub mod keyed;
pub mod registration;
pub mod resolvers;
pub mod scope;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use keyed::{KeyedBuilder, KeyedContainer};
pub use registration::{Configurable, RegistrationSet};
pub use resolvers::{DependencySource, SingletonResolver, TransientResolver};
pub use scope::{ScopeBuilder, ScopeContainer, ScopeRegistry};
