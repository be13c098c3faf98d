//! # 组合层
//!
//! 把依赖注入核心组合成应用可直接使用的门面。
//!
//! ## 核心类型
//!
//! - [`AppContext`] - 显式的进程级上下文
//! - [`AppBuilder`] / [`AppLifetime`] - 应用级注册与收尾
//! - [`InjectorRegistry`] - 生成代码对接的注入器登记处
//! - [`LoggingConfig`] - 日志初始化配置
//!
//! ## 典型启动流程
//!
//! ```ignore
//! let ctx = AppContext::new();
//! let mut app = ctx.app_builder();
//! app.resolvers().add_singleton::<AssetDatabase>();
//! app.hidden().add_singleton::<FrameAllocator>();
//! let lifetime = app.build()?;
//! // ... 运行 ...
//! lifetime.dispose();
//! ```

pub mod application;
pub mod context;
pub mod injection;
pub mod logging;

pub use application::{AmbientCollection, AppBuilder, AppLifetime};
pub use context::AppContext;
pub use injection::{Injectable, InjectorRegistry};
pub use logging::{init_logging, LoggingConfig};
