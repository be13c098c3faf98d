//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
///
/// 注册阶段产生的错误，对启动流程而言都是致命的
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("重复注册: {registry}中已存在键 {key}, 是否已经添加过?")]
    DuplicateRegistration {
        key: String,
        registry: &'static str,
    },

    #[error("注入器重复注册: {type_name}")]
    DuplicateInjector { type_name: &'static str },

    #[error("实例重复注入: {type_name}")]
    DoubleInjection { type_name: &'static str },

    #[error("未注册注入器: {type_name}")]
    InjectorNotRegistered { type_name: &'static str },

    #[error("组件构造失败: {type_name}, 原因: {message}")]
    ConstructionFailed {
        type_name: &'static str,
        message: String,
    },

    #[error("解析已销毁的单例: {type_name}")]
    ResolvedAfterDispose { type_name: &'static str },
}

/// 依赖解析错误类型
///
/// 解析阶段产生的错误，同步抛出并原样向调用方传播
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("无法解析 {requester} 的全部依赖, 缺少: {}", .missing.join(", "))]
    MissingDependencies {
        requester: &'static str,
        missing: Vec<String>,
    },

    #[error("依赖类型不匹配: 期望 {declared}, 实际 {actual}")]
    TypeMismatch {
        declared: &'static str,
        actual: &'static str,
    },

    #[error("禁止通过公共接口获取隐藏对象: {type_name}")]
    AccessDenied { type_name: &'static str },

    #[error("组件未注册: {type_name}")]
    NotRegistered { type_name: &'static str },
}

/// 作用域错误类型
#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("作用域已注册: {name}")]
    AlreadyRegistered { name: String },

    #[error("作用域不存在: {name}")]
    NotFound { name: String },
}

/// 依赖注入统一错误类型
#[derive(Error, Debug)]
pub enum DiError {
    #[error("配置错误: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },

    #[error("解析错误: {source}")]
    Resolve {
        #[from]
        source: ResolveError,
    },

    #[error("作用域错误: {source}")]
    Scope {
        #[from]
        source: ScopeError,
    },
}

impl DiError {
    /// 是否为访问拒绝错误
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::Resolve {
                source: ResolveError::AccessDenied { .. }
            }
        )
    }

    /// 是否为依赖缺失错误
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self,
            Self::Resolve {
                source: ResolveError::MissingDependencies { .. }
            }
        )
    }

    /// 是否为重复注册错误
    pub fn is_duplicate_registration(&self) -> bool {
        matches!(
            self,
            Self::Configuration {
                source: ConfigurationError::DuplicateRegistration { .. }
            }
        )
    }
}

/// 结果类型别名
pub type DiResult<T> = Result<T, DiError>;
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
pub type ScopeResult<T> = Result<T, ScopeError>;
