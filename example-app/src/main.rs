//! # 示例应用程序
//!
//! 演示如何使用 Tenon DI 运行时：环境服务、容器、作用域、
//! ID 键容器与注入器的完整接线。

use clap::Parser;
use di_abstractions::ServiceLookup;
use runtime_composition::{init_logging, AppContext, Injectable, LoggingConfig};
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Tenon DI 示例应用")]
struct Args {
    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 是否演示作用域
    #[arg(long)]
    skip_scope_demo: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&logging_config(&args.log_level)).map_err(anyhow::Error::msg)?;

    info!("启动 Tenon DI 示例应用");

    let ctx = AppContext::new();

    // 环境服务：资产数据库公开，帧分配器只供注入
    let lifetime = build_application(&ctx)?;

    // 容器：渲染端按抽象键注册，场景加载器依赖本地与环境两边
    demonstrate_container(&ctx)?;

    // 作用域与 ID 键容器
    if !args.skip_scope_demo {
        demonstrate_scope(&ctx)?;
    }
    demonstrate_keyed(&ctx)?;

    // 生成代码风格的注入
    demonstrate_injection(&ctx)?;

    lifetime.dispose();
    info!("应用已关闭");
    Ok(())
}

fn logging_config(level: &str) -> LoggingConfig {
    match level {
        "debug" | "trace" => LoggingConfig::development(),
        _ => LoggingConfig::default(),
    }
}

/// 构建应用级环境服务
fn build_application(ctx: &AppContext) -> anyhow::Result<runtime_composition::AppLifetime> {
    let mut app = ctx.app_builder();

    app.resolvers()
        .add_singleton::<AssetDatabase>()
        .with_configuration(|db| db.with_root("assets/"));
    app.hidden().add_singleton::<FrameBudget>();

    let lifetime = app.build()?;

    let db = ctx.ambient().get_required::<AssetDatabase>()?;
    info!("资产数据库就绪, root = {}", db.root);

    // 隐藏服务公共获取会被拒绝
    let denied = ctx.ambient().get::<FrameBudget>();
    info!("隐藏服务公共获取被拒绝: {}", denied.is_err());

    Ok(lifetime)
}

/// 构建并使用一个普通容器
fn demonstrate_container(ctx: &AppContext) -> anyhow::Result<()> {
    let mut builder = ctx.container_builder();
    builder.add_singleton_as::<dyn AudioBackend, NullAudioBackend>(|b| b as Arc<dyn AudioBackend>);
    builder.add_singleton::<SceneLoader>().eager();

    let container = builder.build()?;

    let loader = container.get_required::<SceneLoader>()?;
    info!("场景加载器就绪: {}", loader.describe());

    container.dispose();
    Ok(())
}

/// 构建一个命名作用域并按名字取回
fn demonstrate_scope(ctx: &AppContext) -> anyhow::Result<()> {
    let mut builder = ctx.scope_builder("battle");
    builder.add_transient::<ParticleEmitter>();

    let scope = builder.build()?;

    let from_registry = ctx.scopes().get("battle")?;
    let emitter = from_registry.get_required::<ParticleEmitter>()?;
    info!("作用域粒子发射器: capacity = {}", emitter.capacity);

    scope.dispose();
    info!("作用域已释放, battle 仍存活: {}", ctx.scopes().contains("battle"));
    Ok(())
}

/// 构建一个 ID 键容器
fn demonstrate_keyed(ctx: &AppContext) -> anyhow::Result<()> {
    let mut builder = ctx.keyed_builder::<String>();
    builder
        .add_singleton::<ParticleEmitter>("hud-sparks".to_string())
        .with_factory(|| ParticleEmitter { capacity: 64 });
    builder.add_transient::<ParticleEmitter>("footsteps".to_string());

    let keyed = builder.build()?;
    let sparks = keyed.get_required::<ParticleEmitter>(&"hud-sparks".to_string())?;
    info!("ID 键解析: hud-sparks capacity = {}", sparks.capacity);

    keyed.dispose();
    Ok(())
}

/// 注入器演示：生成代码会做同样的登记与填充
fn demonstrate_injection(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.injectors().register::<DebugOverlay>(|overlay, ctx| {
        overlay.assets = Some(ctx.ambient().get_required::<AssetDatabase>()?);
        Ok(())
    })?;

    let mut overlay = DebugOverlay::default();
    ctx.injectors().inject(&mut overlay, ctx)?;
    info!(
        "注入完成, overlay 可见资产根目录: {}",
        overlay.assets.as_ref().map(|db| db.root.as_str()).unwrap_or("<无>")
    );
    Ok(())
}

// ---- 示例组件 ----

/// 资产数据库，应用级单例
#[derive(Debug)]
struct AssetDatabase {
    root: String,
}

impl AssetDatabase {
    fn with_root(mut self, root: &str) -> Self {
        self.root = root.to_string();
        self
    }
}

impl runtime_common::Disposable for AssetDatabase {
    fn dispose(&self) {
        info!("关闭资产数据库");
    }
}

impl di_abstractions::Construct for AssetDatabase {
    fn construct(_deps: &mut di_abstractions::DependencyList) -> runtime_common::DiResult<Self> {
        Ok(Self {
            root: String::new(),
        })
    }
}

/// 帧预算，只供注入的隐藏服务
#[derive(Debug)]
struct FrameBudget {
    micros: u64,
}

impl runtime_common::Disposable for FrameBudget {}

impl di_abstractions::Construct for FrameBudget {
    fn construct(_deps: &mut di_abstractions::DependencyList) -> runtime_common::DiResult<Self> {
        Ok(Self { micros: 16_667 })
    }
}

/// 音频后端抽象
trait AudioBackend: Send + Sync {
    fn backend_name(&self) -> &'static str;
}

/// 空音频后端
#[derive(Debug)]
struct NullAudioBackend;

impl AudioBackend for NullAudioBackend {
    fn backend_name(&self) -> &'static str {
        "null"
    }
}

impl runtime_common::Disposable for NullAudioBackend {}

impl di_abstractions::Construct for NullAudioBackend {
    fn construct(_deps: &mut di_abstractions::DependencyList) -> runtime_common::DiResult<Self> {
        Ok(Self)
    }
}

/// 场景加载器：本地依赖音频后端，环境回落取资产数据库
struct SceneLoader {
    assets: Arc<AssetDatabase>,
    audio: Arc<dyn AudioBackend>,
    budget: Arc<FrameBudget>,
}

impl SceneLoader {
    fn describe(&self) -> String {
        format!(
            "assets={} audio={} budget={}us",
            self.assets.root,
            self.audio.backend_name(),
            self.budget.micros
        )
    }
}

impl runtime_common::Disposable for SceneLoader {}

impl di_abstractions::Construct for SceneLoader {
    fn dependencies() -> Vec<runtime_common::TypeKey> {
        vec![
            runtime_common::TypeKey::of::<AssetDatabase>(),
            runtime_common::TypeKey::of::<dyn AudioBackend>(),
            runtime_common::TypeKey::of::<FrameBudget>(),
        ]
    }

    fn construct(deps: &mut di_abstractions::DependencyList) -> runtime_common::DiResult<Self> {
        Ok(Self {
            assets: deps.take::<AssetDatabase>()?,
            audio: deps.take::<dyn AudioBackend>()?,
            budget: deps.take::<FrameBudget>()?,
        })
    }
}

/// 粒子发射器，作用域与 ID 键演示用
#[derive(Debug)]
struct ParticleEmitter {
    capacity: u32,
}

impl runtime_common::Disposable for ParticleEmitter {}

impl di_abstractions::Construct for ParticleEmitter {
    fn construct(_deps: &mut di_abstractions::DependencyList) -> runtime_common::DiResult<Self> {
        Ok(Self { capacity: 256 })
    }
}

/// 调试浮层，注入演示用；生成代码会产出等价的实现
#[derive(Default)]
struct DebugOverlay {
    assets: Option<Arc<AssetDatabase>>,
    injected: bool,
}

impl Injectable for DebugOverlay {
    fn injected(&self) -> bool {
        self.injected
    }

    fn mark_injected(&mut self) {
        self.injected = true;
    }
}
