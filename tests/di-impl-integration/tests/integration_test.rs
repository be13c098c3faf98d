//! Centralized integration tests for the DI runtime
use di_abstractions::{Construct, DependencyList, ObjectResolver, ServiceLookup};
use di_impl::SingletonResolver;
use runtime_common::{Disposable, DiResult, TypeKey};
use runtime_composition::{AppContext, Injectable};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 测试服务抽象
trait IService0: Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Debug)]
struct Service0 {
    id: u32,
}

impl IService0 for Service0 {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Disposable for Service0 {}

impl Construct for Service0 {
    fn construct(_deps: &mut DependencyList) -> DiResult<Self> {
        Ok(Self { id: 7 })
    }
}

#[derive(Debug)]
struct Service1 {
    tag: &'static str,
}

impl Disposable for Service1 {}

impl Construct for Service1 {
    fn construct(_deps: &mut DependencyList) -> DiResult<Self> {
        Ok(Self { tag: "service1" })
    }
}

trait IService2: Send + Sync + std::fmt::Debug {
    fn validate(&self) -> bool;
}

/// 依赖一个抽象和一个具体类型的组合服务
struct Service2 {
    s0: Arc<dyn IService0>,
    s1: Arc<Service1>,
}

impl std::fmt::Debug for Service2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service2").finish()
    }
}

impl IService2 for Service2 {
    fn validate(&self) -> bool {
        self.s0.id() == 7 && self.s1.tag == "service1"
    }
}

impl Disposable for Service2 {}

impl Construct for Service2 {
    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<dyn IService0>(), TypeKey::of::<Service1>()]
    }

    fn construct(deps: &mut DependencyList) -> DiResult<Self> {
        Ok(Self {
            s0: deps.take::<dyn IService0>()?,
            s1: deps.take::<Service1>()?,
        })
    }
}

/// 可观测释放次数的服务
struct DisposableProbe {
    disposals: Arc<AtomicUsize>,
}

impl Disposable for DisposableProbe {
    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

impl Construct for DisposableProbe {
    fn construct(_deps: &mut DependencyList) -> DiResult<Self> {
        Ok(Self {
            disposals: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[derive(Debug)]
struct Sentinel {
    value: u32,
}

impl Disposable for Sentinel {}

impl Construct for Sentinel {
    fn construct(_deps: &mut DependencyList) -> DiResult<Self> {
        Ok(Self { value: 0 })
    }
}

fn cast_service0(concrete: Arc<Service0>) -> Arc<dyn IService0> {
    concrete
}

#[test]
fn singleton_resolves_to_same_instance() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder.add_singleton::<Service0>();
    let container = builder.build().unwrap();

    let first = container.get_required::<Service0>().unwrap();
    let second = container.get_required::<Service0>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn transient_resolves_to_distinct_instances() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder.add_transient::<Service0>();
    let container = builder.build().unwrap();

    let first = container.get_required::<Service0>().unwrap();
    let second = container.get_required::<Service0>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.id(), second.id());
}

#[test]
fn missing_dependency_fails_then_retry_succeeds() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder.add_singleton_as::<dyn IService0, Service0>(cast_service0);
    builder.add_singleton_as::<dyn IService2, Service2>(|s| s as Arc<dyn IService2>);
    let container = builder.build().unwrap();

    // Service1 哪个注册表里都没有
    let err = container.get::<dyn IService2>().unwrap_err();
    assert!(err.is_missing_dependency());
    let message = err.to_string();
    assert!(message.contains("Service2"));
    assert!(message.contains("Service1"));

    // 把缺的依赖登记进环境注册表后，同一容器重试成功
    let resolver = SingletonResolver::<Service1, Service1>::ambient(ctx.ambient().clone());
    ctx.ambient()
        .register_of::<Service1>(Arc::new(resolver), false)
        .unwrap();

    let service = container.get_required::<dyn IService2>().unwrap();
    assert!(service.validate());
}

#[test]
fn end_to_end_rebuild_with_static_registry() {
    let ctx = AppContext::new();

    let build = |ctx: &AppContext| {
        let mut builder = ctx.container_builder();
        builder.add_singleton_as::<dyn IService0, Service0>(cast_service0);
        builder.add_singleton_as::<dyn IService2, Service2>(|s| s as Arc<dyn IService2>);
        builder.build().unwrap()
    };

    let container = build(&ctx);
    assert!(container.get::<dyn IService2>().unwrap_err().is_missing_dependency());
    container.dispose();

    // 通过应用构建器把 Service1 注册为环境单例后重建
    let mut app = ctx.app_builder();
    app.resolvers().add_singleton::<Service1>();
    let lifetime = app.build().unwrap();

    let container = build(&ctx);
    let service = container.get_required::<dyn IService2>().unwrap();
    assert!(service.validate());

    container.dispose();
    lifetime.dispose();
}

#[test]
fn dispose_tears_down_resolved_disposables_exactly_once() {
    let disposals = Arc::new(AtomicUsize::new(0));
    let constructions = Arc::new(AtomicUsize::new(0));

    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();

    let probe_disposals = disposals.clone();
    builder
        .add_singleton::<DisposableProbe>()
        .with_factory(move || DisposableProbe {
            disposals: probe_disposals.clone(),
        });
    builder.add_singleton::<Service0>();

    // 从未解析的单例不得因为释放而被构造
    let lazy_constructions = constructions.clone();
    builder
        .add_singleton::<Sentinel>()
        .with_factory(move || {
            lazy_constructions.fetch_add(1, Ordering::SeqCst);
            Sentinel { value: 1 }
        });

    let container = builder.build().unwrap();
    container.get_required::<DisposableProbe>().unwrap();
    container.get_required::<Service0>().unwrap();

    container.dispose();
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 0);

    // 二次释放是空操作
    container.dispose();
    assert_eq!(disposals.load(Ordering::SeqCst), 1);

    // 释放后的查找落空
    assert!(container.get::<Service0>().unwrap().is_none());
}

#[test]
fn absent_lookup_returns_none_and_hidden_is_denied() {
    let ctx = AppContext::new();

    let mut app = ctx.app_builder();
    app.hidden().add_singleton::<Service1>();
    let _lifetime = app.build().unwrap();

    let container = ctx.container_builder().build().unwrap();

    // 未注册的非隐藏类型: Ok(None)，绝不报错
    assert!(container.get::<Service0>().unwrap().is_none());

    // 隐藏类型: 无论容器里有没有都拒绝
    assert!(container.get::<Service1>().unwrap_err().is_access_denied());
    assert!(ctx.ambient().get::<Service1>().unwrap_err().is_access_denied());

    // get_required 对缺失报未注册错误
    assert!(container.get_required::<Service0>().is_err());
}

#[test]
fn hidden_services_are_still_injectable_as_dependencies() {
    let ctx = AppContext::new();

    let mut app = ctx.app_builder();
    app.hidden().add_singleton::<Service1>();
    let _lifetime = app.build().unwrap();

    let mut builder = ctx.container_builder();
    builder.add_singleton_as::<dyn IService0, Service0>(cast_service0);
    builder.add_singleton_as::<dyn IService2, Service2>(|s| s as Arc<dyn IService2>);
    let container = builder.build().unwrap();

    // Service1 是隐藏的，但作为 Service2 的依赖照常解析
    let service = container.get_required::<dyn IService2>().unwrap();
    assert!(service.validate());
}

#[test]
fn duplicate_scope_name_fails_until_disposed() {
    let ctx = AppContext::new();

    let mut first = ctx.scope_builder("arena");
    first.add_singleton::<Service0>();
    let scope = first.build().unwrap();

    let mut second = ctx.scope_builder("arena");
    second.add_singleton::<Service0>();
    let err = second.build().unwrap_err();
    assert!(err.to_string().contains("arena"));

    // 第一个作用域释放后，同名可以重新注册
    scope.dispose();
    assert!(!ctx.scopes().contains("arena"));

    let mut third = ctx.scope_builder("arena");
    third.add_singleton::<Service0>();
    let reopened = third.build().unwrap();
    assert_eq!(reopened.name(), "arena");
    reopened.dispose();
}

#[test]
fn scope_registry_lookup_and_clear() {
    let ctx = AppContext::new();

    let mut builder = ctx.scope_builder("loading");
    builder.add_singleton::<Service0>();
    let scope = builder.build().unwrap();

    let fetched = ctx.scopes().get("loading").unwrap();
    assert!(Arc::ptr_eq(&scope, &fetched));
    assert!(ctx.scopes().get("missing").is_err());

    ctx.scopes().clear();
    assert!(ctx.scopes().is_empty());
}

#[test]
fn factory_override_bypasses_construction_entirely() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder
        .add_transient::<Sentinel>()
        .with_factory(|| Sentinel { value: 42 });
    let container = builder.build().unwrap();

    let first = container.get_required::<Sentinel>().unwrap();
    let second = container.get_required::<Sentinel>().unwrap();
    assert_eq!(first.value, 42);
    assert_eq!(second.value, 42);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn configuration_applies_to_factory_output() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder
        .add_singleton::<Sentinel>()
        .with_factory(|| Sentinel { value: 42 })
        .with_configuration(|s| Sentinel { value: s.value + 1 });
    let container = builder.build().unwrap();

    assert_eq!(container.get_required::<Sentinel>().unwrap().value, 43);
}

#[test]
fn builder_rejects_duplicate_keys() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder.add_singleton::<Service0>();
    builder.add_transient::<Service0>();

    let err = builder.build().unwrap_err();
    assert!(err.is_duplicate_registration());
}

#[test]
fn ambient_rejects_duplicate_keys() {
    let ctx = AppContext::new();

    let mut app = ctx.app_builder();
    app.resolvers().add_singleton::<Service0>();
    let _lifetime = app.build().unwrap();

    let mut second = ctx.app_builder();
    second.resolvers().add_singleton::<Service0>();
    let err = second.build().unwrap_err();
    assert!(err.is_duplicate_registration());
}

#[test]
fn eager_singletons_construct_at_build() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();

    let counter = constructions.clone();
    builder
        .add_singleton::<Sentinel>()
        .with_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Sentinel { value: 9 }
        })
        .eager();

    let container = builder.build().unwrap();
    assert_eq!(constructions.load(Ordering::SeqCst), 1);

    container.get_required::<Sentinel>().unwrap();
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn eager_build_failure_is_fatal() {
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();
    builder
        .add_singleton_as::<dyn IService2, Service2>(|s| s as Arc<dyn IService2>)
        .eager();

    let err = builder.build().unwrap_err();
    assert!(err.is_missing_dependency());
}

#[test]
fn concurrent_first_resolve_constructs_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let ctx = AppContext::new();
    let mut builder = ctx.container_builder();

    let counter = constructions.clone();
    builder
        .add_singleton::<Sentinel>()
        .with_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Sentinel { value: 5 }
        });
    let container = Arc::new(builder.build().unwrap());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let container = container.clone();
            scope.spawn(move || {
                container.get_required::<Sentinel>().unwrap();
            });
        }
    });

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn keyed_container_resolves_by_id() {
    let ctx = AppContext::new();
    let mut builder = ctx.keyed_builder::<String>();
    builder.add_singleton::<Service0>("primary".to_string());
    builder
        .add_transient::<Sentinel>("sentinel".to_string())
        .with_factory(|| Sentinel { value: 42 });
    let keyed = builder.build().unwrap();

    let first = keyed.get_required::<Service0>(&"primary".to_string()).unwrap();
    let second = keyed.get_required::<Service0>(&"primary".to_string()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    assert_eq!(
        keyed
            .get_required::<Sentinel>(&"sentinel".to_string())
            .unwrap()
            .value,
        42
    );

    // ID 缺失返回 None；ID 存在但类型不符报类型不匹配
    assert!(keyed.get::<Service0>(&"absent".to_string()).unwrap().is_none());
    assert!(keyed.get::<Sentinel>(&"primary".to_string()).is_err());
}

#[test]
fn keyed_builder_rejects_duplicate_ids() {
    let ctx = AppContext::new();
    let mut builder = ctx.keyed_builder::<&'static str>();
    builder.add_singleton::<Service0>("same");
    builder.add_singleton::<Service1>("same");

    let err = builder.build().unwrap_err();
    assert!(err.is_duplicate_registration());
}

/// 注入演示类型，模拟生成代码产出的结构
#[derive(Default)]
struct HudWidget {
    service: Option<Arc<dyn IService0>>,
    injected: bool,
}

impl Injectable for HudWidget {
    fn injected(&self) -> bool {
        self.injected
    }

    fn mark_injected(&mut self) {
        self.injected = true;
    }
}

#[test]
fn injector_populates_fields_once() {
    let ctx = AppContext::new();

    let mut app = ctx.app_builder();
    app.resolvers()
        .add_singleton_as::<dyn IService0, Service0>(cast_service0);
    let _lifetime = app.build().unwrap();

    ctx.injectors()
        .register::<HudWidget>(|widget, ctx| {
            widget.service = Some(ctx.ambient().get_required::<dyn IService0>()?);
            Ok(())
        })
        .unwrap();

    let mut widget = HudWidget::default();
    ctx.injectors().inject(&mut widget, &ctx).unwrap();
    assert_eq!(widget.service.as_ref().unwrap().id(), 7);

    // 同一实例二次注入报配置错误
    let err = ctx.injectors().inject(&mut widget, &ctx).unwrap_err();
    assert!(err.to_string().contains("重复注入"));

    // 重复登记注入器同样报错
    assert!(ctx
        .injectors()
        .register::<HudWidget>(|_, _| Ok(()))
        .is_err());
}

#[test]
fn injector_missing_registration_is_an_error() {
    let ctx = AppContext::new();
    let mut widget = HudWidget::default();

    let err = ctx.injectors().inject(&mut widget, &ctx).unwrap_err();
    assert!(err.to_string().contains("未注册注入器"));
}

#[test]
fn app_lifetime_disposes_ambient_singletons() {
    let disposals = Arc::new(AtomicUsize::new(0));
    let ctx = AppContext::new();

    let mut app = ctx.app_builder();
    let probe_disposals = disposals.clone();
    app.resolvers()
        .add_singleton::<DisposableProbe>()
        .with_factory(move || DisposableProbe {
            disposals: probe_disposals.clone(),
        });
    let lifetime = app.build().unwrap();

    ctx.ambient().get_required::<DisposableProbe>().unwrap();

    lifetime.dispose();
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert!(ctx.ambient().is_empty());

    // 收尾幂等
    lifetime.dispose();
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn context_reset_isolates_tests() {
    let ctx = AppContext::new();

    let mut app = ctx.app_builder();
    app.resolvers().add_singleton::<Service0>();
    let _lifetime = app.build().unwrap();

    let mut scope = ctx.scope_builder("reset-demo");
    scope.add_singleton::<Service1>();
    scope.build().unwrap();

    ctx.injectors().register::<HudWidget>(|_, _| Ok(())).unwrap();

    ctx.reset();
    assert!(ctx.ambient().is_empty());
    assert!(ctx.scopes().is_empty());
    assert!(ctx.injectors().is_empty());
}

#[test]
fn singleton_resolver_fails_fast_after_dispose() {
    let ctx = AppContext::new();
    let resolver = SingletonResolver::<Service0, Service0>::ambient(ctx.ambient().clone());

    resolver.resolve().unwrap();
    assert!(resolver.is_resolved());

    resolver.dispose();
    let err = resolver.resolve().unwrap_err();
    assert!(err.to_string().contains("已销毁"));
}

#[test]
fn static_registry_register_and_remove() {
    let ctx = AppContext::new();

    let resolver = SingletonResolver::<Service0, Service0>::ambient(ctx.ambient().clone());
    let resolver: Arc<dyn ObjectResolver> = Arc::new(resolver);

    ctx.ambient()
        .register_of::<Service0>(resolver.clone(), false)
        .unwrap();
    assert_eq!(ctx.ambient().get_required::<Service0>().unwrap().id(), 7);

    // 同键二次登记失败
    assert!(ctx
        .ambient()
        .register_of::<Service0>(resolver, false)
        .unwrap_err()
        .is_duplicate_registration());

    ctx.ambient().remove_of::<Service0>();
    assert!(ctx.ambient().get::<Service0>().unwrap().is_none());
}
