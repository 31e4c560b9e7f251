mod common;

use common::*;
use exec_dispatch::execution::{
    ChannelListener, DispatchedScriptExecutor, ExecutionItemKind, ExecutionListener,
    ExecutionServiceFactory, ExecutorRegistry, ScriptDescriptor, TracingListener,
};
use exec_dispatch::ExecutionError;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_reset_restores_builtin_executor() {
    let factory = ExecutionServiceFactory::new();
    factory.set_default_executor_class(ExecutionItemKind::DispatchedScript, named_class("custom"));

    factory.reset_default_executor_classes();

    let service = factory.create_execution_service(test_context());
    let executor = service
        .resolve_executor(&ExecutionItemKind::DispatchedScript)
        .unwrap();
    assert_eq!(executor.name(), DispatchedScriptExecutor::NAME);
}

#[test]
fn test_class_binding_is_instantiated_per_resolution() {
    let factory = ExecutionServiceFactory::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let kind = ExecutionItemKind::custom("job-ref");
    factory.set_default_executor_class(kind.clone(), counting_class("job-ref", counter.clone()));

    let service = factory.create_execution_service(test_context());
    let first = service.resolve_executor(&kind).unwrap();
    let second = service.resolve_executor(&kind).unwrap();

    assert_eq!(first.name(), "job-ref");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_instance_binding_is_shared() {
    let factory = ExecutionServiceFactory::new();
    let kind = ExecutionItemKind::custom("http-call");
    let executor: Arc<dyn exec_dispatch::execution::Executor> = Arc::new(NamedExecutor::new("http"));
    factory.set_default_executor(kind.clone(), executor.clone());

    let service = factory.create_execution_service(test_context());

    assert!(Arc::ptr_eq(&service.resolve_executor(&kind).unwrap(), &executor));
    assert!(Arc::ptr_eq(&service.resolve_executor(&kind).unwrap(), &executor));
}

#[test]
fn test_instance_override_wins_over_class() {
    let factory = ExecutionServiceFactory::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let kind = ExecutionItemKind::DispatchedScript;
    let pinned: Arc<dyn exec_dispatch::execution::Executor> = Arc::new(NamedExecutor::new("pinned"));

    factory.set_default_executor(kind.clone(), pinned.clone());
    factory.set_default_executor_class(kind.clone(), counting_class("class", counter.clone()));

    let service = factory.create_execution_service(test_context());
    let resolved = service.resolve_executor(&kind).unwrap();

    assert!(Arc::ptr_eq(&resolved, &pinned));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reset_does_not_remove_instance_override() {
    let factory = ExecutionServiceFactory::new();
    let pinned: Arc<dyn exec_dispatch::execution::Executor> = Arc::new(NamedExecutor::new("pinned"));
    factory.set_default_executor(ExecutionItemKind::DispatchedScript, pinned.clone());

    factory.reset_default_executor_classes();

    let service = factory.create_execution_service(test_context());
    let resolved = service
        .resolve_executor(&ExecutionItemKind::DispatchedScript)
        .unwrap();
    assert!(Arc::ptr_eq(&resolved, &pinned));
}

#[test]
fn test_services_snapshot_registry_at_creation() {
    let factory = ExecutionServiceFactory::new();
    let kind = ExecutionItemKind::DispatchedScript;

    let before = factory.create_execution_service(test_context());
    factory.set_default_executor_class(kind.clone(), named_class("replacement"));
    let after = factory.create_execution_service(test_context());

    assert_eq!(
        before.resolve_executor(&kind).unwrap().name(),
        DispatchedScriptExecutor::NAME
    );
    assert_eq!(after.resolve_executor(&kind).unwrap().name(), "replacement");

    // New kinds registered later are invisible to the earlier service
    let late = ExecutionItemKind::custom("late");
    factory.set_default_executor_class(late.clone(), named_class("late"));
    assert!(matches!(
        before.resolve_executor(&late),
        Err(ExecutionError::UnregisteredKind(_))
    ));
}

#[test]
fn test_listener_wiring() {
    let factory = ExecutionServiceFactory::new();
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let listener: Arc<dyn ExecutionListener> = Arc::new(ChannelListener::new(tx));

    let with_listener =
        factory.create_execution_service_with_listener(test_context(), listener.clone());
    let without_listener = factory.create_execution_service(test_context());

    assert!(Arc::ptr_eq(with_listener.listener().unwrap(), &listener));
    assert!(without_listener.listener().is_none());
}

#[test]
fn test_each_service_is_fresh() {
    let factory = ExecutionServiceFactory::new();
    let context = test_context();

    let first = factory.create_execution_service(context.clone());
    let second = factory.create_execution_service(context.clone());

    assert_ne!(first.id(), second.id());
    assert!(Arc::ptr_eq(first.context(), &context));
    assert_eq!(first.bindings().kinds(), second.bindings().kinds());
}

#[test]
fn test_dispatched_script_item_keeps_descriptor() {
    let descriptor: Arc<dyn exec_dispatch::execution::DispatchedScript> =
        Arc::new(ScriptDescriptor::inline("hostname").add_arg("-f"));

    let item = ExecutionServiceFactory::create_dispatched_script_execution_item(descriptor.clone());

    assert_eq!(item.kind(), ExecutionItemKind::DispatchedScript);
    let wrapped = item.as_dispatched_script().unwrap().dispatched_script();
    assert!(Arc::ptr_eq(wrapped, &descriptor));
    assert_eq!(wrapped.script(), Some("hostname"));
    assert_eq!(wrapped.args(), ["-f".to_string()]);
}

#[test]
fn test_unbound_kind_is_unregistered() {
    let factory = ExecutionServiceFactory::with_registry(ExecutorRegistry::empty());
    let service = factory.create_execution_service(test_context());

    match service.resolve_executor(&ExecutionItemKind::DispatchedScript) {
        Err(ExecutionError::UnregisteredKind(kind)) => {
            assert_eq!(kind, ExecutionItemKind::DispatchedScript)
        }
        Err(other) => panic!("Unexpected error: {}", other),
        Ok(executor) => panic!("Unexpected executor: {}", executor.name()),
    }
}

#[test]
fn test_failing_constructor_surfaces_at_resolution() {
    let factory = ExecutionServiceFactory::new();
    let kind = ExecutionItemKind::custom("needs-db");
    factory.set_default_executor_class(
        kind.clone(),
        exec_dispatch::execution::ExecutorClass::new("db-executor", |_ctx| {
            Err(anyhow::anyhow!("no database configured"))
        }),
    );

    // Registration and service creation both succeed
    let service = factory.create_execution_service(test_context());

    match service.resolve_executor(&kind) {
        Err(ExecutionError::ExecutorConstruction {
            kind: failed_kind,
            executor,
            source,
        }) => {
            assert_eq!(failed_kind, kind);
            assert_eq!(executor, "db-executor");
            assert_eq!(source.to_string(), "no database configured");
        }
        Err(other) => panic!("Unexpected error: {}", other),
        Ok(executor) => panic!("Unexpected executor: {}", executor.name()),
    }
}

#[test]
#[serial]
fn test_instance_is_process_wide() {
    let first = ExecutionServiceFactory::instance();
    let second = ExecutionServiceFactory::instance();
    assert!(std::ptr::eq(first, second));
}

#[test]
#[serial]
fn test_instance_registration_and_reset() {
    let factory = ExecutionServiceFactory::instance();
    let kind = ExecutionItemKind::custom("global-check");

    factory.set_default_executor_class(kind.clone(), named_class("global"));
    factory.set_default_executor_class(ExecutionItemKind::DispatchedScript, named_class("swapped"));
    let service = factory.create_execution_service_with_listener(
        test_context(),
        Arc::new(TracingListener),
    );
    assert_eq!(service.resolve_executor(&kind).unwrap().name(), "global");

    factory.reset_default_executor_classes();

    let snapshot = factory.registry_snapshot();
    assert!(snapshot.binding(&kind).is_none());
    assert_eq!(
        snapshot
            .binding(&ExecutionItemKind::DispatchedScript)
            .and_then(|b| b.class.as_ref())
            .map(|c| c.name()),
        Some(DispatchedScriptExecutor::NAME)
    );
}
