//! Method registry.
//!
//! Maps method names to erased [`Method`] entries. Names are
//! case-sensitive and unique; registering an existing name replaces the
//! previous entry. There is no removal: a registry is configured up front
//! and read-only while serving, which is what makes it safe to share
//! across worker tasks without locking.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//!
//! registry.register("echo", |s: String| async move { s });
//! registry.register("add", |a: i64, b: i64| async move { a + b });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::method::{Handler, Method, TypedMethod};

/// Registry mapping method names to handlers.
#[derive(Default)]
pub struct Registry {
    methods: HashMap<String, Arc<dyn Method>>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the given name.
    ///
    /// The handler may be any async function or closure whose arguments
    /// deserialize from JSON, optionally taking a
    /// [`CallContext`](super::CallContext) first; see
    /// [`Handler`](super::Handler) for the accepted shapes. The last
    /// registration under a name wins.
    pub fn register<F, T>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Handler<T>,
        T: 'static,
    {
        let name = name.into();
        let method = TypedMethod::new(name.clone(), handler);
        self.methods.insert(name, Arc::new(method));
    }

    /// Register every method of a service under `"{Name}.{method}"` names,
    /// with [`Service::NAME`] as the type name.
    pub fn register_service<S: Service>(&mut self, service: S) {
        self.register_service_as(S::NAME, service);
    }

    /// Like [`register_service`](Self::register_service), but under a
    /// caller-chosen type name.
    pub fn register_service_as<S: Service>(&mut self, name: &str, service: S) {
        let service = Arc::new(service);
        let mut scope = ServiceScope {
            registry: self,
            prefix: name,
        };
        Service::register(service, &mut scope);
    }

    /// Look up a method by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Method>> {
        self.methods.get(name)
    }

    /// Whether a method is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Names of all registered methods, in no particular order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Bulk registration of a receiver's methods.
///
/// There is no runtime reflection to enumerate methods with, so the
/// implementation is the registration site: list each method against the
/// scope and close over the shared receiver.
///
/// ```ignore
/// struct Echoer;
///
/// impl Service for Echoer {
///     const NAME: &'static str = "Echoer";
///
///     fn register(self: Arc<Self>, scope: &mut ServiceScope<'_>) {
///         scope.method("echo", |s: String| async move { s });
///     }
/// }
/// ```
pub trait Service: Send + Sync + Sized + 'static {
    /// The type name prefixed to every method: `"{NAME}.{method}"`.
    const NAME: &'static str;

    fn register(self: Arc<Self>, scope: &mut ServiceScope<'_>);
}

/// Registration scope for one service; prefixes method names.
pub struct ServiceScope<'a> {
    registry: &'a mut Registry,
    prefix: &'a str,
}

impl ServiceScope<'_> {
    /// Register one method of the service.
    pub fn method<F, T>(&mut self, name: &str, handler: F)
    where
        F: Handler<T>,
        T: 'static,
    {
        self.registry
            .register(format!("{}.{}", self.prefix, name), handler);
    }
}
