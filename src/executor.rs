//! Executor resolution and invocation.
//!
//! A version delegates its business logic to an executor: a closure, a
//! [`Service`] value, or a string reference looked up in an
//! [`ExecutorRegistry`] populated at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::TreatyError;

/// Error type returned by executors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Closure executor; receives the validated params.
pub type Callable = Arc<dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync>;

/// Builds a service instance for a registered name.
pub type ServiceFactory = Arc<dyn Fn() -> Arc<dyn Service> + Send + Sync>;

/// Method invoked on services when the version doesn't name one.
pub const DEFAULT_METHOD: &str = "call";

/// A class-like executor exposing named methods.
pub trait Service: Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> &str;

    fn responds_to(&self, method: &str) -> bool;

    fn invoke(&self, method: &str, params: &Value) -> Result<ServiceOutput, BoxError>;
}

/// What a service method returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutput {
    /// A plain value, used as response data as is.
    Raw(Value),
    /// A result object; its `data` is unwrapped.
    Result(ServiceResult),
}

/// Result object exposing the response data.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResult {
    pub data: Value,
}

impl ServiceOutput {
    pub fn into_data(self) -> Value {
        match self {
            ServiceOutput::Raw(value) => value,
            ServiceOutput::Result(result) => result.data,
        }
    }
}

/// Logical reference to an executor.
#[derive(Clone)]
pub enum Executor {
    /// `posts/create` or `Posts::Create`, resolved through the registry.
    Reference(String),
    Callable(Callable),
    Service(Arc<dyn Service>),
}

impl Executor {
    /// Executor from a closure taking the params.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Executor::Callable(Arc::new(f))
    }

    /// Executor from a closure that ignores the params.
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Executor::Callable(Arc::new(move |_| f()))
    }

    pub fn service(service: impl Service + 'static) -> Self {
        Executor::Service(Arc::new(service))
    }

    fn describe(&self) -> String {
        match self {
            Executor::Reference(reference) => reference.clone(),
            Executor::Callable(_) => "<callable>".to_string(),
            Executor::Service(service) => service.name().to_string(),
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
            Executor::Callable(_) => f.write_str("Callable(..)"),
            Executor::Service(service) => f.debug_tuple("Service").field(&service.name()).finish(),
        }
    }
}

impl From<&str> for Executor {
    fn from(reference: &str) -> Self {
        Executor::Reference(reference.to_string())
    }
}

impl From<String> for Executor {
    fn from(reference: String) -> Self {
        Executor::Reference(reference)
    }
}

/// An executor plus the method to call on it.
#[derive(Debug, Clone)]
pub struct ExecutorRef {
    executor: Executor,
    method: String,
}

impl ExecutorRef {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            method: DEFAULT_METHOD.to_string(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.set_method(method);
        self
    }

    pub(crate) fn set_method(&mut self, method: impl Into<String>) {
        self.method = method.into();
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

/// An executor ready to run.
#[derive(Clone)]
pub enum Resolved {
    Callable(Callable),
    Service(Arc<dyn Service>),
}

/// Qualified service name → factory, filled once at startup.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    services: HashMap<String, ServiceFactory>,
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.services.keys().collect();
        names.sort();
        f.debug_struct("ExecutorRegistry").field("services", &names).finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under a reference; path references are qualified
    /// first, so `posts/create` and `Posts::Create` name the same entry.
    pub fn register<F>(&mut self, reference: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Service> + Send + Sync + 'static,
    {
        self.services.insert(qualify(reference), Arc::new(factory));
        self
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.services.contains_key(&qualify(reference))
    }

    /// Resolve an executor to something invocable.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Execution` for empty references and
    /// `TreatyError::NotFound` for names nobody registered.
    pub fn resolve(&self, executor: &Executor) -> Result<Resolved, TreatyError> {
        match executor {
            Executor::Callable(callable) => Ok(Resolved::Callable(Arc::clone(callable))),
            Executor::Service(service) => Ok(Resolved::Service(Arc::clone(service))),
            Executor::Reference(reference) => {
                let reference = reference.trim();
                if reference.is_empty() {
                    return Err(TreatyError::execution(
                        "Executor cannot be empty. Declare delegate_to with a service or callable",
                    ));
                }
                let qualified = qualify(reference);
                let factory = self.services.get(&qualified).ok_or_else(|| {
                    TreatyError::not_found(format!(
                        "Executor '{}' not found (resolved from '{}')",
                        qualified, reference
                    ))
                })?;
                Ok(Resolved::Service(factory()))
            }
        }
    }

    /// Resolve and run an executor with the validated params.
    ///
    /// # Errors
    ///
    /// Resolution errors as in [`ExecutorRegistry::resolve`]; a missing
    /// method or any failure raised by the callee as `TreatyError::Execution`.
    pub fn invoke(&self, executor: &ExecutorRef, params: &Value) -> Result<Value, TreatyError> {
        debug!(
            executor = %executor.executor().describe(),
            method = executor.method(),
            "invoking executor"
        );
        match self.resolve(executor.executor())? {
            Resolved::Callable(callable) => callable(params).map_err(execution_failure),
            Resolved::Service(service) => {
                if !service.responds_to(executor.method()) {
                    return Err(TreatyError::execution(format!(
                        "Method '{}' not found in class '{}'",
                        executor.method(),
                        service.name()
                    )));
                }
                service
                    .invoke(executor.method(), params)
                    .map(ServiceOutput::into_data)
                    .map_err(execution_failure)
            }
        }
    }
}

fn execution_failure(err: BoxError) -> TreatyError {
    TreatyError::execution(format!("Execution error: {}", err))
}

/// Turn a path reference into a qualified name: `admin/post_service` →
/// `Admin::PostService`. Names already containing `::` pass through.
pub fn qualify(reference: &str) -> String {
    let reference = reference.trim();
    if reference.contains("::") {
        return reference.to_string();
    }
    reference
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(camelize)
        .collect::<Vec<_>>()
        .join("::")
}

fn camelize(segment: &str) -> String {
    segment
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
