//! Versioned endpoint contracts - resolve, validate, execute, adapt.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::TreatyError;
use crate::executor::ExecutorRegistry;
use crate::orchestrator::ScopeOrchestrator;
use crate::processor::ProcessorRegistry;
use crate::resolver::{resolve_version, VersionResolver};
use crate::version::{SemanticVersion, VersionBuilder, VersionCollection, VersionFactory};
use crate::types::Config;

/// Output of a served request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatyResponse {
    pub data: Value,
    pub status: u16,
}

/// The contract of one endpoint across all its versions.
///
/// Built once; shared read-only between requests.
#[derive(Debug)]
pub struct Treaty {
    name: String,
    config: Config,
    versions: VersionCollection,
    executors: Arc<ExecutorRegistry>,
}

impl Treaty {
    pub fn builder(name: impl Into<String>) -> TreatyBuilder {
        TreatyBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn versions(&self) -> &VersionCollection {
        &self.versions
    }

    pub fn executors(&self) -> &ExecutorRegistry {
        &self.executors
    }

    /// Resolve the version to serve for a requested version string.
    pub fn resolve(&self, requested: Option<&str>) -> Result<&VersionFactory, TreatyError> {
        resolve_version(requested, &self.versions)
    }

    /// Serve a request: resolve the version, validate the params, run the
    /// executor and adapt its output.
    ///
    /// # Errors
    ///
    /// Any resolution, validation or execution failure; the first one wins.
    pub fn call(
        &self,
        requested: Option<&str>,
        params: &Value,
    ) -> Result<TreatyResponse, TreatyError> {
        let factory = self.resolve(requested)?;
        self.serve(factory, params)
    }

    /// Like [`Treaty::call`], extracting the version from a request context.
    pub fn call_with<C>(
        &self,
        resolver: &VersionResolver<C>,
        context: &C,
        params: &Value,
    ) -> Result<TreatyResponse, TreatyError> {
        let factory = resolver.resolve(context, &self.versions)?;
        self.serve(factory, params)
    }

    fn serve(
        &self,
        factory: &VersionFactory,
        params: &Value,
    ) -> Result<TreatyResponse, TreatyError> {
        let validated = validate_request(factory, params)?;

        let executor = factory.executor().ok_or_else(|| {
            TreatyError::execution(format!(
                "Version {} of '{}' has no executor. Declare delegate_to",
                factory.version(),
                self.name
            ))
        })?;
        let output = self.executors.invoke(executor, &validated)?;

        let data = adapt_response(factory, output)?;

        let status = factory
            .response()
            .map_or(self.config.default_status, |response| response.status());

        info!(treaty = %self.name, version = %factory.version(), status, "request served");
        Ok(TreatyResponse { data, status })
    }
}

/// Run the request schema of a version over `params`.
///
/// Without a request schema the params pass through unchanged.
pub fn validate_request(factory: &VersionFactory, params: &Value) -> Result<Value, TreatyError> {
    match factory.request() {
        Some(request) => ScopeOrchestrator::request(request).process(params),
        None => Ok(params.clone()),
    }
}

/// Run the response schema of a version over executor output.
///
/// Without a response schema the output passes through unchanged.
pub fn validate_response(factory: &VersionFactory, output: &Value) -> Result<Value, TreatyError> {
    match factory.response() {
        Some(response) => ScopeOrchestrator::response(response).process(output),
        None => Ok(output.clone()),
    }
}

/// Shape executor output as the version's strategy says: `direct` passes it
/// through, `adapter` runs the response schema over it.
pub fn adapt_response(factory: &VersionFactory, output: Value) -> Result<Value, TreatyError> {
    if factory.strategy().is_direct() {
        debug!(version = %factory.version(), "direct strategy, response passed through");
        return Ok(output);
    }
    validate_response(factory, &output)
}

/// Builder for a [`Treaty`].
#[derive(Debug)]
pub struct TreatyBuilder {
    name: String,
    config: Config,
    processors: Arc<ProcessorRegistry>,
    executors: ExecutorRegistry,
    versions: VersionCollection,
}

impl TreatyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Config::default(),
            processors: ProcessorRegistry::shared(),
            executors: ExecutorRegistry::new(),
            versions: VersionCollection::new(),
        }
    }

    /// Settings for versions declared after this call.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Option processors for versions declared after this call.
    pub fn processors(mut self, processors: Arc<ProcessorRegistry>) -> Self {
        self.processors = processors;
        self
    }

    pub fn executors(mut self, executors: ExecutorRegistry) -> Self {
        self.executors = executors;
        self
    }

    /// Declare a version.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` for malformed versions, duplicate
    /// versions, a second default, or any defect in the declaration body.
    pub fn version<V, F>(mut self, version: V, body: F) -> Result<Self, TreatyError>
    where
        V: TryInto<SemanticVersion>,
        V::Error: Into<TreatyError>,
        F: FnOnce(&mut VersionBuilder) -> Result<(), TreatyError>,
    {
        let version = version.try_into().map_err(Into::into)?;
        let mut builder = VersionBuilder::new(version, self.config, Arc::clone(&self.processors));
        body(&mut builder)?;
        self.versions.push(builder.build())?;
        Ok(self)
    }

    pub fn build(self) -> Treaty {
        Treaty {
            name: self.name,
            config: self.config,
            versions: self.versions,
            executors: Arc::new(self.executors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Executor;
    use crate::option::Options;
    use serde_json::json;

    fn echo_treaty(strategy: &'static str) -> Treaty {
        Treaty::builder("posts#create")
            .version("1", |v| {
                v.default().strategy(strategy)?;
                v.request(|r| {
                    r.root(|b| b.string("title", Options::new().required()).map(|_| ()))?;
                    Ok(())
                })?;
                v.response(201, |r| {
                    r.root(|b| {
                        b.string("title", Options::new().rename("headline"))?;
                        Ok(())
                    })?;
                    Ok(())
                })?;
                v.delegate_to(Executor::callable(|params| {
                    Ok(json!({"title": params["title"], "secret": "s3cr3t"}))
                }));
                Ok(())
            })
            .unwrap()
            .build()
    }

    #[test]
    fn adapter_routes_output_through_response_schema() {
        let treaty = echo_treaty("adapter");
        let response = treaty.call(None, &json!({"title": "Hello"})).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.data, json!({"headline": "Hello"}));
    }

    #[test]
    fn direct_returns_output_verbatim() {
        let treaty = echo_treaty("direct");
        let response = treaty.call(Some("1"), &json!({"title": "Hello"})).unwrap();
        assert_eq!(response.data, json!({"title": "Hello", "secret": "s3cr3t"}));
    }

    #[test]
    fn request_failure_stops_before_executor() {
        let treaty = Treaty::builder("t")
            .version("1", |v| {
                v.default();
                v.request(|r| {
                    r.root(|b| b.string("title", Options::new()).map(|_| ()))?;
                    Ok(())
                })?;
                v.delegate_to(Executor::thunk(|| panic!("executor must not run")));
                Ok(())
            })
            .unwrap()
            .build();
        let err = treaty.call(None, &json!({})).unwrap_err();
        assert!(matches!(err, TreatyError::Validation { .. }));
    }

    #[test]
    fn missing_executor_is_execution_error() {
        let treaty = Treaty::builder("t")
            .version("1", |v| {
                v.default();
                Ok(())
            })
            .unwrap()
            .build();
        let err = treaty.call(None, &json!({})).unwrap_err();
        assert!(matches!(err, TreatyError::Execution { .. }));
    }

    #[test]
    fn status_defaults_without_response_block() {
        let treaty = Treaty::builder("t")
            .config(Config::new().default_status(202))
            .version("1", |v| {
                v.default().delegate_to(Executor::thunk(|| Ok(json!({"ok": true}))));
                Ok(())
            })
            .unwrap()
            .build();
        let response = treaty.call(None, &json!({"any": 1})).unwrap();
        assert_eq!(response.status, 202);
        assert_eq!(response.data, json!({"ok": true}));
    }

    #[test]
    fn adapt_response_follows_strategy() {
        let output = json!({"title": "Hello", "secret": "s3cr3t"});

        let treaty = echo_treaty("adapter");
        let factory = treaty.resolve(None).unwrap();
        assert_eq!(
            adapt_response(factory, output.clone()).unwrap(),
            json!({"headline": "Hello"})
        );

        let treaty = echo_treaty("direct");
        let factory = treaty.resolve(None).unwrap();
        assert_eq!(adapt_response(factory, output.clone()).unwrap(), output);
    }

    #[test]
    fn malformed_version_fails_declaration() {
        let err = Treaty::builder("t").version("", |_| Ok(())).unwrap_err();
        assert!(matches!(err, TreatyError::Schema { .. }));
    }
}
