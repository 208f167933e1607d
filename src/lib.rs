//! Treaty
//!
//! Versioned API contracts: declare the request and response schema of an
//! endpoint per version, then serve requests through them.
//!
//! A call resolves the requested version, validates and transforms the
//! params against the request schema, runs the version's executor, and
//! adapts the executor's output through the response schema.
//!
//! # Example
//!
//! ```
//! use treaty::{Executor, Options, Treaty};
//! use serde_json::json;
//!
//! let treaty = Treaty::builder("posts#create")
//!     .version("1.0", |v| {
//!         v.default();
//!         v.request(|request| {
//!             request.scope("post", |post| {
//!                 post.string("title", Options::new().required())?;
//!                 post.string(
//!                     "state",
//!                     Options::new()
//!                         .optional()
//!                         .inclusion(json!(["draft", "live"]))
//!                         .default_value(json!("draft")),
//!                 )?;
//!                 Ok(())
//!             })?;
//!             Ok(())
//!         })?;
//!         v.response(201, |response| {
//!             response.scope("post", |post| {
//!                 post.string("title", Options::new())?;
//!                 Ok(())
//!             })?;
//!             Ok(())
//!         })?;
//!         v.delegate_to(Executor::callable(|params| Ok(params.clone())));
//!         Ok(())
//!     })
//!     .unwrap()
//!     .build();
//!
//! let response = treaty.call(None, &json!({"post": {"title": "Hello"}})).unwrap();
//! assert_eq!(response.status, 201);
//! assert_eq!(response.data, json!({"post": {"title": "Hello"}}));
//!
//! // The request schema rejects a missing title before the executor runs
//! let err = treaty.call(Some("1.0"), &json!({"post": {}})).unwrap_err();
//! assert_eq!(err.http_status(), 422);
//! ```
//!
//! # Options
//!
//! | Option | Kind | Effect |
//! |--------|------|--------|
//! | `required` | validator | Rejects missing or empty values (on by default in requests) |
//! | `type` | validator | Rejects values of the wrong type (implicit) |
//! | `inclusion` | validator | Rejects values outside a set |
//! | `format` | validator | Rejects strings not in a named format |
//! | `default` | modifier | Replaces null with a value |
//! | `cast` | modifier | Converts between scalar types |
//! | `transform` | modifier | Applies a function to the value |
//! | `as` | modifier | Renames the attribute in the output |
//!
//! Options take a plain value or the advanced form:
//! ```json
//! { "required": { "is": true, "message": "Title is mandatory" } }
//! ```

mod attribute;
mod declaration;
mod error;
mod executor;
mod format;
mod linter;
mod loader;
mod option;
mod orchestrator;
mod processor;
mod resolver;
mod schema;
mod strategy;
mod treaty;
mod types;
mod validator;
mod version;

pub use attribute::{Attribute, AttributeSpec};
pub use declaration::{
    AttributeDeclaration, ResponseDeclaration, ScopeDeclaration, TreatyDeclaration,
    VersionDeclaration,
};
pub use error::{LoadError, TreatyError};
pub use executor::{
    qualify, BoxError, Executor, ExecutorRef, ExecutorRegistry, Resolved, Service, ServiceOutput,
    ServiceResult,
};
pub use format::Format;
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    is_url, load_declaration, load_declaration_auto, load_declaration_str, load_json,
    load_json_auto, load_json_str, parse_declaration,
};
pub use option::{normalize, Helper, NormalizedOption, OptionSet, OptionValue, Options, ValueKey};
pub use orchestrator::ScopeOrchestrator;
pub use processor::{OptionProcessor, ProcessorContext, ProcessorRegistry};
pub use resolver::{resolve_version, VersionResolver};
pub use schema::{BlockResult, Entity, SchemaBlock, SchemaFactory, Scope};
pub use strategy::Strategy;
pub use treaty::{
    adapt_response, validate_request, validate_response, Treaty, TreatyBuilder, TreatyResponse,
};
pub use types::{json_type_name, AttributeType, Config, Direction, Flavor};
pub use validator::AttributeValidator;
pub use version::{Segment, SemanticVersion, VersionBuilder, VersionCollection, VersionFactory};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
