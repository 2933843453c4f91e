//! # http-param-bind
//!
//! Declarative binding of HTTP request parameters into typed records or JSON maps,
//! with type conversion, JSON Schema validation and composite error reporting.
//!
//! ## Features
//!
//! - **Declarative Parameters**: Describe query, path, header, form and body parameters
//!   in code or load them from Swagger 2.0 parameter objects
//! - **Typed or Untyped Targets**: Bind into your own structs through [`bindable!`], or into a
//!   `serde_json::Map` when no static type exists
//! - **Conversion**: Integers, numbers, booleans, arrays with every collection format,
//!   and string formats such as `date-time` or `uuid` through a shared [`FormatRegistry`]
//! - **Validation**: Converted values are checked against compiled JSON Schemas
//! - **Complete Error Reports**: Every parameter is attempted; all failures come back in one
//!   [`CompositeError`]
//! - **Build Once, Bind Anywhere**: Binders are immutable and can be shared across threads
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! http-param-bind = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Binding Into a Struct
//!
//! ```rust
//! use bytes::Bytes;
//! use http_param_bind::{bindable, Destination, JsonConsumer, ParameterDefinition, RequestBinder, SimpleSchema};
//! use std::collections::HashMap;
//!
//! #[derive(Default)]
//! struct ListPets {
//!     limit: Option<i32>,
//!     tags: Vec<String>,
//! }
//!
//! bindable!(ListPets { limit, tags });
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let binder = RequestBinder::new([
//!     (
//!         "limit",
//!         ParameterDefinition::query("limit")
//!             .typed(SimpleSchema::integer().format("int32"))
//!             .schema(serde_json::json!({ "maximum": 100 })),
//!     ),
//!     (
//!         "tags",
//!         ParameterDefinition::query("tags").typed(SimpleSchema::array(SimpleSchema::string())),
//!     ),
//! ])?;
//!
//! let request = http::Request::get("/pets?limit=10&tags=cat,dog").body(Bytes::new())?;
//!
//! let mut params = ListPets::default();
//! binder.bind(&request, &HashMap::<String, String>::new(), &JsonConsumer, Destination::Record(&mut params))?;
//!
//! assert_eq!(params.limit, Some(10));
//! assert_eq!(params.tags, vec!["cat", "dog"]);
//! # Ok(())
//! # }
//! ```
//!
//! ### Binding Into a Map
//!
//! ```rust
//! use bytes::Bytes;
//! use http_param_bind::{JsonConsumer, ParameterDefinition, RequestBinder};
//! use serde_json::{json, Map};
//! use std::collections::HashMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let binder = RequestBinder::new([(
//!     "pet",
//!     serde_json::from_value::<ParameterDefinition>(json!({
//!         "name": "pet",
//!         "in": "body",
//!         "required": true,
//!         "schema": { "type": "object", "required": ["name"] }
//!     }))?,
//! )])?;
//!
//! let request = http::Request::post("/pets")
//!     .header("content-type", "application/json")
//!     .body(Bytes::from_static(br#"{"name":"Rex"}"#))?;
//!
//! let mut map = Map::new();
//! binder.bind(&request, &HashMap::<String, String>::new(), &JsonConsumer, &mut map)?;
//! assert_eq!(map["pet"], json!({ "name": "Rex" }));
//! # Ok(())
//! # }
//! ```
//!
//! ### Reporting Every Failure
//!
//! ```rust
//! use bytes::Bytes;
//! use http_param_bind::{JsonConsumer, ParameterDefinition, RequestBinder, SimpleSchema};
//! use std::collections::HashMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let binder = RequestBinder::new([
//!     ("id", ParameterDefinition::path("id").typed(SimpleSchema::integer())),
//!     ("since", ParameterDefinition::query("since").typed(SimpleSchema::string().format("date-time"))),
//! ])?;
//!
//! let request = http::Request::get("/pets/abc?since=yesterday").body(Bytes::new())?;
//! let route = HashMap::from([("id".to_owned(), "abc".to_owned())]);
//!
//! let mut map = serde_json::Map::new();
//! let err = binder.bind(&request, &route, &JsonConsumer, &mut map).unwrap_err();
//! assert_eq!(err.len(), 2);
//! assert_eq!(err.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
//! for failure in err.errors() {
//!     println!("{}: {}", failure.name(), failure);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! Binding a request is a single pass over the parameter set:
//!
//! 1. **Extract**: Read the raw value from the parameter's location (query string, route
//!    parameters, headers, url-encoded form, or a body decoded by a [`Consumer`])
//! 2. **Convert**: Turn raw strings into JSON values of the declared type and format
//! 3. **Validate**: Check the converted value against the parameter's schema
//! 4. **Write**: Deserialize the value into the struct field, or insert it into the map
//!
//! Failures at any step are recorded for that parameter and binding moves on.
//!
//! ## Limitations
//!
//! - Multipart form bodies are not supported
//! - Schemas are JSON Schema documents; Swagger-only keywords are ignored by the validator
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod convert;
pub mod error;
pub mod field;
pub mod format;
pub mod param;
pub mod request;
pub mod source;
pub mod target;

pub use error::{CompositeError, Error, ErrorKind, ParamError, Result, Violation};
pub use field::{Binding, FieldBinder};
pub use format::{FormatError, FormatRegistry};
pub use param::{CollectionFormat, Location, ParameterDefinition, PrimitiveKind, SimpleSchema};
pub use request::RequestBinder;
pub use source::{BoxError, Consumer, JsonConsumer, RawValue, RouteParams};
pub use target::{Bindable, DecodeTarget, Destination, Slot};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::bindable;
    pub use crate::error::{CompositeError, Error, ParamError, Result};
    pub use crate::{Destination, JsonConsumer, ParameterDefinition, RequestBinder, SimpleSchema};
}
