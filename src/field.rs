use crate::convert::{convert_strings, ConvertError};
use crate::error::{ParamError, Violation};
use crate::format::FormatRegistry;
use crate::param::ParameterDefinition;
use crate::source::{extract, Consumer, RawValue, RouteParams};
use crate::target::{DecodeTarget, Slot};
use bytes::Bytes;
use http::Request;
use jsonschema::Validator;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome of a successful field bind.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The value written into the slot
    Bound(Value),
    /// Optional parameter not present; the slot was left untouched
    Absent,
}

/// Binds and validates exactly one parameter.
///
/// Built once per [`ParameterDefinition`] and reused across requests. The
/// schema, if any, is compiled at construction together with the
/// [`DecodeTarget`] used for untyped destinations.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http_param_bind::{FieldBinder, FormatRegistry, JsonConsumer, ParameterDefinition, SimpleSchema};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let param = ParameterDefinition::query("limit").typed(SimpleSchema::integer().format("int32"));
/// let binder = FieldBinder::new(Arc::new(param), None, Arc::new(FormatRegistry::default()))?;
///
/// let request = http::Request::get("/pets?limit=25").body(Bytes::new())?;
/// let mut limit: Option<i32> = None;
/// binder
///     .bind(&request, &HashMap::<String, String>::new(), &JsonConsumer, "limit", &mut limit)
///     .unwrap();
/// assert_eq!(limit, Some(25));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FieldBinder {
    param: Arc<ParameterDefinition>,
    formats: Arc<FormatRegistry>,
    validator: Option<Validator>,
    target: DecodeTarget,
}

impl FieldBinder {
    /// Creates a binder for `param`.
    ///
    /// `document` is the API document the parameter belongs to; its
    /// `definitions` are made available to `$ref`s in the parameter schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`](crate::Error::Schema) if the parameter schema
    /// does not compile.
    pub fn new(
        param: Arc<ParameterDefinition>,
        document: Option<&Value>,
        formats: Arc<FormatRegistry>,
    ) -> crate::Result<Self> {
        let validator = match &param.schema {
            Some(schema) => Some(compile(&param.name, schema, document)?),
            None => None,
        };
        let target = DecodeTarget::infer(&param);
        Ok(Self {
            param,
            formats,
            validator,
            target,
        })
    }

    pub fn param(&self) -> &ParameterDefinition {
        &self.param
    }

    pub fn decode_target(&self) -> DecodeTarget {
        self.target
    }

    /// Reads, converts, validates and writes the parameter.
    ///
    /// `name` scopes any error: the record field name when binding into a
    /// struct, the wire name otherwise. `slot` is only written once the value
    /// passed validation.
    pub fn bind(
        &self,
        request: &Request<Bytes>,
        route_params: &(impl RouteParams + ?Sized),
        consumer: &dyn Consumer,
        name: &str,
        slot: &mut dyn Slot,
    ) -> Result<Binding, ParamError> {
        let param = &*self.param;
        let location = param.location.as_str();

        let raw = extract(param.location, &param.name, request, route_params, consumer).map_err(
            |reason| ParamError::Decode {
                name: name.to_owned(),
                location,
                reason,
            },
        )?;

        let empty = raw.is_empty() && !(param.allow_empty_value && raw != RawValue::Absent);
        let (value, text) = if empty {
            match &param.default {
                Some(default) => (default.clone(), None),
                None if param.required => {
                    return Err(ParamError::Required {
                        name: name.to_owned(),
                        location,
                    })
                }
                None => return Ok(Binding::Absent),
            }
        } else {
            let text = match &raw {
                RawValue::Strings(values) => Some(values.join(",")),
                _ => None,
            };
            (self.convert(raw, name)?, text)
        };

        self.validate(&value, name)?;

        // A request number the field's own type cannot hold is bad input;
        // anything else means the record does not fit the parameter.
        slot.assign(value.clone()).map_err(|e| match text {
            Some(text) if is_numeric(&value) => ParamError::InvalidType {
                name: name.to_owned(),
                location,
                expected: param.simple.type_name(),
                value: text,
            },
            _ => ParamError::Assign {
                name: name.to_owned(),
                location,
                reason: e.to_string(),
            },
        })?;
        tracing::trace!(parameter = %name, %location, "parameter bound");
        Ok(Binding::Bound(value))
    }

    fn convert(&self, raw: RawValue, name: &str) -> Result<Value, ParamError> {
        let location = self.param.location.as_str();
        let strings = match raw {
            RawValue::Decoded(value) => return Ok(value),
            RawValue::Strings(strings) => strings,
            RawValue::Absent => Vec::new(),
        };
        convert_strings(&strings, &self.param.simple, &self.formats).map_err(|e| match e {
            ConvertError::Type { expected, value } => ParamError::InvalidType {
                name: name.to_owned(),
                location,
                expected,
                value,
            },
            ConvertError::Format { format, reason } => ParamError::InvalidFormat {
                name: name.to_owned(),
                location,
                format,
                reason,
            },
        })
    }

    /// Checks `value` against the compiled schema, collecting every violation.
    pub fn validate(&self, value: &Value, name: &str) -> Result<(), ParamError> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let violations: Vec<Violation> = validator
            .iter_errors(value)
            .map(|e| Violation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ParamError::Validation {
                name: name.to_owned(),
                location: self.param.location.as_str(),
                violations,
            })
        }
    }
}

impl fmt::Debug for FieldBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinder")
            .field("param", &self.param)
            .field("validated", &self.validator.is_some())
            .field("target", &self.target)
            .finish()
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::Array(items) => items.iter().all(is_numeric),
        _ => false,
    }
}

fn compile(name: &str, schema: &Value, document: Option<&Value>) -> crate::Result<Validator> {
    let mut schema = schema.clone();
    if let (Some(object), Some(definitions)) = (
        schema.as_object_mut(),
        document.and_then(|doc| doc.get("definitions")),
    ) {
        object
            .entry("definitions")
            .or_insert_with(|| definitions.clone());
    }
    jsonschema::validator_for(&schema).map_err(|e| crate::Error::Schema {
        name: name.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::SimpleSchema;
    use crate::source::JsonConsumer;
    use http::header::CONTENT_TYPE;
    use serde_json::json;
    use std::collections::HashMap;

    fn binder(param: ParameterDefinition) -> FieldBinder {
        FieldBinder::new(Arc::new(param), None, Arc::new(FormatRegistry::default())).unwrap()
    }

    fn no_params() -> HashMap<String, String> {
        HashMap::new()
    }

    fn get(uri: &str) -> Request<Bytes> {
        Request::get(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_bind_converted_query_value() {
        let limit = binder(ParameterDefinition::query("limit").typed(SimpleSchema::integer()));
        let mut slot: Option<i64> = None;
        let outcome = limit
            .bind(&get("/?limit=7"), &no_params(), &JsonConsumer, "limit", &mut slot)
            .unwrap();
        assert_eq!(outcome, Binding::Bound(json!(7)));
        assert_eq!(slot, Some(7));
    }

    #[test]
    fn test_missing_required_parameter() {
        let id = binder(ParameterDefinition::path("id"));
        let mut slot = String::new();
        let err = id
            .bind(&get("/"), &no_params(), &JsonConsumer, "id", &mut slot)
            .unwrap_err();
        assert_eq!(
            err,
            ParamError::Required {
                name: "id".into(),
                location: "path"
            }
        );
    }

    #[test]
    fn test_absent_optional_uses_default_or_leaves_slot() {
        let with_default = binder(
            ParameterDefinition::query("limit")
                .typed(SimpleSchema::integer())
                .default_value(json!(20)),
        );
        let mut slot = 0_i32;
        with_default
            .bind(&get("/"), &no_params(), &JsonConsumer, "limit", &mut slot)
            .unwrap();
        assert_eq!(slot, 20);

        let plain = binder(ParameterDefinition::query("q"));
        let mut slot = String::from("untouched");
        let outcome = plain
            .bind(&get("/?q="), &no_params(), &JsonConsumer, "q", &mut slot)
            .unwrap();
        assert_eq!(outcome, Binding::Absent);
        assert_eq!(slot, "untouched");
    }

    #[test]
    fn test_empty_value_when_allowed() {
        let q = binder(ParameterDefinition::query("q").required(true).allow_empty_value(true));
        let mut slot = String::from("x");
        q.bind(&get("/?q="), &no_params(), &JsonConsumer, "q", &mut slot)
            .unwrap();
        assert_eq!(slot, "");

        let strict = binder(ParameterDefinition::query("q").required(true));
        assert!(matches!(
            strict.bind(&get("/?q="), &no_params(), &JsonConsumer, "q", &mut slot),
            Err(ParamError::Required { .. })
        ));
    }

    #[test]
    fn test_format_failure_is_scoped_conversion_error() {
        let since = binder(
            ParameterDefinition::query("since").typed(SimpleSchema::string().format("date-time")),
        );
        let mut slot: Option<String> = None;
        let err = since
            .bind(&get("/?since=tomorrow"), &no_params(), &JsonConsumer, "since", &mut slot)
            .unwrap_err();
        assert!(matches!(err, ParamError::InvalidFormat { ref format, .. } if format == "date-time"));
        assert_eq!(err.name(), "since");
        assert_eq!(err.kind(), crate::ErrorKind::Conversion);
        assert_eq!(slot, None);
    }

    #[test]
    fn test_validation_reports_all_violations() {
        let pet = binder(ParameterDefinition::body(
            "pet",
            json!({
                "type": "object",
                "required": ["name"],
                "properties": { "age": { "type": "integer", "minimum": 0 } }
            }),
        ));
        let request = Request::post("/pets")
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(br#"{"age": -1}"#))
            .unwrap();
        let mut slot = Value::Null;
        let err = pet
            .bind(&request, &no_params(), &JsonConsumer, "pet", &mut slot)
            .unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert_eq!(err.violations().len(), 2);
        assert_eq!(slot, Value::Null);
    }

    #[test]
    fn test_validates_converted_value_not_raw_string() {
        let limit = binder(
            ParameterDefinition::query("limit")
                .typed(SimpleSchema::integer())
                .schema(json!({ "type": "integer", "maximum": 100 })),
        );
        let mut slot = 0_i64;
        assert!(limit
            .bind(&get("/?limit=50"), &no_params(), &JsonConsumer, "limit", &mut slot)
            .is_ok());
        let err = limit
            .bind(&get("/?limit=500"), &no_params(), &JsonConsumer, "limit", &mut slot)
            .unwrap_err();
        assert_eq!(err.violations().len(), 1);
    }

    #[test]
    fn test_schema_refs_resolve_against_document() {
        let document = json!({
            "definitions": {
                "Pet": { "type": "object", "required": ["name"] }
            }
        });
        let param = ParameterDefinition::body("pet", json!({ "$ref": "#/definitions/Pet" }));
        let pet = FieldBinder::new(
            Arc::new(param),
            Some(&document),
            Arc::new(FormatRegistry::default()),
        )
        .unwrap();

        assert!(pet.validate(&json!({ "name": "Rex" }), "pet").is_ok());
        assert!(pet.validate(&json!({}), "pet").is_err());
    }

    #[test]
    fn test_invalid_schema_fails_construction() {
        let param = ParameterDefinition::body("pet", json!({ "type": "string", "pattern": "(" }));
        let result = FieldBinder::new(Arc::new(param), None, Arc::new(FormatRegistry::default()));
        assert!(matches!(result, Err(crate::Error::Schema { .. })));
    }

    #[test]
    fn test_slot_type_mismatch_is_internal() {
        let name = binder(ParameterDefinition::query("name"));
        let mut slot = 0_u8;
        let err = name
            .bind(&get("/?name=rex"), &no_params(), &JsonConsumer, "name", &mut slot)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn test_out_of_range_for_field_type_is_conversion_error() {
        let size = binder(ParameterDefinition::query("size").typed(SimpleSchema::integer()));
        let mut slot = 0_u8;
        let err = size
            .bind(&get("/?size=300"), &no_params(), &JsonConsumer, "size", &mut slot)
            .unwrap_err();
        assert_eq!(
            err,
            ParamError::InvalidType {
                name: "size".into(),
                location: "query",
                expected: "integer".into(),
                value: "300".into(),
            }
        );
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(slot, 0);

        let offset = binder(ParameterDefinition::query("offset").typed(SimpleSchema::integer()));
        let mut slot = 0_u32;
        let err = offset
            .bind(&get("/?offset=-1"), &no_params(), &JsonConsumer, "offset", &mut slot)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Conversion);
    }

    #[test]
    fn test_default_that_does_not_fit_field_is_internal() {
        let size = binder(
            ParameterDefinition::query("size")
                .typed(SimpleSchema::integer())
                .default_value(json!(300)),
        );
        let mut slot = 0_u8;
        let err = size
            .bind(&get("/"), &no_params(), &JsonConsumer, "size", &mut slot)
            .unwrap_err();
        assert!(matches!(err, ParamError::Assign { .. }));
    }
}
