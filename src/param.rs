use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Location {
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "header")]
    Header,
    #[serde(rename = "formData", alias = "form")]
    Form,
    #[serde(rename = "body")]
    Body,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Query => "query",
            Location::Path => "path",
            Location::Header => "header",
            Location::Form => "formData",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive type of a non-body parameter or array item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Array => "array",
        }
    }
}

/// How array items are packed into a single raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    /// `a,b,c`
    #[default]
    Csv,
    /// `a b c`
    Ssv,
    /// tab separated
    Tsv,
    /// `a|b|c`
    Pipes,
    /// one raw value per item, e.g. `?tag=a&tag=b`
    Multi,
}

impl CollectionFormat {
    pub fn separator(self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }
}

/// Declared type of a parameter that is not described by a full schema.
///
/// `kind` is `None` for body parameters, whose shape comes from their schema.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSchema {
    #[serde(rename = "type", default)]
    pub kind: Option<PrimitiveKind>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub items: Option<Box<SimpleSchema>>,
    #[serde(default)]
    pub collection_format: CollectionFormat,
}

impl SimpleSchema {
    fn of(kind: PrimitiveKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        Self::of(PrimitiveKind::Integer)
    }

    pub fn number() -> Self {
        Self::of(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(PrimitiveKind::Boolean)
    }

    pub fn array(items: SimpleSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(PrimitiveKind::Array)
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn collection_format(mut self, collection_format: CollectionFormat) -> Self {
        self.collection_format = collection_format;
        self
    }

    /// Human readable type name used in conversion errors, e.g. `integer (int32)`.
    pub fn type_name(&self) -> String {
        let kind = self.kind.map_or("string", PrimitiveKind::as_str);
        match &self.format {
            Some(format) => format!("{kind} ({format})"),
            None => kind.to_owned(),
        }
    }
}

/// Declarative description of one request parameter.
///
/// Deserializes from a Swagger 2.0 parameter object:
///
/// ```
/// use http_param_bind::{Location, ParameterDefinition};
///
/// let param: ParameterDefinition = serde_json::from_value(serde_json::json!({
///     "name": "limit",
///     "in": "query",
///     "type": "integer",
///     "format": "int32",
///     "default": 20
/// }))?;
/// assert_eq!(param.location, Location::Query);
/// assert!(!param.required);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Wire name: the query key, header name, path segment name or form field
    pub name: String,
    #[serde(rename = "in")]
    pub location: Location,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub allow_empty_value: bool,
    #[serde(flatten)]
    pub simple: SimpleSchema,
    /// JSON Schema the converted value is validated against
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == Location::Path,
            allow_empty_value: false,
            simple: SimpleSchema::string(),
            schema: None,
            default: None,
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, Location::Query)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, Location::Path)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, Location::Header)
    }

    pub fn form(name: impl Into<String>) -> Self {
        Self::new(name, Location::Form)
    }

    /// A body parameter described by `schema`.
    pub fn body(name: impl Into<String>, schema: Value) -> Self {
        Self {
            simple: SimpleSchema::default(),
            schema: Some(schema),
            ..Self::new(name, Location::Body)
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn allow_empty_value(mut self, allow: bool) -> Self {
        self.allow_empty_value = allow;
        self
    }

    pub fn typed(mut self, simple: SimpleSchema) -> Self {
        self.simple = simple;
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// True when the schema's `type` is, or lists, `"array"`.
    pub fn schema_is_array(&self) -> bool {
        match self.schema.as_ref().and_then(|s| s.get("type")) {
            Some(Value::String(t)) => t == "array",
            Some(Value::Array(types)) => types.iter().any(|t| t == "array"),
            _ => false,
        }
    }
}
