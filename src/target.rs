use crate::param::{ParameterDefinition, PrimitiveKind};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A writable place a converted parameter value ends up in.
///
/// Implemented for every `DeserializeOwned` type: the converted JSON value is
/// deserialized into the slot's own type, so a `u16` field rejects `70000`
/// and an `Option<T>` field accepts a bound `T`.
pub trait Slot {
    fn assign(&mut self, value: Value) -> Result<(), serde_json::Error>;
}

impl<T: DeserializeOwned> Slot for T {
    fn assign(&mut self, value: Value) -> Result<(), serde_json::Error> {
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

/// A structured record whose fields can be looked up by parameter field name.
///
/// Usually generated with [`bindable!`](crate::bindable).
pub trait Bindable {
    fn slot(&mut self, field: &str) -> Option<&mut dyn Slot>;
}

/// Implements [`Bindable`] for a struct by listing the fields parameters bind into.
///
/// ```
/// use http_param_bind::{bindable, Bindable};
///
/// #[derive(Default)]
/// struct ListPets {
///     limit: Option<i32>,
///     tags: Vec<String>,
/// }
///
/// bindable!(ListPets { limit, tags });
///
/// let mut params = ListPets::default();
/// assert!(params.slot("limit").is_some());
/// assert!(params.slot("unknown").is_none());
/// ```
#[macro_export]
macro_rules! bindable {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Bindable for $ty {
            fn slot(&mut self, field: &str) -> ::std::option::Option<&mut dyn $crate::Slot> {
                match field {
                    $(stringify!($field) => ::std::option::Option::Some(&mut self.$field as &mut dyn $crate::Slot),)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };
}

/// Where a bind writes its results.
pub enum Destination<'a> {
    /// Fields are resolved through [`Bindable::slot`] by field name
    Record(&'a mut dyn Bindable),
    /// Values are inserted under the parameter's wire name
    Map(&'a mut Map<String, Value>),
}

impl<'a> From<&'a mut Map<String, Value>> for Destination<'a> {
    fn from(map: &'a mut Map<String, Value>) -> Self {
        Destination::Map(map)
    }
}

/// Shape a value bound into an untyped map destination must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTarget {
    Scalar,
    Sequence,
    Mapping,
}

impl DecodeTarget {
    /// Primitive arrays are sequences, other primitives scalars. Parameters
    /// described only by a schema are sequences when the schema is an array
    /// and mappings otherwise.
    pub fn infer(param: &ParameterDefinition) -> Self {
        match param.simple.kind {
            Some(PrimitiveKind::Array) => DecodeTarget::Sequence,
            Some(_) => DecodeTarget::Scalar,
            None if param.schema_is_array() => DecodeTarget::Sequence,
            None => DecodeTarget::Mapping,
        }
    }

    pub fn empty_value(self) -> Value {
        match self {
            DecodeTarget::Scalar => Value::Null,
            DecodeTarget::Sequence => Value::Array(Vec::new()),
            DecodeTarget::Mapping => Value::Object(Map::new()),
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            DecodeTarget::Scalar => true,
            DecodeTarget::Sequence => value.is_array(),
            DecodeTarget::Mapping => value.is_object(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecodeTarget::Scalar => "scalar",
            DecodeTarget::Sequence => "array",
            DecodeTarget::Mapping => "object",
        }
    }
}
