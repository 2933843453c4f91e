use crate::format::{FormatError, FormatRegistry};
use crate::param::{CollectionFormat, PrimitiveKind, SimpleSchema};
use serde_json::{Number, Value};

/// Why a raw string could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Not a value of the declared type
    Type { expected: String, value: String },
    /// Rejected by the format registry
    Format { format: String, reason: String },
}

/// Converts the raw string values of a non-body parameter.
///
/// Scalars use the first value. Arrays use every value for the `multi`
/// collection format, otherwise the first value split on the format's
/// separator; each item is converted with the `items` schema.
///
/// # Examples
///
/// ```
/// use http_param_bind::convert::convert_strings;
/// use http_param_bind::{CollectionFormat, FormatRegistry, SimpleSchema};
///
/// let schema = SimpleSchema::array(SimpleSchema::integer()).collection_format(CollectionFormat::Pipes);
/// let value = convert_strings(&["1|2|3".to_owned()], &schema, &FormatRegistry::default()).unwrap();
/// assert_eq!(value, serde_json::json!([1, 2, 3]));
/// ```
pub fn convert_strings(
    values: &[String],
    schema: &SimpleSchema,
    formats: &FormatRegistry,
) -> Result<Value, ConvertError> {
    match schema.kind {
        Some(PrimitiveKind::Array) => {
            let items: Vec<&str> = match schema.collection_format {
                CollectionFormat::Multi => values.iter().map(String::as_str).collect(),
                format => split(values.first().map_or("", String::as_str), format),
            };
            convert_items(&items, schema, formats)
        }
        _ => convert_scalar(values.first().map_or("", String::as_str), schema, formats),
    }
}

fn split(raw: &str, format: CollectionFormat) -> Vec<&str> {
    if raw.is_empty() {
        return Vec::new();
    }
    match format.separator() {
        Some(separator) => raw.split(separator).collect(),
        None => vec![raw],
    }
}

fn convert_items(
    items: &[&str],
    schema: &SimpleSchema,
    formats: &FormatRegistry,
) -> Result<Value, ConvertError> {
    let item_schema = schema.items.as_deref().cloned().unwrap_or_else(SimpleSchema::string);
    items
        .iter()
        .map(|item| match item_schema.kind {
            // nested arrays are packed with their own separator
            Some(PrimitiveKind::Array) => convert_items(
                &split(item, item_schema.collection_format),
                &item_schema,
                formats,
            ),
            _ => convert_scalar(item, &item_schema, formats),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Converts a single raw string by primitive type and format.
pub fn convert_scalar(
    raw: &str,
    schema: &SimpleSchema,
    formats: &FormatRegistry,
) -> Result<Value, ConvertError> {
    let type_error = || ConvertError::Type {
        expected: schema.type_name(),
        value: raw.to_owned(),
    };
    let format = schema.format.as_deref();

    match schema.kind.unwrap_or(PrimitiveKind::String) {
        PrimitiveKind::Integer => {
            let n: i64 = raw.trim().parse().map_err(|_| type_error())?;
            let in_range = match format {
                Some("int32") => i32::try_from(n).is_ok(),
                Some("uint32") => u32::try_from(n).is_ok(),
                _ => true,
            };
            if in_range {
                Ok(Value::from(n))
            } else {
                Err(type_error())
            }
        }
        PrimitiveKind::Number => {
            let n: f64 = raw.trim().parse().map_err(|_| type_error())?;
            if format == Some("float") && n.is_finite() && n.abs() > f64::from(f32::MAX) {
                return Err(type_error());
            }
            Number::from_f64(n).map(Value::Number).ok_or_else(type_error)
        }
        PrimitiveKind::Boolean => parse_bool(raw).map(Value::Bool).ok_or_else(type_error),
        PrimitiveKind::String | PrimitiveKind::Array => match format {
            Some(name) if formats.contains(name) => {
                formats.parse(name, raw).map_err(|e| match e {
                    FormatError::Invalid(reason) | FormatError::Unknown(reason) => {
                        ConvertError::Format {
                            format: name.to_owned(),
                            reason,
                        }
                    }
                })
            }
            _ => Ok(Value::String(raw.to_owned())),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_convert_integer_formats() {
        let formats = FormatRegistry::default();
        let int32 = SimpleSchema::integer().format("int32");
        assert_eq!(convert_scalar("42", &int32, &formats).unwrap(), json!(42));
        assert!(matches!(
            convert_scalar("3000000000", &int32, &formats),
            Err(ConvertError::Type { .. })
        ));
        assert_eq!(
            convert_scalar("3000000000", &SimpleSchema::integer(), &formats).unwrap(),
            json!(3_000_000_000_i64)
        );
        assert!(convert_scalar("4.5", &SimpleSchema::integer(), &formats).is_err());
    }

    #[test]
    fn test_convert_number_and_bool() {
        let formats = FormatRegistry::default();
        assert_eq!(
            convert_scalar("2.5", &SimpleSchema::number(), &formats).unwrap(),
            json!(2.5)
        );
        assert!(convert_scalar("NaN", &SimpleSchema::number(), &formats).is_err());
        assert!(convert_scalar("1e300", &SimpleSchema::number().format("float"), &formats).is_err());
        assert_eq!(
            convert_scalar("Yes", &SimpleSchema::boolean(), &formats).unwrap(),
            json!(true)
        );
        assert_eq!(
            convert_scalar("off", &SimpleSchema::boolean(), &formats).unwrap(),
            json!(false)
        );
        assert!(convert_scalar("maybe", &SimpleSchema::boolean(), &formats).is_err());
    }

    #[test]
    fn test_convert_string_formats() {
        let formats = FormatRegistry::default();
        let date_time = SimpleSchema::string().format("date-time");
        assert_eq!(
            convert_scalar("2024-05-01T10:00:00+02:00", &date_time, &formats).unwrap(),
            json!("2024-05-01T10:00:00+02:00")
        );
        assert!(matches!(
            convert_scalar("yesterday", &date_time, &formats),
            Err(ConvertError::Format { format, .. }) if format == "date-time"
        ));

        // unregistered formats pass through
        let custom = SimpleSchema::string().format("slug");
        assert_eq!(convert_scalar("a-b", &custom, &formats).unwrap(), json!("a-b"));
    }

    #[test]
    fn test_convert_collection_formats() {
        let formats = FormatRegistry::default();
        let csv = SimpleSchema::array(SimpleSchema::string());
        assert_eq!(
            convert_strings(&strings(&["a,b,c"]), &csv, &formats).unwrap(),
            json!(["a", "b", "c"])
        );

        let multi = SimpleSchema::array(SimpleSchema::integer())
            .collection_format(CollectionFormat::Multi);
        assert_eq!(
            convert_strings(&strings(&["1", "2"]), &multi, &formats).unwrap(),
            json!([1, 2])
        );

        let ssv = SimpleSchema::array(SimpleSchema::string()).collection_format(CollectionFormat::Ssv);
        assert_eq!(
            convert_strings(&strings(&["x y"]), &ssv, &formats).unwrap(),
            json!(["x", "y"])
        );

        assert_eq!(convert_strings(&strings(&[""]), &csv, &formats).unwrap(), json!([]));
    }

    #[test]
    fn test_convert_nested_arrays() {
        let formats = FormatRegistry::default();
        let nested = SimpleSchema::array(
            SimpleSchema::array(SimpleSchema::integer()).collection_format(CollectionFormat::Csv),
        )
        .collection_format(CollectionFormat::Pipes);
        assert_eq!(
            convert_strings(&strings(&["1,2|3"]), &nested, &formats).unwrap(),
            json!([[1, 2], [3]])
        );
    }

    #[test]
    fn test_array_item_error_reports_item() {
        let formats = FormatRegistry::default();
        let ints = SimpleSchema::array(SimpleSchema::integer());
        assert_eq!(
            convert_strings(&strings(&["1,x"]), &ints, &formats),
            Err(ConvertError::Type {
                expected: "integer".into(),
                value: "x".into(),
            })
        );
    }
}
