use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("valid email pattern")
});

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("valid hostname pattern")
});

/// Error returned by [`FormatRegistry::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unknown format '{0}'")]
    Unknown(String),

    #[error("{0}")]
    Invalid(String),
}

type Parser = dyn Fn(&str) -> std::result::Result<Value, String> + Send + Sync;

/// Named string-format parsers shared by every binder.
///
/// A parser receives the raw string and returns the value to bind, usually a
/// normalized string, or a reason the input is not of that format.
///
/// ```
/// use http_param_bind::FormatRegistry;
///
/// let mut formats = FormatRegistry::default();
/// formats.register("color", |raw: &str| {
///     if raw.starts_with('#') && raw.len() == 7 {
///         Ok(serde_json::Value::String(raw.to_lowercase()))
///     } else {
///         Err("expected #rrggbb".to_owned())
///     }
/// });
///
/// assert_eq!(formats.parse("color", "#FFAA00").unwrap(), "#ffaa00");
/// assert!(formats.parse("uuid", "nope").is_err());
/// ```
#[derive(Clone)]
pub struct FormatRegistry {
    parsers: HashMap<String, Arc<Parser>>,
}

impl FormatRegistry {
    /// A registry without any format.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registers `parser` under `name`, replacing any previous parser.
    pub fn register<F>(&mut self, name: impl Into<String>, parser: F) -> &mut Self
    where
        F: Fn(&str) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.parsers.insert(name.into(), Arc::new(parser));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    pub fn parse(&self, name: &str, raw: &str) -> std::result::Result<Value, FormatError> {
        let parser = self
            .parsers
            .get(name)
            .ok_or_else(|| FormatError::Unknown(name.to_owned()))?;
        parser(raw).map_err(FormatError::Invalid)
    }
}

impl Default for FormatRegistry {
    /// Registry with the common OpenAPI string formats.
    fn default() -> Self {
        let mut formats = Self::empty();
        formats
            .register("date", |raw| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                    .map_err(|e| e.to_string())
            })
            .register("date-time", |raw| {
                chrono::DateTime::parse_from_rfc3339(raw)
                    .map(|dt| Value::String(dt.to_rfc3339()))
                    .map_err(|e| e.to_string())
            })
            .register("uuid", |raw| {
                uuid::Uuid::parse_str(raw)
                    .map(|id| Value::String(id.hyphenated().to_string()))
                    .map_err(|e| e.to_string())
            })
            .register("email", |raw| matches(&EMAIL, raw, "email address"))
            .register("hostname", |raw| {
                if raw.len() > 253 {
                    return Err("hostname longer than 253 characters".to_owned());
                }
                matches(&HOSTNAME, raw, "hostname")
            })
            .register("ipv4", |raw| {
                raw.parse::<Ipv4Addr>()
                    .map(|ip| Value::String(ip.to_string()))
                    .map_err(|e| e.to_string())
            })
            .register("ipv6", |raw| {
                raw.parse::<Ipv6Addr>()
                    .map(|ip| Value::String(ip.to_string()))
                    .map_err(|e| e.to_string())
            })
            .register("byte", |raw| {
                base64::engine::general_purpose::STANDARD
                    .decode(raw)
                    .map(|_| Value::String(raw.to_owned()))
                    .map_err(|e| e.to_string())
            })
            .register("password", |raw| Ok(Value::String(raw.to_owned())));
        formats
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.parsers.keys().collect();
        names.sort();
        f.debug_struct("FormatRegistry").field("formats", &names).finish()
    }
}

fn matches(pattern: &Regex, raw: &str, what: &str) -> std::result::Result<Value, String> {
    if pattern.is_match(raw) {
        Ok(Value::String(raw.to_owned()))
    } else {
        Err(format!("{raw:?} is not a valid {what}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time_normalizes() {
        let formats = FormatRegistry::default();
        let value = formats.parse("date-time", "2024-05-01T10:00:00Z").unwrap();
        assert_eq!(value, "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_date_rejects_garbage() {
        let formats = FormatRegistry::default();
        assert!(matches!(
            formats.parse("date", "2024-13-01"),
            Err(FormatError::Invalid(_))
        ));
        assert_eq!(formats.parse("date", "2024-02-29").unwrap(), "2024-02-29");
    }

    #[test]
    fn test_uuid_lowercases() {
        let formats = FormatRegistry::default();
        let value = formats
            .parse("uuid", "67E55044-10B1-426F-9247-BB680E5FE0C8")
            .unwrap();
        assert_eq!(value, "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_email_and_hostname() {
        let formats = FormatRegistry::default();
        assert!(formats.parse("email", "someone@example.com").is_ok());
        assert!(formats.parse("email", "someone@").is_err());
        assert!(formats.parse("hostname", "api.example.com").is_ok());
        assert!(formats.parse("hostname", "-bad-.com").is_err());
    }

    #[test]
    fn test_ip_and_byte() {
        let formats = FormatRegistry::default();
        assert!(formats.parse("ipv4", "10.0.0.1").is_ok());
        assert!(formats.parse("ipv4", "10.0.0.256").is_err());
        assert!(formats.parse("ipv6", "::1").is_ok());
        assert!(formats.parse("byte", "aGVsbG8=").is_ok());
        assert!(formats.parse("byte", "not base64!").is_err());
    }

    #[test]
    fn test_unknown_format() {
        let formats = FormatRegistry::empty();
        assert_eq!(
            formats.parse("uuid", "x"),
            Err(FormatError::Unknown("uuid".into()))
        );
        assert!(!formats.contains("uuid"));
    }
}
