use crate::param::Location;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::Request;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Boxed error returned by a [`Consumer`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lookup of path parameters extracted by the router.
pub trait RouteParams {
    fn get(&self, name: &str) -> Option<&str>;
}

impl RouteParams for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }
}

impl RouteParams for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        BTreeMap::get(self, name).map(String::as_str)
    }
}

impl RouteParams for [(&str, &str)] {
    fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

/// Decodes a request body according to its declared content type.
///
/// Any `Fn(Option<&str>, &[u8]) -> Result<Value, BoxError>` closure is a consumer.
pub trait Consumer: Send + Sync {
    fn consume(&self, content_type: Option<&str>, body: &[u8]) -> Result<Value, BoxError>;
}

impl<F> Consumer for F
where
    F: Fn(Option<&str>, &[u8]) -> Result<Value, BoxError> + Send + Sync,
{
    fn consume(&self, content_type: Option<&str>, body: &[u8]) -> Result<Value, BoxError> {
        self(content_type, body)
    }
}

/// Consumer for `application/json` and `+json` bodies.
///
/// A body without a content type is read as JSON; any other media type is
/// rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConsumer;

impl Consumer for JsonConsumer {
    fn consume(&self, content_type: Option<&str>, body: &[u8]) -> Result<Value, BoxError> {
        match content_type {
            Some(media_type)
                if media_type != "application/json" && !media_type.ends_with("+json") =>
            {
                Err(format!("unsupported media type '{media_type}'").into())
            }
            _ => Ok(serde_json::from_slice(body)?),
        }
    }
}

/// Raw, unconverted value of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Absent,
    /// Query, path, header and form values; more than one for repeated keys
    Strings(Vec<String>),
    /// A body already decoded by the consumer
    Decoded(Value),
}

impl RawValue {
    /// Absent, or only empty strings.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Absent => true,
            RawValue::Strings(values) => values.iter().all(String::is_empty),
            RawValue::Decoded(_) => false,
        }
    }

    fn from_strings(values: Vec<String>) -> Self {
        if values.is_empty() {
            RawValue::Absent
        } else {
            RawValue::Strings(values)
        }
    }
}

/// Media type of the request without parameters, lowercased.
pub fn content_type(request: &Request<Bytes>) -> Option<String> {
    let header = request.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let media_type = header.split(';').next().unwrap_or_default().trim();
    Some(media_type.to_ascii_lowercase())
}

/// Reads the raw value of parameter `name` from its location.
///
/// `Err` carries a reason the request content could not be read at all.
pub fn extract(
    location: Location,
    name: &str,
    request: &Request<Bytes>,
    route_params: &(impl RouteParams + ?Sized),
    consumer: &dyn Consumer,
) -> Result<RawValue, String> {
    match location {
        Location::Query => Ok(RawValue::from_strings(
            request
                .uri()
                .query()
                .map(|query| pairs_named(query.as_bytes(), name))
                .unwrap_or_default(),
        )),
        Location::Path => Ok(route_params
            .get(name)
            .map_or(RawValue::Absent, |value| {
                RawValue::Strings(vec![value.to_owned()])
            })),
        Location::Header => {
            let values = request
                .headers()
                .get_all(name)
                .iter()
                .map(|value| {
                    value
                        .to_str()
                        .map(str::to_owned)
                        .map_err(|e| format!("header is not visible ASCII: {e}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RawValue::from_strings(values))
        }
        Location::Form => match content_type(request).as_deref() {
            Some("application/x-www-form-urlencoded") | None => Ok(RawValue::from_strings(
                pairs_named(request.body(), name),
            )),
            Some(other) => Err(format!("unsupported form content type '{other}'")),
        },
        Location::Body => {
            if request.body().is_empty() {
                return Ok(RawValue::Absent);
            }
            let content_type = content_type(request);
            consumer
                .consume(content_type.as_deref(), request.body())
                .map(RawValue::Decoded)
                .map_err(|e| e.to_string())
        }
    }
}

fn pairs_named(input: &[u8], name: &str) -> Vec<String> {
    url::form_urlencoded::parse(input)
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .collect()
}
