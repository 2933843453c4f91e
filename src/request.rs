use crate::error::{CompositeError, ParamError};
use crate::field::{Binding, FieldBinder};
use crate::format::FormatRegistry;
use crate::param::ParameterDefinition;
use crate::source::{Consumer, RouteParams};
use crate::target::Destination;
use bytes::Bytes;
use http::Request;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Binds and validates every parameter of a request into one destination.
///
/// `RequestBinder` owns one [`FieldBinder`] per parameter, keyed by the
/// parameter's field name (the name of the record field it binds into). The
/// wire name, used on the request and as the key of map destinations, is the
/// definition's `name`.
///
/// Binding never stops at the first failure: every parameter is attempted and
/// all failures come back together as one [`CompositeError`], ordered by field
/// name.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http_param_bind::{bindable, Destination, JsonConsumer, ParameterDefinition, RequestBinder, SimpleSchema};
/// use std::collections::HashMap;
///
/// #[derive(Default)]
/// struct GetPet {
///     pet_id: i64,
///     verbose: Option<bool>,
/// }
///
/// bindable!(GetPet { pet_id, verbose });
///
/// let binder = RequestBinder::new([
///     ("pet_id", ParameterDefinition::path("petId").typed(SimpleSchema::integer())),
///     ("verbose", ParameterDefinition::query("verbose").typed(SimpleSchema::boolean())),
/// ])?;
///
/// let request = http::Request::get("/pets/12?verbose=true").body(Bytes::new())?;
/// let route = HashMap::from([("petId".to_owned(), "12".to_owned())]);
///
/// let mut params = GetPet::default();
/// binder.bind(&request, &route, &JsonConsumer, Destination::Record(&mut params))?;
/// assert_eq!(params.pet_id, 12);
/// assert_eq!(params.verbose, Some(true));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct RequestBinder {
    binders: BTreeMap<String, FieldBinder>,
    document: Option<Arc<Value>>,
    formats: Arc<FormatRegistry>,
}

impl RequestBinder {
    /// Creates a binder for `parameters`, given as `(field name, definition)`
    /// pairs, with the default format registry and no API document.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter schema fails to compile.
    pub fn new<I, K>(parameters: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (K, ParameterDefinition)>,
        K: Into<String>,
    {
        Self::with_document(parameters, None, Arc::new(FormatRegistry::default()))
    }

    /// Creates a binder sharing an API document and a format registry.
    ///
    /// The document's `definitions` resolve `$ref`s inside parameter schemas.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter schema fails to compile.
    pub fn with_document<I, K>(
        parameters: I,
        document: Option<Arc<Value>>,
        formats: Arc<FormatRegistry>,
    ) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (K, ParameterDefinition)>,
        K: Into<String>,
    {
        let binders = parameters
            .into_iter()
            .map(|(field, param)| {
                let field: String = field.into();
                let binder = FieldBinder::new(
                    Arc::new(param),
                    document.as_deref(),
                    Arc::clone(&formats),
                )?;
                Ok((field, binder))
            })
            .collect::<crate::Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            binders,
            document,
            formats,
        })
    }

    /// Parameter definitions keyed by field name.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &ParameterDefinition)> {
        self.binders
            .iter()
            .map(|(field, binder)| (field.as_str(), binder.param()))
    }

    pub fn field_binder(&self, field: &str) -> Option<&FieldBinder> {
        self.binders.get(field)
    }

    pub fn document(&self) -> Option<&Value> {
        self.document.as_deref()
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn len(&self) -> usize {
        self.binders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    /// Binds every parameter of `request` into `destination`.
    ///
    /// Record destinations receive each value through the field named like
    /// the parameter's field name; a missing field is reported as an internal
    /// error for that parameter. Map destinations receive each bound value
    /// under the parameter's wire name; absent optional parameters are not
    /// inserted.
    ///
    /// Values bound before a later parameter fails stay in the destination.
    ///
    /// # Errors
    ///
    /// Returns a [`CompositeError`] holding one entry per failed parameter.
    pub fn bind<'d>(
        &self,
        request: &Request<Bytes>,
        route_params: &(impl RouteParams + ?Sized),
        consumer: &dyn Consumer,
        destination: impl Into<Destination<'d>>,
    ) -> Result<(), CompositeError> {
        let mut destination = destination.into();
        let mut errors: Vec<ParamError> = Vec::new();

        for (field, binder) in &self.binders {
            let result = match &mut destination {
                Destination::Record(record) => match record.slot(field) {
                    Some(slot) => binder
                        .bind(request, route_params, consumer, field, slot)
                        .map(drop),
                    None => {
                        tracing::warn!(parameter = %field, "parameter has no matching field in destination");
                        Err(ParamError::UnknownField {
                            name: field.clone(),
                        })
                    }
                },
                Destination::Map(map) => {
                    let name = &binder.param().name;
                    let target = binder.decode_target();
                    let mut scratch = target.empty_value();
                    match binder.bind(request, route_params, consumer, name, &mut scratch) {
                        Ok(Binding::Bound(_)) if !target.accepts(&scratch) => {
                            Err(ParamError::Decode {
                                name: name.clone(),
                                location: binder.param().location.as_str(),
                                reason: format!("expected {} value", target.as_str()),
                            })
                        }
                        Ok(Binding::Bound(_)) => {
                            map.insert(name.clone(), scratch);
                            Ok(())
                        }
                        Ok(Binding::Absent) => Ok(()),
                        Err(e) => Err(e),
                    }
                }
            };

            if let Err(e) = result {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                failed = errors.len(),
                parameters = self.binders.len(),
                "request binding failed"
            );
            Err(CompositeError::new(errors))
        }
    }
}
