use crate::core::accessors::value_to_string;
use crate::core::errors::ExchangeError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A request parameter is either a single scalar or a list of scalars.
///
/// Lists are encoded with bracket notation on the query string
/// (`key[]=a&key[]=b`) and as JSON arrays in bodies and signed payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl ParamValue {
    pub fn as_scalar_string(&self) -> Option<String> {
        match self {
            Self::Scalar(value) => value_to_string(value),
            Self::List(_) => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::List(values) => Value::Array(values.clone()),
        }
    }
}

/// Ordered request parameters; keys are kept sorted so every encoding is deterministic
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, ParamValue>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_opt<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    #[must_use]
    pub fn with_list<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.0.insert(
            key.to_string(),
            ParamValue::List(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0
            .insert(key.to_string(), ParamValue::Scalar(value.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String, ExchangeError> {
        serde_json::to_string(&self.to_json_map())
            .map_err(|e| ExchangeError::SerializationError(format!("request params: {}", e)))
    }
}

/// Substitute `{name}` placeholders in `template` with the matching parameter,
/// removing each consumed key from `params`.
pub fn implode_path(template: &str, params: &mut RequestParams) -> Result<String, ExchangeError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = params
            .remove(name)
            .and_then(|v| v.as_scalar_string())
            .ok_or_else(|| {
                ExchangeError::ArgumentsRequired(format!(
                    "path '{}' requires a scalar '{}' parameter",
                    template, name
                ))
            })?;
        path.push_str(&rest[..start]);
        path.push_str(&value);
        rest = &rest[start + len + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

/// URL-encode parameters: scalars as `key=value`, then lists as `key[]=v`, joined by `&`
pub fn encode_query(params: &RequestParams) -> String {
    let mut scalars = Vec::new();
    let mut lists = Vec::new();

    for (key, value) in params.iter() {
        let key = urlencoding::encode(key);
        match value {
            ParamValue::Scalar(scalar) => {
                let raw = value_to_string(scalar).unwrap_or_default();
                scalars.push(format!("{}={}", key, urlencoding::encode(&raw)));
            }
            ParamValue::List(items) => {
                for item in items {
                    let raw = value_to_string(item).unwrap_or_default();
                    lists.push(format!("{}[]={}", key, urlencoding::encode(&raw)));
                }
            }
        }
    }

    scalars
        .into_iter()
        .chain(lists)
        .collect::<Vec<_>>()
        .join("&")
}
