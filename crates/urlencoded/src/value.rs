//! Decoded body representation.
//!
//! A decoded `application/x-www-form-urlencoded` payload is a [`FormBody`]: a mapping
//! from string keys to [`FormValue`]s. The simple decoder only ever produces
//! [`FormValue::String`] and arrays of strings, the extended decoder may also
//! produce nested [`FormValue::Map`]s and arrays of maps.
//!
//! The decoded body lives in the request extensions, next to a [`BodyParsed`]
//! marker that tells later body-decoding stages the payload was already consumed.

use http::Request;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::collections::btree_map;

pub type FormMap = BTreeMap<String, FormValue>;

/// Deepest [`FormBody`] that [`FormBody::deserialize`] accepts.
pub const DESERIALIZE_DEPTH_LIMIT: usize = 128;

/// A single decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    String(String),
    Array(Vec<FormValue>),
    Map(FormMap),
}

impl FormValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FormMap> {
        match self {
            FormValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    pub fn is_nested(&self) -> bool {
        match self {
            FormValue::String(_) => false,
            FormValue::Array(values) => values.iter().any(|v| !matches!(v, FormValue::String(_))),
            FormValue::Map(_) => true,
        }
    }

    /// Levels of arrays and maps below this value, `0` for a string.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];

        while let Some((value, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match value {
                FormValue::String(_) => {}
                FormValue::Array(values) => stack.extend(values.iter().map(|v| (v, depth + 1))),
                FormValue::Map(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
            }
        }

        deepest
    }

    fn detach_children(&mut self, out: &mut Vec<FormValue>) {
        let nested = |value: &FormValue| !matches!(value, FormValue::String(_));
        match self {
            FormValue::String(_) => {}
            FormValue::Array(values) => out.extend(values.drain(..).filter(nested)),
            FormValue::Map(map) => out.extend(std::mem::take(map).into_values().filter(nested)),
        }
    }
}

// Extended bodies may nest one level per `[...]` of a key, without bound. Children
// are moved to a heap work-list before they drop, so each value drops shallow.
impl Drop for FormValue {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);

        while let Some(mut value) = pending.pop() {
            value.detach_children(&mut pending);
        }
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::String(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::String(value.to_owned())
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(values: Vec<FormValue>) -> Self {
        FormValue::Array(values)
    }
}

impl From<FormMap> for FormValue {
    fn from(map: FormMap) -> Self {
        FormValue::Map(map)
    }
}

/// Recurses once per nesting level, like every `serde_json::Value` operation.
impl From<FormValue> for serde_json::Value {
    fn from(mut value: FormValue) -> Self {
        match &mut value {
            FormValue::String(s) => serde_json::Value::String(std::mem::take(s)),
            FormValue::Array(values) => serde_json::Value::Array(values.drain(..).map(Into::into).collect()),
            FormValue::Map(map) => {
                serde_json::Value::Object(std::mem::take(map).into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// The decoded body attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormBody {
    inner: FormMap,
}

impl FormBody {
    pub fn new(inner: FormMap) -> Self {
        Self { inner }
    }

    /// Returns the decoded body stored on `req`, if a body decoding stage ran.
    pub fn from_request<B>(req: &Request<B>) -> Option<&FormBody> {
        req.extensions().get::<FormBody>()
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FormValue> {
        self.inner.iter()
    }

    pub fn as_map(&self) -> &FormMap {
        &self.inner
    }

    pub fn into_inner(self) -> FormMap {
        self.inner
    }

    /// Deserializes the decoded body into `T`.
    ///
    /// All leaf values are strings, so numeric fields of `T` need a
    /// string-accepting deserializer. Bodies nested deeper than
    /// [`DESERIALIZE_DEPTH_LIMIT`] levels are rejected, the same bound `serde_json`
    /// puts on JSON text.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let depth = self.inner.values().map(FormValue::depth).max().map_or(0, |depth| depth + 1);
        if depth > DESERIALIZE_DEPTH_LIMIT {
            return Err(serde::de::Error::custom(format_args!(
                "form nested {depth} levels deep, at most {DESERIALIZE_DEPTH_LIMIT} can be deserialized"
            )));
        }

        serde_json::from_value(self.clone().into())
    }
}

impl From<FormMap> for FormBody {
    fn from(inner: FormMap) -> Self {
        Self::new(inner)
    }
}

impl From<FormBody> for serde_json::Value {
    fn from(body: FormBody) -> Self {
        FormValue::Map(body.inner).into()
    }
}

impl<'a> IntoIterator for &'a FormBody {
    type Item = (&'a String, &'a FormValue);
    type IntoIter = btree_map::Iter<'a, String, FormValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Marker inserted into the request extensions once a body has been decoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BodyParsed;
