//! Sparse generation parameters.
//!
//! Callers often pass parameters through from loosely typed sources (form fields, stored app
//! configuration). Each knob is kept only when it is present with exactly the expected JSON
//! type; anything else is dropped without an error.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Keys that switch on the vendor web-search plugin.
const WEB_SEARCH_KEYS: &[&str] = &["enable_web_search", "plugin_web_search"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub enable_web_search: bool,
}

impl GenerationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn web_search(mut self, enable: bool) -> Self {
        self.enable_web_search = enable;
        self
    }

    /// Extract the supported knobs from an arbitrary JSON value.
    ///
    /// - `max_tokens` must be a non-negative JSON integer that fits in `u32`
    /// - `temperature` and `top_p` must be JSON floats (`1` is an integer and is dropped, `1.0` is
    ///   kept)
    /// - `enable_web_search` / `plugin_web_search` must be a JSON boolean
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Null => Self::default(),
            other => {
                debug!(
                    kind = json_kind(other),
                    "generation parameters are not an object; ignoring"
                );
                Self::default()
            }
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut params = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "max_tokens" => {
                    params.max_tokens = value.as_u64().and_then(|v| u32::try_from(v).ok());
                    if params.max_tokens.is_none() {
                        debug!(
                            key = "max_tokens",
                            kind = json_kind(value),
                            "dropping mistyped parameter"
                        );
                    }
                }
                "temperature" => {
                    params.temperature = float_only(value);
                    if params.temperature.is_none() {
                        debug!(
                            key = "temperature",
                            kind = json_kind(value),
                            "dropping mistyped parameter"
                        );
                    }
                }
                "top_p" => {
                    params.top_p = float_only(value);
                    if params.top_p.is_none() {
                        debug!(
                            key = "top_p",
                            kind = json_kind(value),
                            "dropping mistyped parameter"
                        );
                    }
                }
                k if WEB_SEARCH_KEYS.contains(&k) => {
                    if let Value::Bool(b) = value {
                        params.enable_web_search |= *b;
                    }
                }
                other => debug!(key = other, "dropping unsupported parameter"),
            }
        }

        params
    }
}

fn float_only(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
