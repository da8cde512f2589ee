use serde_json::{Map, Value};

use crate::color::Color;
use crate::error::FeatureError;

/// Display properties of a feature.
///
/// Required accessors fail with [`FeatureError::MissingProperty`] when the key is absent and with
/// [`FeatureError::InvalidProperty`] when the value has a wrong type. No value is ever defaulted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Map<String, Value>);

impl From<Map<String, Value>> for Properties {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl Properties {
    /// Returns the raw value of the property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Returns true if the property is present and is not `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the raw value of a required property.
    pub fn required(&self, key: &str) -> Result<&Value, FeatureError> {
        self.get(key)
            .ok_or_else(|| FeatureError::MissingProperty(key.to_string()))
    }

    /// Returns a required string property.
    pub fn str(&self, key: &str) -> Result<&str, FeatureError> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| invalid(key, "a string"))
    }

    /// Returns an optional string property.
    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, FeatureError> {
        match self.get(key) {
            Some(value) => value.as_str().map(Some).ok_or_else(|| invalid(key, "a string")),
            None => Ok(None),
        }
    }

    /// Returns a required numeric property.
    pub fn f64(&self, key: &str) -> Result<f64, FeatureError> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| invalid(key, "a number"))
    }

    /// Returns an optional numeric property.
    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, FeatureError> {
        match self.get(key) {
            Some(value) => value.as_f64().map(Some).ok_or_else(|| invalid(key, "a number")),
            None => Ok(None),
        }
    }

    /// Returns a required color property.
    pub fn color(&self, key: &str) -> Result<Color, FeatureError> {
        self.str(key)?.parse().map_err(|_| invalid(key, "a color"))
    }

    /// Returns a required `[width, height]` size property.
    pub fn size(&self, key: &str) -> Result<[u32; 2], FeatureError> {
        let value = self.required(key)?;
        let dimensions = value
            .as_array()
            .filter(|array| array.len() == 2)
            .and_then(|array| {
                array
                    .iter()
                    .map(|v| v.as_u64().and_then(|v| u32::try_from(v).ok()))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| invalid(key, "a [width, height] pair"))?;

        Ok([dimensions[0], dimensions[1]])
    }

    /// Returns an optional object property.
    pub fn object(&self, key: &str) -> Result<Option<&Map<String, Value>>, FeatureError> {
        match self.get(key) {
            Some(value) => value
                .as_object()
                .map(Some)
                .ok_or_else(|| invalid(key, "an object")),
            None => Ok(None),
        }
    }

    /// Returns a required property rendered as display text. Strings are taken as is, numbers and
    /// booleans are formatted.
    pub fn text(&self, key: &str) -> Result<String, FeatureError> {
        match self.required(key)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(invalid(key, "a string or a number")),
        }
    }
}

fn invalid(key: &str, expected: &'static str) -> FeatureError {
    FeatureError::InvalidProperty {
        property: key.to_string(),
        expected,
    }
}
