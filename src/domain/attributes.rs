use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stored attribute. The store has no null type, so absence is expressed
/// by leaving the attribute out of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    Text(String),
    #[serde(rename = "N")]
    Number(f64),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Number(_) => None,
        }
    }

    /// Whole finite numbers only
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    /// NaN or infinite; these have no JSON form and would be stored as null
    pub fn is_non_finite(&self) -> bool {
        matches!(self, AttributeValue::Number(n) if !n.is_finite())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// Drop every attribute holding NaN or an infinity
pub fn without_non_finite(mut attributes: AttributeMap) -> AttributeMap {
    attributes.retain(|_, value| !value.is_non_finite());
    attributes
}
