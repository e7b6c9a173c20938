//! Component instances and their declared attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrail_carton::CompactString;

use crate::classes::ClassList;

/// Trait values of one component, as the host editor stores them.
///
/// Values are plain JSON. Numbers and flags are also accepted in their string
/// form, since editor inputs usually report strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<CompactString, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Store `value`, returning the previous one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(CompactString::from(name), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String value. Numbers and booleans are rendered; `null` counts as absent.
    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric value. May be non-finite when given as a string like `"NaN"`.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value. Accepts `true`/`false`, `"true"`/`"false"`, `"1"`/`"0"`
    /// and numbers (non-zero is `true`).
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|n| n != 0.0),
            Value::String(s) => match s.trim() {
                "true" | "1" | "on" => Some(true),
                "false" | "0" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl<'a, V: Into<Value>> FromIterator<(&'a str, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.set(name, value);
        }
        attributes
    }
}

/// One component placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance {
    pub type_name: CompactString,
    /// Assigned on first render and kept for the lifetime of the component.
    pub id: Option<CompactString>,
    pub attributes: Attributes,
    pub classes: ClassList,
}

impl ComponentInstance {
    pub fn new(type_name: impl Into<CompactString>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
            attributes: Attributes::new(),
            classes: ClassList::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn with_id(mut self, id: impl Into<CompactString>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_strings() {
        let attrs: Attributes = [("a", json!(250)), ("b", json!(" 1.5 ")), ("c", json!("NaN"))]
            .into_iter()
            .collect();
        assert_eq!(attrs.number("a"), Some(250.0));
        assert_eq!(attrs.number("b"), Some(1.5));
        assert!(attrs.number("c").is_some_and(f64::is_nan));
        assert_eq!(attrs.number("missing"), None);
    }

    #[test]
    fn test_flag_forms() {
        let attrs: Attributes = [
            ("a", json!(true)),
            ("b", json!("false")),
            ("c", json!(1)),
            ("d", json!("maybe")),
        ]
        .into_iter()
        .collect();
        assert_eq!(attrs.flag("a"), Some(true));
        assert_eq!(attrs.flag("b"), Some(false));
        assert_eq!(attrs.flag("c"), Some(true));
        assert_eq!(attrs.flag("d"), None);
    }

    #[test]
    fn test_attributes_serialize_as_map() {
        let attrs: Attributes = [("interval", json!(3000)), ("loop", json!(false))]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_string(&attrs).unwrap(),
            r#"{"interval":3000,"loop":false}"#
        );
    }
}
