//! Attribute schemas for component kinds.

use super::attributes::{group_of, ResolvedAttributes};
use super::traits::WidgetError;
use crate::value::Value;

/// Check run on the complete attribute table before mount and configure.
pub type Validator = fn(&ResolvedAttributes) -> Result<(), WidgetError>;

/// Accepted keys, defaults and capabilities of one component kind.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: String,
    keys: Vec<&'static str>,
    groups: Vec<&'static str>,
    defaults: Vec<(&'static str, Value)>,
    two_way: Vec<&'static str>,
    text: Vec<&'static str>,
    children: bool,
    validator: Option<Validator>,
}

impl Schema {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            keys: Vec::new(),
            groups: Vec::new(),
            defaults: Vec::new(),
            two_way: Vec::new(),
            text: Vec::new(),
            children: false,
            validator: None,
        }
    }

    pub fn keys(mut self, keys: &[&'static str]) -> Self {
        self.keys.extend_from_slice(keys);
        self
    }

    /// Accept every `name:...` key.
    pub fn groups(mut self, groups: &[&'static str]) -> Self {
        self.groups.extend_from_slice(groups);
        self
    }

    /// Accept `key` and fill it with `value` when the markup omits it.
    pub fn default(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self.defaults.push((key, value.into()));
        self
    }

    /// Mark `key` as written back by the backend (user input).
    pub fn two_way(mut self, key: &'static str) -> Self {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self.two_way.push(key);
        self
    }

    /// Mark `key` as displayed text: numbers and booleans are sent as strings.
    pub fn text(mut self, key: &'static str) -> Self {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self.text.push(key);
        self
    }

    pub fn with_children(mut self) -> Self {
        self.children = true;
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn accepts_children(&self) -> bool {
        self.children
    }

    pub fn is_two_way(&self, key: &str) -> bool {
        self.two_way.contains(&key)
    }

    pub fn accepts(&self, key: &str) -> bool {
        match group_of(key) {
            Some(group) => self.groups.contains(&group),
            None => self.keys.contains(&key),
        }
    }

    /// Keys of `attributes` the schema does not accept.
    pub fn unknown_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        keys.into_iter().filter(|k| !self.accepts(k)).collect()
    }

    /// Fill defaults for keys the table does not set.
    pub fn apply_defaults(&self, attributes: &mut ResolvedAttributes) {
        for (key, value) in &self.defaults {
            if !attributes.contains(key) {
                attributes.insert(*key, value.clone());
            }
        }
    }

    /// Convert scalar values of text keys to their display string.
    pub fn coerce_text(&self, attributes: &mut ResolvedAttributes) {
        for key in &self.text {
            if let Some(value @ (Value::Int(_) | Value::Decimal(_) | Value::Bool(_))) =
                attributes.get(key)
            {
                let text = value.to_string();
                attributes.insert(*key, text);
            }
        }
    }

    pub fn validate(&self, attributes: &ResolvedAttributes) -> Result<(), WidgetError> {
        attributes.position()?;
        attributes.weights()?;
        match self.validator {
            Some(validator) => validator(attributes),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new("label")
            .keys(&["font"])
            .default("text", "")
            .two_way("value")
            .groups(&["pos"])
    }

    #[test]
    fn test_accepts_plain_and_grouped_keys() {
        let s = schema();
        assert!(s.accepts("text"));
        assert!(s.accepts("value"));
        assert!(s.accepts("pos:grid"));
        assert!(!s.accepts("bind:1"));
        assert_eq!(s.unknown_keys(["text", "colour", "bind:x"]), ["colour", "bind:x"]);
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let s = schema();
        let mut attrs = ResolvedAttributes::new().with("font", "mono");
        s.apply_defaults(&mut attrs);
        assert_eq!(attrs.get("text"), Some(&Value::from("")));

        let mut set = ResolvedAttributes::new().with("text", "kept");
        s.apply_defaults(&mut set);
        assert_eq!(set.get("text"), Some(&Value::from("kept")));
    }

    #[test]
    fn test_text_keys_are_sent_as_strings() {
        let s = Schema::new("label").text("text").keys(&["padx"]);
        let mut attrs = ResolvedAttributes::new().with("text", 0).with("padx", 4);
        s.coerce_text(&mut attrs);
        assert_eq!(attrs.get("text"), Some(&Value::from("0")));
        assert_eq!(attrs.get("padx"), Some(&Value::Int(4)));

        let mut flag = ResolvedAttributes::new().with("text", true);
        s.coerce_text(&mut flag);
        assert_eq!(flag.get("text"), Some(&Value::from("True")));

        let mut none = ResolvedAttributes::new().with("text", Value::None);
        s.coerce_text(&mut none);
        assert_eq!(none.get("text"), Some(&Value::None));
    }

    #[test]
    fn test_validate_checks_position() {
        let s = schema();
        let bad = ResolvedAttributes::new().with("pos:grid", "x");
        assert!(s.validate(&bad).is_err());
        assert!(s.is_two_way("value"));
        assert!(!s.accepts_children());
    }
}
