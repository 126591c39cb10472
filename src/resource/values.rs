//! Form values: what a create/edit form holds before it becomes a payload

use super::registry::{FieldKind, ResourceDef};
use super::variables::parse_variables;
use serde_json::Value;
use std::collections::BTreeMap;

/// Value of a single form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

/// Field values keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank values for a create form, with schema defaults applied
    pub fn defaults_for(def: &ResourceDef) -> Self {
        let mut values = Self::new();
        for field in &def.fields {
            match field.kind {
                FieldKind::Flag => {
                    let on = field
                        .default
                        .as_ref()
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    values.set_flag(&field.key, on);
                },
                FieldKind::Choice => {
                    let choice = field
                        .default
                        .as_ref()
                        .and_then(Value::as_str)
                        .map(String::from)
                        .or_else(|| field.options.first().cloned())
                        .unwrap_or_default();
                    values.set_text(&field.key, choice);
                },
                _ => {
                    let text = field
                        .default
                        .as_ref()
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    values.set_text(&field.key, text);
                },
            }
        }
        values
    }

    pub fn with_text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_text(key, value);
        self
    }

    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.set_flag(key, value);
        self
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), FieldValue::Text(value.into()));
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), FieldValue::Flag(value));
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.0.get_mut(key)
    }

    /// Raw text of a field, empty when absent or not text
    pub fn text(&self, key: &str) -> &str {
        match self.0.get(key) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Trimmed single-line text
    pub fn line(&self, key: &str) -> String {
        self.text(key).trim().to_string()
    }

    /// Trimmed text, `None` when blank
    pub fn optional_line(&self, key: &str) -> Option<String> {
        Some(self.line(key)).filter(|s| !s.is_empty())
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(FieldValue::Flag(true)))
    }

    /// Parsed placeholder list of a variables field
    pub fn variables(&self, key: &str) -> Vec<String> {
        parse_variables(self.text(key))
    }
}

/// `Some(new)` when it differs from `current`; the building block of partial updates
pub fn changed<T: PartialEq>(current: &T, new: T) -> Option<T> {
    if *current == new {
        None
    } else {
        Some(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{resource_def, ResourceKind};

    #[test]
    fn test_defaults_from_schema() {
        let values = FormValues::defaults_for(resource_def(ResourceKind::NotificationTemplates));
        assert_eq!(values.text("template_type"), "email");
        assert_eq!(values.text("category"), "general");
        assert!(values.flag("is_active"));
        assert!(!values.flag("is_default"));
        assert_eq!(values.text("name"), "");
    }

    #[test]
    fn test_line_and_optional_line() {
        let values = FormValues::new()
            .with_text("title", "  Welcome  ")
            .with_text("description", "   ");
        assert_eq!(values.line("title"), "Welcome");
        assert_eq!(values.optional_line("description"), None);
        assert_eq!(values.optional_line("missing"), None);
    }

    #[test]
    fn test_changed() {
        assert_eq!(changed(&"a".to_string(), "a".to_string()), None);
        assert_eq!(changed(&"a".to_string(), "b".to_string()), Some("b".to_string()));
        assert_eq!(changed(&true, false), Some(false));
    }
}
