//! Declarative description of a widget's settings form.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::CategoryRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number { min: u32 },
    Checkbox,
    Select { options: Vec<SelectOption> },
    /// Filled with the host's categories when the form is served.
    CategoryDropdown { options: Vec<SelectOption> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'static str>,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub value: Value,
}

impl FormField {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind, value: Value) -> Self {
        Self {
            name,
            label,
            group: None,
            kind,
            value,
        }
    }

    pub fn in_group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// Populate every category dropdown with `categories`, in the given order.
    pub fn with_categories(mut self, categories: &[CategoryRecord]) -> Self {
        for field in &mut self.fields {
            if let FieldKind::CategoryDropdown { options } = &mut field.kind {
                *options = categories.iter().map(category_option).collect();
            }
        }
        self
    }
}

fn category_option(category: &CategoryRecord) -> SelectOption {
    SelectOption {
        value: category.id.to_string(),
        label: category.name.clone(),
    }
}

/// Form value of an optional category selection.
pub fn category_value(category_id: Option<Uuid>) -> Value {
    category_id
        .map(|id| Value::String(id.to_string()))
        .unwrap_or(Value::String(String::new()))
}
