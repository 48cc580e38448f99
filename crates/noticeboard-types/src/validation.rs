use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::ValidationErrors;

/// One failed constraint on one input field
///
/// Returned to callers as a list when a payload or filter expression is
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub constraint: String,
    pub value: Value,
    pub param: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<Value>,
        param: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            param: param.into(),
        }
    }
}

/// Flatten `validator` errors into field errors, ordered by field name
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, errs) in errors.field_errors() {
        for err in errs.iter() {
            let value = err.params.get("value").cloned().unwrap_or(Value::Null);
            let mut params: Vec<String> = err
                .params
                .iter()
                .filter(|(name, _)| **name != "value")
                .map(|(name, v)| format!("{}={}", name, v))
                .collect();
            params.sort();

            out.push(FieldError {
                field: field.to_string(),
                constraint: err.code.to_string(),
                value,
                param: params.join(","),
            });
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
