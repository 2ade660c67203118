//! Declarative parameter schemas for tools.
//!
//! A [`ParamSchema`] serves two purposes: it renders the JSON-schema object
//! advertised in `tools/list`, and it validates raw call arguments into
//! [`ValidatedArguments`]. Validation walks every declared field once and
//! collects all violations instead of stopping at the first.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use uuid::Uuid;

/// Local date-time layouts accepted for `DateTime` fields. An offset suffix
/// (`%:z`) is tried against each of them as well.
const DATE_TIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Constraint attached to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Any string.
    Text,
    /// A JSON number, optionally restricted to a closed interval.
    Number { min: Option<f64>, max: Option<f64> },
    /// ISO-8601 extended date or date-time string.
    DateTime,
    /// Canonical hyphenated UUID string.
    Uuid,
    /// One of a fixed set of string tokens.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    /// A number restricted to `[min, max]`.
    pub const fn range(min: f64, max: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    fn json_type(&self) -> &'static str {
        match self {
            Self::Number { .. } => "number",
            Self::Text | Self::DateTime | Self::Uuid | Self::Enum(_) => "string",
        }
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Ordered set of fields accepted by a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
}

impl ParamSchema {
    /// Create a schema with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn required(self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.field(name, kind, description, true)
    }

    /// Add an optional field. Absent optional fields are left absent.
    pub fn optional(self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.field(name, kind, description, false)
    }

    fn field(
        mut self,
        name: &'static str,
        kind: FieldKind,
        description: &'static str,
        required: bool,
    ) -> Self {
        self.fields.push(FieldSpec {
            name,
            description,
            kind,
            required,
        });
        self
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Render the JSON-schema object advertised to clients.
    pub fn to_json_schema(&self) -> JsonObject {
        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            let mut property = serde_json::Map::new();
            property.insert("type".to_string(), json!(field.kind.json_type()));
            if let FieldKind::Enum(tokens) = field.kind {
                property.insert("enum".to_string(), json!(tokens));
            }
            property.insert("description".to_string(), json!(field.description));
            properties.insert(field.name.to_string(), Value::Object(property));
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }

    /// Validate raw arguments against this schema.
    ///
    /// Keys that are not declared are dropped from the result. On failure
    /// every violation found is returned, in field declaration order.
    pub fn validate(&self, raw: &JsonObject) -> Result<ValidatedArguments, SchemaViolations> {
        let mut accepted = JsonObject::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match raw.get(field.name) {
                None if field.required => violations.push(Violation::new(
                    field.name,
                    "required field is missing",
                )),
                None => {}
                Some(value) => match check_value(&field.kind, value) {
                    Ok(()) => {
                        accepted.insert(field.name.to_string(), value.clone());
                    }
                    Err(reason) => violations.push(Violation::new(field.name, reason)),
                },
            }
        }

        if violations.is_empty() {
            Ok(ValidatedArguments(accepted))
        } else {
            Err(SchemaViolations(violations))
        }
    }
}

fn check_value(kind: &FieldKind, value: &Value) -> Result<(), String> {
    if let FieldKind::Number { min, max } = kind {
        let number = value
            .as_f64()
            .ok_or_else(|| format!("expected number, received {}", json_type_name(value)))?;
        let below = min.is_some_and(|m| number < m);
        let above = max.is_some_and(|m| number > m);
        return match (below || above, min, max) {
            (false, _, _) => Ok(()),
            (true, Some(lo), Some(hi)) => Err(format!(
                "must be between {lo} and {hi}, received {number}"
            )),
            (true, Some(lo), None) => Err(format!(
                "must be greater than or equal to {lo}, received {number}"
            )),
            (true, _, Some(hi)) => Err(format!(
                "must be less than or equal to {hi}, received {number}"
            )),
            (true, None, None) => Ok(()),
        };
    }

    let text = value
        .as_str()
        .ok_or_else(|| format!("expected string, received {}", json_type_name(value)))?;

    match kind {
        FieldKind::Text | FieldKind::Number { .. } => Ok(()),
        FieldKind::DateTime if is_iso_date_time(text) => Ok(()),
        FieldKind::DateTime => Err(format!(
            "must be an ISO 8601 date or date-time (YYYY-MM-DDTHH:MM:SS), received {text:?}"
        )),
        FieldKind::Uuid if is_canonical_uuid(text) => Ok(()),
        FieldKind::Uuid => Err(format!("must be a valid UUID, received {text:?}")),
        FieldKind::Enum(tokens) if tokens.contains(&text) => Ok(()),
        FieldKind::Enum(tokens) => Err(format!(
            "must be one of {}, received {text:?}",
            tokens.join(", ")
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Only the 36-character hyphenated form counts; braced, URN and
/// hyphen-less spellings are rejected.
fn is_canonical_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

fn is_iso_date_time(value: &str) -> bool {
    if value.len() == 10 {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    }

    let mut normalized = value.to_string();
    if normalized.as_bytes().get(10) == Some(&b' ') {
        normalized.replace_range(10..11, "T");
    }
    if let Some(stripped) = normalized.strip_suffix('Z') {
        normalized = format!("{stripped}+00:00");
    }
    // Reduced precision `YYYY-MM-DDTHH` means the top of the hour.
    let bytes = normalized.as_bytes();
    if bytes.len() >= 13
        && bytes[10] == b'T'
        && bytes[11..13].iter().all(u8::is_ascii_digit)
        && matches!(bytes.get(13), None | Some(b'+') | Some(b'-'))
    {
        normalized.insert_str(13, ":00");
    }

    DATE_TIME_LAYOUTS.iter().any(|layout| {
        NaiveDateTime::parse_from_str(&normalized, layout).is_ok()
            || DateTime::parse_from_str(&normalized, &format!("{layout}%:z")).is_ok()
    })
}

/// Arguments that passed schema validation.
///
/// Only [`ParamSchema::validate`] constructs this type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArguments(JsonObject);

impl ValidatedArguments {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &JsonObject {
        &self.0
    }

    pub fn into_inner(self) -> JsonObject {
        self.0
    }
}

/// One failed constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl Violation {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every violation found while validating one set of arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolations(pub Vec<Violation>);

impl SchemaViolations {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolations {}
