use chrono::DateTime;
use serde_json::{Map, Value};

use super::{IssueKind, ValidationError, ValidationIssue};

/// The primitive shape a field must have.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// An RFC 3339 timestamp carried as a string.
    DateTime,
    Array(Box<FieldType>),
    Enum(Vec<String>),
    Object(Schema),
    Any,
}

impl FieldType {
    fn describe(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime string",
            FieldType::Array(_) => "array",
            FieldType::Enum(_) => "enum string",
            FieldType::Object(_) => "object",
            FieldType::Any => "any value",
        }
    }
}

/// A named field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// The key may be absent. A `null` on an optional, non-nullable field is
    /// treated as absent.
    pub optional: bool,
    /// The value may be `null`.
    pub nullable: bool,
}

impl Field {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            optional: false,
            nullable: false,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn datetime(name: &str) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    pub fn any(name: &str) -> Self {
        Self::new(name, FieldType::Any)
    }

    /// An array whose every element has type `inner`.
    pub fn array(name: &str, inner: FieldType) -> Self {
        Self::new(name, FieldType::Array(Box::new(inner)))
    }

    /// A string restricted to a fixed set of values.
    pub fn enumeration(name: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldType::Enum(values.iter().map(|v| v.to_string()).collect()),
        )
    }

    pub fn object(name: &str, schema: Schema) -> Self {
        Self::new(name, FieldType::Object(schema))
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Runtime description of an entity's shape.
///
/// Validation works like a "strip" object schema: declared fields are checked
/// and copied to the output, undeclared keys are dropped. Schemas are values;
/// the composition methods return new schemas and never mutate `self`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A copy of this schema without the named fields.
    pub fn omit(&self, names: &[&str]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|f| !names.contains(&f.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// A copy of this schema where every field is optional.
    pub fn partial(&self) -> Self {
        Self {
            fields: self.fields.iter().cloned().map(Field::optional).collect(),
        }
    }

    /// A copy of this schema with `fields` added. A field with an existing
    /// name replaces the previous definition.
    pub fn extend(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut extended = self.fields.clone();
        for field in fields {
            match extended.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field,
                None => extended.push(field),
            }
        }
        Self { fields: extended }
    }

    /// Validates `value` and returns the stripped object.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut issues = Vec::new();
        let output = validate_object(self, value, "", &mut issues);
        if issues.is_empty() {
            Ok(output)
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Checks a caller-supplied payload without stripping it.
    ///
    /// Declared keys must have the declared type and required fields must be
    /// present. Undeclared keys are left for the backend to judge.
    pub fn check_input(&self, record: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        for field in &self.fields {
            check_field(field, record.get(&field.name), &field.name, &mut issues);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn push(issues: &mut Vec<ValidationIssue>, path: &str, kind: IssueKind) {
    let path = if path.is_empty() { "(root)" } else { path };
    issues.push(ValidationIssue {
        path: path.to_string(),
        kind,
    });
}

/// Validates one field and returns the value to keep, if any.
fn check_field(
    field: &Field,
    value: Option<&Value>,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Value> {
    match value {
        None if field.optional => None,
        None => {
            push(issues, path, IssueKind::Missing);
            None
        }
        Some(Value::Null) if field.nullable => Some(Value::Null),
        Some(Value::Null) if field.optional => None,
        Some(value) => Some(validate_type(&field.field_type, value, path, issues)),
    }
}

fn validate_object(
    schema: &Schema,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Value {
    let Some(object) = value.as_object() else {
        push(
            issues,
            path,
            IssueKind::WrongType {
                expected: "object",
                found: kind_of(value),
            },
        );
        return Value::Null;
    };

    let mut output = Map::new();
    for field in schema.fields() {
        let field_path = join_path(path, &field.name);
        if let Some(kept) = check_field(field, object.get(&field.name), &field_path, issues) {
            output.insert(field.name.clone(), kept);
        }
    }
    Value::Object(output)
}

fn validate_type(
    field_type: &FieldType,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Value {
    let wrong_type = |issues: &mut Vec<ValidationIssue>| {
        push(
            issues,
            path,
            IssueKind::WrongType {
                expected: field_type.describe(),
                found: kind_of(value),
            },
        );
        Value::Null
    };

    match field_type {
        FieldType::Any => value.clone(),
        FieldType::String if value.is_string() => value.clone(),
        FieldType::Number if value.is_number() => value.clone(),
        FieldType::Integer if is_integer(value) => value.clone(),
        FieldType::Boolean if value.is_boolean() => value.clone(),
        FieldType::DateTime => match value.as_str() {
            Some(text) if DateTime::parse_from_rfc3339(text).is_ok() => value.clone(),
            Some(text) => {
                push(issues, path, IssueKind::InvalidDateTime(text.to_string()));
                Value::Null
            }
            None => wrong_type(issues),
        },
        FieldType::Enum(allowed) => match value.as_str() {
            Some(text) if allowed.iter().any(|a| a == text) => value.clone(),
            Some(text) => {
                push(
                    issues,
                    path,
                    IssueKind::InvalidEnum {
                        allowed: allowed.clone(),
                        found: text.to_string(),
                    },
                );
                Value::Null
            }
            None => wrong_type(issues),
        },
        FieldType::Array(inner) => match value.as_array() {
            Some(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        validate_type(inner, item, &format!("{path}[{index}]"), issues)
                    })
                    .collect(),
            ),
            None => wrong_type(issues),
        },
        FieldType::Object(schema) => validate_object(schema, value, path, issues),
        _ => wrong_type(issues),
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0)
}
