//! Per-endpoint field schemas.
//!
//! A [`FieldSchema`] declares which fields an endpoint accepts and how each
//! value is validated and typed. The same rule constructors back both the
//! query parser (all errors collected) and request-body validation (first
//! error wins), so filters and payloads speak one vocabulary.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Coarse value classes used for operator gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Text,
    Number,
    Date,
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Str { max: usize },
    Email,
    Password,
    Number { min: i64 },
    Date,
    Enumeration(Vec<String>),
    /// Opaque pass-through, used for sub-objects such as `q` and `order`.
    Any,
}

impl RuleKind {
    /// The class used for operator gating; `None` means operators are never
    /// accepted on this field.
    pub fn type_class(&self) -> Option<TypeClass> {
        match self {
            RuleKind::Str { .. } | RuleKind::Email | RuleKind::Password => Some(TypeClass::Text),
            RuleKind::Number { .. } => Some(TypeClass::Number),
            RuleKind::Date => Some(TypeClass::Date),
            RuleKind::Enumeration(_) | RuleKind::Any => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub label: String,
    pub kind: RuleKind,
    pub required: bool,
}

impl FieldRule {
    pub fn string(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Str { max: 255 }, required: false }
    }

    pub fn long_string(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Str { max: 1024 }, required: false }
    }

    pub fn email(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Email, required: false }
    }

    pub fn password(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Password, required: false }
    }

    pub fn number(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Number { min: 0 }, required: false }
    }

    pub fn date(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Date, required: false }
    }

    pub fn enumeration(label: &str, values: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            kind: RuleKind::Enumeration(values.iter().map(|v| v.to_string()).collect()),
            required: false,
        }
    }

    pub fn any(label: &str) -> Self {
        Self { label: label.to_string(), kind: RuleKind::Any, required: false }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Validate one raw value, returning the normalized value or a message.
    pub fn validate(&self, value: &Value) -> std::result::Result<Value, String> {
        let label = &self.label;
        match &self.kind {
            RuleKind::Str { max } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("\"{label}\" must be a string"))?;
                let trimmed = s.trim();
                if trimmed.chars().count() > *max {
                    return Err(format!("\"{label}\" must be at most {max} characters"));
                }
                Ok(Value::String(trimmed.to_string()))
            }
            RuleKind::Email => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("\"{label}\" must be a string"))?
                    .trim();
                let valid = s.split_once('@').is_some_and(|(local, domain)| {
                    let segments: Vec<&str> = domain.split('.').collect();
                    !local.is_empty()
                        && segments.len() >= 2
                        && segments.iter().all(|seg| !seg.is_empty())
                });
                if !valid {
                    return Err(format!("\"{label}\" must be a valid email address"));
                }
                Ok(Value::String(s.to_string()))
            }
            RuleKind::Password => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("\"{label}\" must be a string"))?;
                let strong = (6..=30).contains(&s.chars().count())
                    && !s.chars().any(char::is_whitespace)
                    && s.chars().any(|c| c.is_ascii_lowercase())
                    && s.chars().any(|c| c.is_ascii_uppercase())
                    && s.chars().any(|c| c.is_ascii_digit())
                    && s.chars().any(|c| !c.is_alphanumeric());
                if !strong {
                    return Err(format!(
                        "\"{label}\" must have a minimum of 6 characters, at least one uppercase letter, one number and one special character"
                    ));
                }
                Ok(Value::String(s.to_string()))
            }
            RuleKind::Number { min } => {
                let parsed = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| format!("\"{label}\" must be a number"))?;
                if parsed < *min as f64 {
                    return Err(format!(
                        "\"{label}\" must be greater than or equal to {min}"
                    ));
                }
                if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
                    Ok(Value::from(parsed as i64))
                } else {
                    Ok(Value::from(parsed))
                }
            }
            RuleKind::Date => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("\"{label}\" must be a valid date"))?
                    .trim();
                let parsed = parse_date(s)
                    .ok_or_else(|| format!("\"{label}\" must be a valid date"))?;
                Ok(Value::String(parsed.to_rfc3339()))
            }
            RuleKind::Enumeration(values) => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("\"{label}\" must be a string"))?;
                if values.iter().any(|v| v == s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    return Err(format!(
                        "\"{label}\" must be one of {}",
                        values.join(", ")
                    ));
                }
            }
            RuleKind::Any => Ok(value.clone()),
        }
    }
}

/// Ordered field-name → rule mapping for one endpoint. Insertion order is
/// preserved so downstream predicate and order terms stay deterministic.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<(String, FieldRule)>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }
}

/// Validate a request body against a schema. Unknown keys are rejected,
/// required fields must be present, and the first offending field decides
/// the message. Returns the normalized field map on success.
pub fn validate_body(body: &Map<String, Value>, schema: &FieldSchema) -> Result<Map<String, Value>> {
    for key in body.keys() {
        if schema.get(key).is_none() {
            return Err(Error::validation(format!("\"{key}\" is not allowed")));
        }
    }

    let mut values = Map::new();
    for (name, rule) in schema.iter() {
        match body.get(name) {
            None | Some(Value::Null) => {
                if rule.required {
                    return Err(Error::validation(format!("\"{}\" is required", rule.label)));
                }
            }
            Some(raw) => {
                let clean = rule.validate(raw).map_err(Error::validation)?;
                values.insert(name.to_string(), clean);
            }
        }
    }
    Ok(values)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_are_trimmed_and_capped() {
        let rule = FieldRule::string("Title");
        assert_eq!(rule.validate(&json!("  hello  ")).unwrap(), json!("hello"));
        let long = "x".repeat(256);
        assert!(rule.validate(&json!(long)).is_err());
        assert!(rule.validate(&json!(5)).is_err());
    }

    #[test]
    fn numbers_coerce_from_strings() {
        let rule = FieldRule::number("Limit");
        assert_eq!(rule.validate(&json!("25")).unwrap(), json!(25));
        assert!(rule.validate(&json!("-1")).is_err());
        assert!(rule.validate(&json!("abc")).is_err());
    }

    #[test]
    fn dates_normalize_to_rfc3339() {
        let rule = FieldRule::date("Due Date");
        let clean = rule.validate(&json!("2025-01-01")).unwrap();
        assert_eq!(clean, json!("2025-01-01T00:00:00+00:00"));
        assert!(rule.validate(&json!("not-a-date")).is_err());
    }

    #[test]
    fn password_policy_is_enforced() {
        let rule = FieldRule::password("Password");
        assert!(rule.validate(&json!("Secur3!")).is_ok());
        assert!(rule.validate(&json!("short")).is_err());
        assert!(rule.validate(&json!("alllowercase1!")).is_err());
    }

    #[test]
    fn body_validation_rejects_unknown_and_missing_fields() {
        let schema = FieldSchema::new()
            .field("title", FieldRule::string("Title").required())
            .field("priority", FieldRule::enumeration("Priority", &["LOW", "MEDIUM", "HIGH"]));

        let mut body = Map::new();
        body.insert("priority".to_string(), json!("LOW"));
        let err = validate_body(&body, &schema).unwrap_err();
        assert!(err.to_string().contains("\"Title\" is required"));

        let mut body = Map::new();
        body.insert("title".to_string(), json!("ship it"));
        body.insert("bogus".to_string(), json!(1));
        let err = validate_body(&body, &schema).unwrap_err();
        assert!(err.to_string().contains("not allowed"));

        let mut body = Map::new();
        body.insert("title".to_string(), json!("ship it"));
        body.insert("priority".to_string(), json!("URGENT"));
        let err = validate_body(&body, &schema).unwrap_err();
        assert!(err.to_string().contains("must be one of"));
    }
}
