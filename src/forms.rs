//! Form binding: turns a flat field mapping into a typed, validated form.
//!
//! Binding never fails on a missing value; required fields are declared as
//! `Option` and checked by `validator`, so every problem ends up as a
//! per-field error in [`FormErrors`].

use crate::extract::FieldMap;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

pub const NOT_BLANK: &str = "This value should not be blank.";
pub const NOT_VALID: &str = "This value is not valid.";

/// Per-field errors produced by a failed bind. The form-level entry uses the
/// empty key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.errors.get(name).map(Vec::as_slice)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(source: ValidationErrors) -> Self {
        let mut errors = Self::default();
        for (field, field_errors) in source.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| NOT_VALID.to_string());
                errors.add(field.to_string(), message);
            }
        }
        errors
    }
}

/// Renders one `field: message` line per error, sorted by field name.
impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("\n")?;
                }
                first = false;
                if field.is_empty() {
                    write!(f, "{}", message)?;
                } else {
                    write!(f, "{}: {}", field, message)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Bind a field mapping onto `T` and validate it.
pub fn bind<T>(fields: &FieldMap) -> Result<T, FormErrors>
where
    T: DeserializeOwned + Validate,
{
    let form: T = serde_json::from_value(fields.to_json()).map_err(|e| {
        // serde reports the first offending field only
        FormErrors::single("", format!("{} ({})", NOT_VALID, e))
    })?;
    form.validate()?;
    Ok(form)
}

/// Registration form for a new user.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UserForm {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "This value should not be blank."),
        length(min = 1, max = 255, message = "This value should not be blank."),
        email(message = "This value is not a valid email address.")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "This value should not be blank."),
        length(min = 1, max = 255, message = "This value should not be blank.")
    )]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "This value should not be blank."),
        length(min = 1, max = 4096, message = "This value should not be blank.")
    )]
    pub password: Option<String>,
}

/// Product creation form. `user` optionally names the owning user by id.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ProductForm {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "This value should not be blank."),
        length(min = 1, max = 255, message = "This value should not be blank.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    #[validate(
        required(message = "This value should not be blank."),
        range(min = 0.0, message = "This value should be positive or zero.")
    )]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "This value should not be blank."),
        length(min = 1, message = "This value should not be blank.")
    )]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_i32")]
    pub user: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

/// Accepts strings, numbers and booleans as text. Form inputs are always
/// strings while JSON clients sometimes send scalars.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => None,
        Some(Scalar::Text(s)) => Some(s),
        Some(Scalar::Number(n)) => Some(n.to_string()),
        Some(Scalar::Bool(b)) => Some(b.to_string()),
    })
}

/// Coerces numbers and numeric strings to `f64`. Blank strings count as
/// missing.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Some(Scalar::Text(s)) => parse_f64(&s).map_err(serde::de::Error::custom),
        Some(Scalar::Bool(_)) => Err(serde::de::Error::custom("expected a number")),
    }
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected an integer id")),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("expected an integer id")),
        Some(Scalar::Bool(_)) => Err(serde::de::Error::custom("expected an integer id")),
    }
}

/// Parses a price as typed by a client. Blank input is `Ok(None)`.
pub fn parse_f64(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(format!("'{}' is not a number", trimmed)),
    }
}
