//! Content-negotiated request body extraction.
//!
//! [`FormInput`] reads the body according to its `Content-Type` and hands the
//! handlers a flat [`FieldMap`] plus any uploaded files:
//!
//! * `application/json`: a non-empty JSON object
//! * `multipart/form-data`: text parts become fields, parts carrying a
//!   filename become [`UploadedFile`]s
//! * `application/x-www-form-urlencoded` or no content type: urlencoded form
//! * anything else: no fields at all

use crate::errors::ApiError;
use crate::schemas::AppState;
use axum::{
    async_trait,
    body::Bytes,
    extract::{Form, FromRequest, FromRequestParts, Multipart, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Multipart values this short (after trimming) are treated as empty on
/// update paths.
pub const MIN_MULTIPART_VALUE_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Multipart,
    Form,
    Unsupported,
}

impl ContentKind {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers.get(CONTENT_TYPE) else {
            return Self::Form;
        };
        let content_type = content_type.to_str().unwrap_or_default().to_ascii_lowercase();

        if content_type.contains("application/json") {
            Self::Json
        } else if content_type.contains("multipart/form-data") {
            Self::Multipart
        } else if content_type.contains("application/x-www-form-urlencoded")
            || content_type.trim().is_empty()
        {
            Self::Form
        } else {
            Self::Unsupported
        }
    }
}

/// Flat key to value mapping extracted from a request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<String, Value>,
}

impl FieldMap {
    /// Accepts a JSON object; anything else is `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self {
                fields: object.into_iter().collect(),
            }),
            _ => None,
        }
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), Value::String(value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Text value of a provided field. `null` counts as not provided;
    /// numbers and booleans are rendered as text.
    pub fn text(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(ApiError::BadRequest(format!(
                "{}: This value is not valid.",
                key
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// A file part of a multipart body.
#[derive(Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.body.len())
            .finish()
    }
}

/// Request body as seen by the resource handlers.
#[derive(Debug, Clone)]
pub struct FormInput {
    pub kind: ContentKind,
    pub fields: FieldMap,
    pub files: Vec<UploadedFile>,
}

impl FormInput {
    pub fn file(&self, field_name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field_name == field_name)
    }

    /// Fields for a partial update. Multipart text values are trimmed and
    /// any value of fewer than [`MIN_MULTIPART_VALUE_CHARS`] characters is
    /// rejected.
    pub fn into_update_fields(self) -> Result<FieldMap, ApiError> {
        if self.kind != ContentKind::Multipart {
            return Ok(self.fields);
        }

        let mut trimmed = FieldMap::default();
        for (key, value) in self.fields.fields {
            let Value::String(text) = value else {
                trimmed.fields.insert(key, value);
                continue;
            };
            let text = text.trim();
            if text.chars().count() < MIN_MULTIPART_VALUE_CHARS {
                return Err(ApiError::EmptyField(key));
            }
            trimmed.insert_text(key, text);
        }
        Ok(trimmed)
    }
}

#[async_trait]
impl FromRequest<AppState> for FormInput {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let kind = ContentKind::from_headers(req.headers());
        trace!("Extracting {:?} request body", kind);

        let (fields, files) = match kind {
            ContentKind::Json => (read_json(req, state).await?, Vec::new()),
            ContentKind::Multipart => read_multipart(req, state).await?,
            ContentKind::Form => (read_form(req, state).await?, Vec::new()),
            ContentKind::Unsupported => (FieldMap::default(), Vec::new()),
        };

        debug!(
            "Extracted {} field(s) and {} file(s) from {:?} body",
            fields.len(),
            files.len(),
            kind
        );
        Ok(Self {
            kind,
            fields,
            files,
        })
    }
}

async fn read_json(req: Request, state: &AppState) -> Result<FieldMap, ApiError> {
    let body = Bytes::from_request(req, state).await.map_err(|e| {
        warn!("Failed to read JSON body: {}", e);
        ApiError::EmptyBody
    })?;
    parse_json_fields(&body)
}

/// A body that is not a JSON object, or an empty one, is rejected.
pub fn parse_json_fields(body: &[u8]) -> Result<FieldMap, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("Body is not valid JSON: {}", e);
        ApiError::EmptyBody
    })?;
    match FieldMap::from_json(value) {
        Some(fields) if !fields.is_empty() => Ok(fields),
        _ => Err(ApiError::EmptyBody),
    }
}

async fn read_form(req: Request, state: &AppState) -> Result<FieldMap, ApiError> {
    // Form only accepts bodies labelled as urlencoded; a missing header means
    // the same thing here.
    let (mut parts, body) = req.into_parts();
    parts.headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    let req = Request::from_parts(parts, body);

    let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
        .await
        .map_err(|e| {
            warn!("Failed to parse form body: {}", e);
            ApiError::BadRequest(e.body_text())
        })?;

    let mut fields = FieldMap::default();
    for (key, value) in pairs {
        fields.insert_text(key, value);
    }
    Ok(fields)
}

async fn read_multipart(
    req: Request,
    state: &AppState,
) -> Result<(FieldMap, Vec<UploadedFile>), ApiError> {
    let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
        warn!("Rejected multipart body: {}", e);
        ApiError::BadRequest(e.body_text())
    })?;

    let mut fields = FieldMap::default();
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            trace!("Multipart file part '{}' ({} bytes)", name, body.len());
            files.push(UploadedFile {
                field_name: name,
                file_name,
                content_type,
                body,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            fields.insert_text(name, value);
        }
    }
    Ok((fields, files))
}

/// `{id}` path segment of a user route. A segment that is not an integer is
/// answered like an unknown user.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::InvalidUserId(e.body_text()))?;
        Ok(Self(id))
    }
}

/// `{id}` path segment of a product route. A segment that is not an integer
/// is answered like an unknown product.
#[derive(Debug, Clone, Copy)]
pub struct ProductId(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for ProductId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::InvalidProductId(e.body_text()))?;
        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        headers
    }

    #[test]
    fn test_content_kind_detection() {
        assert_eq!(
            ContentKind::from_headers(&headers(Some("application/json; charset=utf-8"))),
            ContentKind::Json
        );
        assert_eq!(
            ContentKind::from_headers(&headers(Some("multipart/form-data; boundary=x"))),
            ContentKind::Multipart
        );
        assert_eq!(
            ContentKind::from_headers(&headers(Some("application/x-www-form-urlencoded"))),
            ContentKind::Form
        );
        assert_eq!(ContentKind::from_headers(&headers(None)), ContentKind::Form);
        assert_eq!(
            ContentKind::from_headers(&headers(Some("text/plain"))),
            ContentKind::Unsupported
        );
    }

    #[test]
    fn test_parse_json_fields_rejects_empty_and_non_objects() {
        assert!(matches!(parse_json_fields(b""), Err(ApiError::EmptyBody)));
        assert!(matches!(parse_json_fields(b"{}"), Err(ApiError::EmptyBody)));
        assert!(matches!(parse_json_fields(b"[1,2]"), Err(ApiError::EmptyBody)));
        assert!(matches!(parse_json_fields(b"null"), Err(ApiError::EmptyBody)));
        assert!(matches!(parse_json_fields(b"{oops"), Err(ApiError::EmptyBody)));

        let fields = parse_json_fields(br#"{"name":"Lamp"}"#).unwrap();
        assert_eq!(fields.get("name"), Some(&json!("Lamp")));
    }

    #[test]
    fn test_text_treats_null_as_missing() {
        let fields = FieldMap::from_json(json!({
            "name": null,
            "price": 9.5,
            "description": "ok",
            "tags": ["a"]
        }))
        .unwrap();
        assert_eq!(fields.text("name").unwrap(), None);
        assert_eq!(fields.text("price").unwrap(), Some("9.5".to_string()));
        assert_eq!(fields.text("description").unwrap(), Some("ok".to_string()));
        assert_eq!(fields.text("missing").unwrap(), None);
        assert!(fields.text("tags").is_err());
    }

    fn multipart_input(pairs: &[(&str, &str)]) -> FormInput {
        let mut fields = FieldMap::default();
        for (k, v) in pairs {
            fields.insert_text(*k, *v);
        }
        FormInput {
            kind: ContentKind::Multipart,
            fields,
            files: Vec::new(),
        }
    }

    #[test]
    fn test_update_fields_trim_multipart_values() {
        let fields = multipart_input(&[("name", "  Desk lamp \r\n")])
            .into_update_fields()
            .unwrap();
        assert_eq!(fields.text("name").unwrap(), Some("Desk lamp".to_string()));
    }

    #[test]
    fn test_update_fields_reject_short_multipart_values() {
        for short in ["", "  ", "ab", " ab ", "é\u{301}"] {
            let err = multipart_input(&[("name", "Lamp"), ("description", short)])
                .into_update_fields()
                .unwrap_err();
            match err {
                ApiError::EmptyField(field) => assert_eq!(field, "description"),
                other => panic!("unexpected error for {:?}: {:?}", short, other),
            }
        }
        assert!(multipart_input(&[("price", "9.9")]).into_update_fields().is_ok());
    }

    #[test]
    fn test_update_fields_leave_other_kinds_untouched() {
        let input = FormInput {
            kind: ContentKind::Json,
            fields: FieldMap::from_json(json!({ "name": "ab" })).unwrap(),
            files: Vec::new(),
        };
        let fields = input.into_update_fields().unwrap();
        assert_eq!(fields.text("name").unwrap(), Some("ab".to_string()));
    }
}
