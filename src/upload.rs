//! Request bodies for the create/update routes.
//!
//! Clients send the same field set as multipart (when a file is attached), JSON or
//! urlencoded. [`FormPayload`] flattens all three into string fields plus files, and
//! enforces the route's [`UploadPolicy`] while the multipart stream is read, so
//! disallowed or oversized files never reach a handler.

use std::{collections::HashMap, marker::PhantomData, path::Path, str::FromStr};

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;

use crate::utils::AppError;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub trait UploadPolicy: Send + Sync + 'static {
    const ALLOWED_TYPES: Option<&'static [&'static str]> = None;
    const MAX_FILE_BYTES: Option<usize> = None;
}

/// jpeg/png only, 5 MiB per file.
pub struct ImagesOnly;

impl UploadPolicy for ImagesOnly {
    const ALLOWED_TYPES: Option<&'static [&'static str]> = Some(IMAGE_TYPES);
    const MAX_FILE_BYTES: Option<usize> = Some(MAX_IMAGE_BYTES);
}

/// No restriction beyond the global body limit.
pub struct AnyFile;

impl UploadPolicy for AnyFile {}

pub fn check_content_type<P: UploadPolicy>(content_type: Option<&str>) -> Result<(), AppError> {
    match P::ALLOWED_TYPES {
        Some(allowed) if !content_type.is_some_and(|ct| allowed.contains(&ct)) => Err(
            AppError::Upload("Only .jpeg, .jpg, and .png files are allowed".to_owned()),
        ),
        _ => Ok(()),
    }
}

pub fn check_size<P: UploadPolicy>(len: usize) -> Result<(), AppError> {
    match P::MAX_FILE_BYTES {
        Some(max) if len > max => Err(AppError::Upload("File too large".to_owned())),
        _ => Ok(()),
    }
}

/// Numeric form fields. Floats must be finite.
pub trait FieldNumber: FromStr {
    fn is_acceptable(&self) -> bool {
        true
    }
}

impl FieldNumber for i32 {}

impl FieldNumber for f64 {
    fn is_acceptable(&self) -> bool {
        self.is_finite()
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Extension of the client's file name including the dot, or empty.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }
}

pub struct FormPayload<P = AnyFile> {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
    _policy: PhantomData<P>,
}

impl<P> Default for FormPayload<P> {
    fn default() -> Self {
        FormPayload {
            fields: HashMap::new(),
            files: HashMap::new(),
            _policy: PhantomData,
        }
    }
}

impl<S, P> FromRequest<S> for FormPayload<P>
where
    S: Send + Sync,
    P: UploadPolicy,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Upload(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            Self::from_json(value)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            let mut payload = Self::default();
            for (name, value) in pairs {
                payload.fields.entry(name).or_default().push(value);
            }
            Ok(payload)
        } else if content_type.is_empty() {
            Ok(Self::default())
        } else {
            Err(AppError::validation("Unsupported content type"))
        }
    }
}

impl<P: UploadPolicy> FormPayload<P> {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut payload = Self::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Upload(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            let Some(file_name) = field.file_name().map(str::to_owned) else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?;
                payload.fields.entry(name).or_default().push(text);
                continue;
            };

            // browsers send an empty part for an untouched file input
            if file_name.is_empty() {
                continue;
            }

            let content_type = field.content_type().map(str::to_owned);
            check_content_type::<P>(content_type.as_deref())?;

            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| AppError::Upload(e.body_text()))?
            {
                check_size::<P>(bytes.len() + chunk.len())?;
                bytes.extend_from_slice(&chunk);
            }

            payload.files.entry(name).or_insert(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(payload)
    }
}

impl<P> FormPayload<P> {
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        let Value::Object(map) = value else {
            return Err(AppError::validation("Expected a JSON object"));
        };

        let mut payload = Self::default();
        for (name, value) in map {
            let values = match value {
                Value::Null => continue,
                Value::Array(items) => items.into_iter().map(scalar_to_string).collect(),
                other => vec![scalar_to_string(other)],
            };
            payload.fields.insert(name, values);
        }
        Ok(payload)
    }

    /// First value of a field as submitted. A blank value counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }

    /// Like [`FormPayload::text`] with surrounding whitespace removed.
    pub fn trimmed(&self, name: &str) -> Option<String> {
        self.text(name).map(|v| v.trim().to_owned())
    }

    pub fn number<T: FieldNumber>(&self, name: &str) -> Result<Option<T>, AppError> {
        let invalid = || AppError::validation(format!("Invalid value for {name}"));
        match self.trimmed(name) {
            Some(raw) => {
                let value: T = raw.parse().map_err(|_| invalid())?;
                if !value.is_acceptable() {
                    return Err(invalid());
                }
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Repeated fields, a JSON array, or one JSON-array-encoded string.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        let values = self.fields.get(name)?;

        if let [single] = values.as_slice() {
            if let Ok(items) = serde_json::from_str::<Vec<Value>>(single) {
                return Some(items.into_iter().map(scalar_to_string).collect());
            }
        }

        let values: Vec<String> = values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect();
        (!values.is_empty()).then_some(values)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    const BOUNDARY: &str = "X-SHOP-BOUNDARY";

    fn multipart_request(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Request {
        let mut body = Vec::new();
        for (name, file, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn multipart_collects_fields_and_files() {
        let req = multipart_request(&[
            ("name", None, b"Phone"),
            ("highlights", None, b"fast"),
            ("highlights", None, b"light"),
            ("image", Some(("shot.png", "image/png")), b"\x89PNG"),
        ]);

        let mut form = FormPayload::<ImagesOnly>::from_request(req, &()).await.unwrap();
        assert_eq!(form.text("name").as_deref(), Some("Phone"));
        assert_eq!(form.list("highlights").unwrap(), vec!["fast", "light"]);

        let image = form.take_file("image").unwrap();
        assert_eq!(image.extension(), ".png");
        assert_eq!(image.bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn image_policy_rejects_other_types() {
        let req = multipart_request(&[("image", Some(("anim.gif", "image/gif")), b"GIF89a")]);
        let err = FormPayload::<ImagesOnly>::from_request(req, &()).await.err().unwrap();
        assert!(matches!(err, AppError::Upload(ref m) if m == "Only .jpeg, .jpg, and .png files are allowed"));
    }

    #[tokio::test]
    async fn any_file_policy_accepts_video() {
        let req = multipart_request(&[("video", Some(("intro.mp4", "video/mp4")), b"....")]);
        let form = FormPayload::<AnyFile>::from_request(req, &()).await.unwrap();
        assert!(form.has_file("video"));
    }

    #[tokio::test]
    async fn empty_file_part_counts_as_missing() {
        let req = multipart_request(&[("image", Some(("", "application/octet-stream")), b"")]);
        let form = FormPayload::<ImagesOnly>::from_request(req, &()).await.unwrap();
        assert!(!form.has_file("image"));
    }

    #[test]
    fn size_cap_only_applies_to_image_policy() {
        assert!(check_size::<ImagesOnly>(MAX_IMAGE_BYTES).is_ok());
        assert!(check_size::<ImagesOnly>(MAX_IMAGE_BYTES + 1).is_err());
        assert!(check_size::<AnyFile>(MAX_IMAGE_BYTES * 10).is_ok());
    }

    #[test]
    fn missing_content_type_is_rejected_for_images() {
        assert!(check_content_type::<ImagesOnly>(None).is_err());
        assert!(check_content_type::<ImagesOnly>(Some("image/jpg")).is_ok());
        assert!(check_content_type::<AnyFile>(None).is_ok());
    }

    #[test]
    fn json_numbers_and_arrays_flatten_to_strings() {
        let form: FormPayload = FormPayload::from_json(json!({
            "courseName": "Intro",
            "oldPrice": 100,
            "service": ["warranty", "returns"],
            "description": null,
        }))
        .unwrap();

        assert_eq!(form.number::<f64>("oldPrice").unwrap(), Some(100.0));
        assert_eq!(form.list("service").unwrap(), vec!["warranty", "returns"]);
        assert_eq!(form.text("description"), None);
    }

    #[test]
    fn json_encoded_list_in_single_field_is_expanded() {
        let form: FormPayload = FormPayload::from_json(json!({ "highlights": "[\"a\",\"b\"]" })).unwrap();
        assert_eq!(form.list("highlights").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn unparsable_number_is_a_validation_error() {
        let form: FormPayload = FormPayload::from_json(json!({ "stock": "lots" })).unwrap();
        let err = form.number::<i32>("stock").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid value for stock"));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            let form: FormPayload = FormPayload::from_json(json!({ "oldPrice": raw })).unwrap();
            let err = form.number::<f64>("oldPrice").unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid value for oldPrice"));
        }
    }

    #[test]
    fn padded_numbers_still_parse() {
        let form: FormPayload = FormPayload::from_json(json!({ "stock": " 7 " })).unwrap();
        assert_eq!(form.number::<i32>("stock").unwrap(), Some(7));
    }

    #[test]
    fn text_keeps_submitted_whitespace() {
        let form: FormPayload = FormPayload::from_json(json!({
            "courseName": "  Intro ",
            "password": " pass phrase ",
        }))
        .unwrap();
        assert_eq!(form.text("courseName").as_deref(), Some("  Intro "));
        assert_eq!(form.text("password").as_deref(), Some(" pass phrase "));
        assert_eq!(form.trimmed("courseName").as_deref(), Some("Intro"));
    }

    #[test]
    fn blank_text_is_absent() {
        let form: FormPayload = FormPayload::from_json(json!({ "name": "   " })).unwrap();
        assert_eq!(form.text("name"), None);
        assert_eq!(form.trimmed("name"), None);
    }
}
