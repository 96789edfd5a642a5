//! Request payload parsing for the write endpoints.
//!
//! Create and update accept two encodings of the same payload:
//! - `application/json` with a nested `meta` object,
//! - `application/x-www-form-urlencoded` with metadata flattened to `meta[<field>]` keys.
//!
//! Both reduce to [`WriteBody`] before any handler looks at them. The query string of a
//! write request may carry the same bracket-flattened `meta[...]` pairs; those are parsed
//! with [`meta_from_pairs`] as well but only participate in the post-write pass (see the
//! crate docs).

use api_shared::UpdatePostReq;
use axum::http::StatusCode;
use std::collections::BTreeMap;

/// A write-endpoint body reduced to one shape, whichever encoding it arrived in.
///
/// `None` fields were absent from the payload. `meta` maps field names to raw string
/// values; non-string JSON values are coerced on the way in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<String>,
    pub slug: Option<String>,
    pub featured_media: Option<String>,
    pub meta: BTreeMap<String, String>,
}

/// Why a request body could not be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyError {
    MalformedJson,
    MalformedForm,
    UnsupportedContentType,
}

impl BodyError {
    /// The response this parse failure maps to.
    pub fn rejection(self) -> (StatusCode, &'static str) {
        match self {
            BodyError::MalformedJson => (StatusCode::BAD_REQUEST, "Malformed JSON body"),
            BodyError::MalformedForm => (StatusCode::BAD_REQUEST, "Malformed form body"),
            BodyError::UnsupportedContentType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported content type",
            ),
        }
    }
}

/// Parses a write-endpoint body according to its `Content-Type`.
///
/// An empty body parses as the empty payload whatever the content type says. A missing
/// `Content-Type` header is treated as JSON; parameters such as `;charset=utf-8` are
/// ignored.
///
/// # Errors
///
/// Returns [`BodyError::UnsupportedContentType`] for content types other than the two
/// accepted ones, and the matching malformed-body error when decoding fails.
pub fn parse_write_body(content_type: Option<&str>, body: &[u8]) -> Result<WriteBody, BodyError> {
    if body.is_empty() {
        return Ok(WriteBody::default());
    }
    let mime = content_type.map(|value| {
        value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    });
    match mime.as_deref() {
        None | Some("application/json") => parse_json_body(body),
        Some("application/x-www-form-urlencoded") => parse_form_body(body),
        Some(_) => Err(BodyError::UnsupportedContentType),
    }
}

fn parse_json_body(body: &[u8]) -> Result<WriteBody, BodyError> {
    let req: UpdatePostReq = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected JSON body: {e}");
        BodyError::MalformedJson
    })?;
    let mut meta = BTreeMap::new();
    for (name, value) in req.meta {
        if let Some(text) = coerce_meta_value(value) {
            meta.insert(name, text);
        }
    }
    Ok(WriteBody {
        title: req.title,
        content: req.content,
        excerpt: req.excerpt,
        status: req.status,
        slug: req.slug,
        featured_media: req.featured_media,
        meta,
    })
}

/// Coerces a JSON metadata value to the string form the store holds.
///
/// `null` means "entry not provided" and is dropped. Scalars take their obvious text
/// form; arrays and objects keep their JSON text so nothing is silently lost.
fn coerce_meta_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn parse_form_body(body: &[u8]) -> Result<WriteBody, BodyError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).map_err(|e| {
        tracing::debug!("Rejected form body: {e}");
        BodyError::MalformedForm
    })?;
    let mut parsed = WriteBody {
        meta: meta_from_pairs(&pairs),
        ..WriteBody::default()
    };
    for (name, value) in pairs {
        match name.as_str() {
            "title" => parsed.title = Some(value),
            "content" => parsed.content = Some(value),
            "excerpt" => parsed.excerpt = Some(value),
            "status" => parsed.status = Some(value),
            "slug" => parsed.slug = Some(value),
            "featured_media" => parsed.featured_media = Some(value),
            _ => {}
        }
    }
    Ok(parsed)
}

/// Folds bracket-flattened `meta[<field>]` pairs into a field-name → value map.
///
/// Pairs whose key is not of that shape are ignored. With duplicate field names the last
/// pair wins, matching how repeated form inputs behave.
pub fn meta_from_pairs(pairs: &[(String, String)]) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    for (key, value) in pairs {
        if let Some(field) = bracket_suffix(key) {
            meta.insert(field.to_owned(), value.clone());
        }
    }
    meta
}

/// Extracts `<field>` from a `meta[<field>]` key; `None` for any other shape.
fn bracket_suffix(key: &str) -> Option<&str> {
    let inner = key.strip_prefix("meta[")?.strip_suffix(']')?;
    (!inner.is_empty()).then_some(inner)
}

/// Overlays query-string metadata on body metadata; query entries win.
pub fn merged_meta(
    body_meta: &BTreeMap<String, String>,
    query_meta: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = body_meta.clone();
    for (name, value) in query_meta {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_json_body_with_meta() {
        let body = br#"{"title":"Hello","meta":{"focuskw":"key phrase"}}"#;
        let parsed = parse_write_body(Some("application/json"), body).expect("body should parse");
        assert_eq!(parsed.title.as_deref(), Some("Hello"));
        assert_eq!(parsed.meta.get("focuskw").map(String::as_str), Some("key phrase"));
        assert_eq!(parsed.status, None);
    }

    #[test]
    fn test_json_meta_values_are_coerced() {
        let body = br#"{"meta":{"a":"text","b":7,"c":true,"d":null,"e":[1,2]}}"#;
        let parsed = parse_write_body(Some("application/json"), body).expect("body should parse");
        assert_eq!(parsed.meta.get("a").map(String::as_str), Some("text"));
        assert_eq!(parsed.meta.get("b").map(String::as_str), Some("7"));
        assert_eq!(parsed.meta.get("c").map(String::as_str), Some("true"));
        assert!(!parsed.meta.contains_key("d"));
        assert_eq!(parsed.meta.get("e").map(String::as_str), Some("[1,2]"));
    }

    #[test]
    fn test_form_body_with_bracket_meta() {
        let body = b"title=Form+Post&status=published&meta%5Bfocuskw%5D=Test+Keyphrase";
        let parsed = parse_write_body(Some("application/x-www-form-urlencoded"), body)
            .expect("body should parse");
        assert_eq!(parsed.title.as_deref(), Some("Form Post"));
        assert_eq!(parsed.status.as_deref(), Some("published"));
        assert_eq!(
            parsed.meta.get("focuskw").map(String::as_str),
            Some("Test Keyphrase")
        );
    }

    #[test]
    fn test_form_body_last_duplicate_wins() {
        let body = b"meta%5Bfocuskw%5D=first&meta%5Bfocuskw%5D=second";
        let parsed = parse_write_body(Some("application/x-www-form-urlencoded"), body)
            .expect("body should parse");
        assert_eq!(parsed.meta.get("focuskw").map(String::as_str), Some("second"));
    }

    #[test]
    fn test_empty_body_is_empty_payload() {
        let parsed = parse_write_body(Some("application/json"), b"").expect("body should parse");
        assert_eq!(parsed, WriteBody::default());
        let parsed = parse_write_body(Some("text/plain"), b"").expect("body should parse");
        assert_eq!(parsed, WriteBody::default());
    }

    #[test]
    fn test_missing_content_type_defaults_to_json() {
        let parsed = parse_write_body(None, br#"{"title":"T"}"#).expect("body should parse");
        assert_eq!(parsed.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_content_type_parameters_are_ignored() {
        let parsed = parse_write_body(Some("application/json; charset=utf-8"), br#"{"title":"T"}"#)
            .expect("body should parse");
        assert_eq!(parsed.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_unsupported_content_type() {
        let result = parse_write_body(Some("text/plain"), b"title=T");
        assert_eq!(result, Err(BodyError::UnsupportedContentType));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let result = parse_write_body(Some("application/json"), b"{ not json");
        assert_eq!(result, Err(BodyError::MalformedJson));
    }

    #[test]
    fn test_meta_from_pairs_ignores_other_shapes() {
        let pairs = owned_pairs(&[
            ("meta[focuskw]", "kw"),
            ("meta[]", "no name"),
            ("meta[x", "unterminated"),
            ("title", "not meta"),
        ]);
        let meta = meta_from_pairs(&pairs);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get("focuskw").map(String::as_str), Some("kw"));
    }

    #[test]
    fn test_merged_meta_query_wins() {
        let mut body = BTreeMap::new();
        body.insert("focuskw".to_owned(), "body value".to_owned());
        body.insert("metadesc".to_owned(), "kept".to_owned());
        let mut query = BTreeMap::new();
        query.insert("focuskw".to_owned(), "query value".to_owned());

        let merged = merged_meta(&body, &query);
        assert_eq!(merged.get("focuskw").map(String::as_str), Some("query value"));
        assert_eq!(merged.get("metadesc").map(String::as_str), Some("kept"));
    }

    #[test]
    fn test_body_error_rejections() {
        assert_eq!(BodyError::MalformedJson.rejection().0, StatusCode::BAD_REQUEST);
        assert_eq!(BodyError::MalformedForm.rejection().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            BodyError::UnsupportedContentType.rejection().0,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
