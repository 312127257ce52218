//! Tests for error construction and classification.

use numerous_error::{
    ApiError, ApiErrorKind, BuilderError, BuilderErrorKind, ConfigError, HttpError, NumerousError,
    NumerousErrorKind,
};
use serde_json::json;
use strum::IntoEnumIterator;

#[test]
fn test_api_error_carries_code_reason_and_details() {
    let err = ApiError::server(503, "Service Unavailable", json!({"code": 503}));
    assert_eq!(err.kind, ApiErrorKind::Server);
    assert_eq!(err.code, 503);
    assert_eq!(err.reason, "Service Unavailable");
    assert_eq!(err.details["code"], 503);
    assert!(err.file.ends_with("error_test.rs"));
}

#[test]
fn test_relabel_keeps_code_and_details() {
    let original = ApiError::server(409, "Conflict", json!({"value": 3}));
    let conflict = original.relabel(ApiErrorKind::Conflict, "No Change");

    assert_eq!(conflict.kind, ApiErrorKind::Conflict);
    assert_eq!(conflict.code, 409);
    assert_eq!(conflict.reason, "No Change");
    assert_eq!(conflict.details, original.details);
}

#[test]
fn test_numerous_error_exposes_api_record() {
    let err: NumerousError = ApiError::auth(401, "Unauthorized", json!(null)).into();

    assert_eq!(err.code(), Some(401));
    assert!(err.is_api_kind(ApiErrorKind::Auth));
    assert!(!err.is_api_kind(ApiErrorKind::Server));
}

#[test]
fn test_non_api_errors_have_no_code() {
    let errors: Vec<NumerousError> = vec![
        HttpError::new("connection refused").into(),
        ConfigError::new("bad file").into(),
        BuilderError::new(BuilderErrorKind::MissingField("url".into())).into(),
    ];

    for err in errors {
        assert!(err.api().is_none());
        assert_eq!(err.code(), None);
    }
}

#[test]
fn test_kind_discrimination() {
    let err: NumerousError = HttpError::new("timed out").into();
    assert!(matches!(err.kind(), NumerousErrorKind::Http(_)));
    assert!(format!("{}", err).contains("timed out"));
}

#[test]
fn test_every_kind_displays_distinctly() {
    let names: Vec<String> = ApiErrorKind::iter().map(|k| k.to_string()).collect();
    assert_eq!(names.len(), 4);
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name));
    }
}

#[test]
fn test_unresolved_placeholder_names_field() {
    let err: NumerousError = BuilderError::new(BuilderErrorKind::UnresolvedPlaceholder {
        endpoint: "event".into(),
        field: "eventId".into(),
    })
    .into();
    assert!(err.to_string().contains("Endpoint event has no value for {eventId}"));
}
