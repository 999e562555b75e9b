//! Tests for transform error types

use super::*;

#[test]
fn test_error_creation() {
    let err = TransformError::failed("route table poisoned");
    assert!(matches!(err, TransformError::TransformFailed(_)));

    let err = TransformError::config("unknown attribute");
    assert!(matches!(err, TransformError::Config(_)));
}

#[test]
fn test_error_display() {
    let err = TransformError::failed("logic error");
    assert_eq!(err.to_string(), "transform failed: logic error");

    let err = TransformError::config("invalid glob");
    assert_eq!(err.to_string(), "invalid configuration: invalid glob");
}
