//! Reply envelope contract tests

// ===== Canonical Messages =====

pub const GOLDEN_SUCCESS: &str = r#"@@BRIDGE::{"result":5,"key":0}"#;

pub const GOLDEN_NULL_SUCCESS: &str = r#"@@BRIDGE::{"result":null,"key":4}"#;

pub const GOLDEN_ERROR: &str =
    r#"@@BRIDGE::{"errorCode":"REMOTE_RUNTIME_ERROR","errorMessage":"[Error]: boom","key":1}"#;

// ===== Contract Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use bridge_codec::{decode, encode_error, encode_success, Envelope, ErrorReply, SuccessReply};
    use bridge_types::{CallKey, ErrorCode, Value};
    use serde_json::json;

    #[test]
    fn test_success_encoding_is_stable() {
        assert_eq!(encode_success(&json!(5), CallKey::new(0)).unwrap(), GOLDEN_SUCCESS);
        assert_eq!(
            encode_success(&Value::Null, CallKey::new(4)).unwrap(),
            GOLDEN_NULL_SUCCESS
        );
        verify_field_names(GOLDEN_SUCCESS, &["result", "key"]);
    }

    #[test]
    fn test_null_result_is_still_a_success() {
        assert_eq!(
            decode(GOLDEN_NULL_SUCCESS).unwrap(),
            Some(Envelope::Success(SuccessReply {
                result: Value::Null,
                key: CallKey::new(4),
            }))
        );
    }

    #[test]
    fn test_error_encoding_is_stable() {
        let message =
            encode_error(ErrorCode::RemoteRuntimeError, "[Error]: boom", CallKey::new(1)).unwrap();
        assert_eq!(message, GOLDEN_ERROR);
        verify_field_names(GOLDEN_ERROR, &["errorCode", "errorMessage", "key"]);
    }

    #[test]
    fn test_golden_error_decodes() {
        assert_eq!(
            decode(GOLDEN_ERROR).unwrap(),
            Some(Envelope::Error(ErrorReply {
                error_code: ErrorCode::RemoteRuntimeError,
                error_message: "[Error]: boom".to_string(),
                key: CallKey::new(1),
            }))
        );
    }

    #[test]
    fn test_result_field_wins_over_error_fields() {
        let both = r#"@@BRIDGE::{"result":1,"errorCode":"INVALID_ARGS","errorMessage":"x","key":2}"#;
        assert!(matches!(decode(both).unwrap(), Some(Envelope::Success(_))));
    }
}
