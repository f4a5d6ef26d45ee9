//! Error code identifier contract tests

use bridge_types::ErrorCode;

/// Every code and the identifier it travels as
pub const GOLDEN_CODES: [(ErrorCode, &str); 5] = [
    (ErrorCode::InvalidMethod, "INVALID_METHOD"),
    (ErrorCode::InvalidArgs, "INVALID_ARGS"),
    (ErrorCode::InvalidReturn, "INVALID_RETURN"),
    (ErrorCode::RemoteTimeout, "REMOTE_TIMEOUT"),
    (ErrorCode::RemoteRuntimeError, "REMOTE_RUNTIME_ERROR"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use bridge_codec::{decode, encode_error, Envelope};
    use bridge_types::CallKey;
    use serde_json::json;

    #[test]
    fn test_code_identifiers_are_stable() {
        assert_eq!(ErrorCode::ALL.len(), GOLDEN_CODES.len(), "Error code added or removed");
        for (code, identifier) in GOLDEN_CODES {
            assert_eq!(code.as_str(), identifier);
            assert_eq!(serde_json::to_value(code).unwrap(), json!(identifier));
        }
    }

    #[test]
    fn test_codes_survive_the_wire() {
        for (code, identifier) in GOLDEN_CODES {
            let message = encode_error(code, "detail", CallKey::new(9)).unwrap();
            assert_eq!(fields(&message)["errorCode"], json!(identifier));

            match decode(&message).unwrap() {
                Some(Envelope::Error(reply)) => assert_eq!(reply.error_code, code),
                other => panic!("Expected error reply, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_code_reads_as_runtime_error() {
        let message = r#"@@BRIDGE::{"errorCode":"SOMETHING_NEW","errorMessage":"x","key":0}"#;
        match decode(message).unwrap() {
            Some(Envelope::Error(reply)) => {
                assert_eq!(reply.error_code, ErrorCode::RemoteRuntimeError)
            }
            other => panic!("Expected error reply, got {:?}", other),
        }
    }
}
