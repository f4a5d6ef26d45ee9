//! # Wire Contract Tests
//!
//! "Golden" tests for the bridge wire format, so that it doesn't drift
//! accidentally over time. Two peers built from different revisions must
//! keep understanding each other.
//!
//! ## Structure
//!
//! Each envelope kind has a module with contract tests that verify:
//! - The message prefix
//! - Field names and their spelling
//! - The exact encoded text for canonical values
//! - Error code identifiers

pub mod error_codes;
pub mod invocation;
pub mod replies;

/// Common test helpers for contract validation
pub mod test_helpers {
    use bridge_codec::BRIDGE_PREFIX;
    use serde_json::{Map, Value};

    /// Splits an encoded message into its JSON body, asserting the prefix
    pub fn body(message: &str) -> &str {
        assert!(
            message.starts_with(BRIDGE_PREFIX),
            "Prefix changed: expected '{}', got '{}'",
            BRIDGE_PREFIX,
            message
        );
        &message[BRIDGE_PREFIX.len()..]
    }

    /// Parses the body of an encoded message as a JSON object
    pub fn fields(message: &str) -> Map<String, Value> {
        match serde_json::from_str(body(message)) {
            Ok(Value::Object(fields)) => fields,
            other => panic!("Body is not a JSON object: {:?}", other),
        }
    }

    /// Verifies the object has exactly the expected field names
    pub fn verify_field_names(message: &str, expected: &[&str]) {
        let mut actual: Vec<String> = fields(message).keys().cloned().collect();
        actual.sort();
        let mut expected: Vec<String> = expected.iter().map(|name| name.to_string()).collect();
        expected.sort();
        assert_eq!(
            actual, expected,
            "Field names changed: expected {:?}, got {:?}",
            expected, actual
        );
    }
}
