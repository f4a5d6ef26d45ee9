//! Invocation envelope contract tests

// ===== Canonical Messages =====

/// `add(2, 3)` sent as the first call of a session
pub const GOLDEN_ADD: &str = r#"@@BRIDGE::{"method":"add","args":[2,3],"key":0}"#;

/// A call without arguments
pub const GOLDEN_NO_ARGS: &str = r#"@@BRIDGE::{"method":"ping","args":[],"key":17}"#;

// ===== Contract Tests =====
