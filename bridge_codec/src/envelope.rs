//! Wire envelopes and their string encoding

use crate::CodecError;
use bridge_types::{CallKey, ErrorCode, Value};
use serde::{Deserialize, Deserializer, Serialize};

/// Marker every bridge message starts with
pub const BRIDGE_PREFIX: &str = "@@BRIDGE::";

/// A request to run `method` on the receiving side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub method: String,
    pub args: Vec<Value>,
    pub key: CallKey,
}

/// The value a method produced, addressed to the caller's key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessReply {
    pub result: Value,
    pub key: CallKey,
}

/// A failed call, addressed to the caller's key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReply {
    #[serde(deserialize_with = "lenient_code")]
    pub error_code: ErrorCode,
    pub error_message: String,
    pub key: CallKey,
}

/// Any bridge message
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Invocation(Invocation),
    Success(SuccessReply),
    Error(ErrorReply),
}

impl Envelope {
    /// Returns the correlation key this envelope carries
    pub fn key(&self) -> CallKey {
        match self {
            Envelope::Invocation(invocation) => invocation.key,
            Envelope::Success(reply) => reply.key,
            Envelope::Error(reply) => reply.key,
        }
    }

    /// Encodes this envelope into a prefixed channel message
    pub fn encode(&self) -> Result<String, CodecError> {
        match self {
            Envelope::Invocation(invocation) => {
                encode_invocation(&invocation.method, &invocation.args, invocation.key)
            }
            Envelope::Success(reply) => encode_success(&reply.result, reply.key),
            Envelope::Error(reply) => {
                encode_error(reply.error_code, &reply.error_message, reply.key)
            }
        }
    }
}

#[derive(Serialize)]
struct InvocationRef<'a> {
    method: &'a str,
    args: &'a [Value],
    key: CallKey,
}

#[derive(Serialize)]
struct SuccessRef<'a> {
    result: &'a Value,
    key: CallKey,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorRef<'a> {
    error_code: ErrorCode,
    error_message: &'a str,
    key: CallKey,
}

pub fn encode_invocation(method: &str, args: &[Value], key: CallKey) -> Result<String, CodecError> {
    prefixed(&InvocationRef { method, args, key })
}

pub fn encode_success(result: &Value, key: CallKey) -> Result<String, CodecError> {
    prefixed(&SuccessRef { result, key })
}

pub fn encode_error(
    error_code: ErrorCode,
    error_message: &str,
    key: CallKey,
) -> Result<String, CodecError> {
    prefixed(&ErrorRef {
        error_code,
        error_message,
        key,
    })
}

fn prefixed<T: Serialize>(payload: &T) -> Result<String, CodecError> {
    let body = serde_json::to_string(payload).map_err(CodecError::Encode)?;
    Ok(format!("{}{}", BRIDGE_PREFIX, body))
}

/// Converts a caller-supplied argument value into a wire argument list
///
/// Sequences (tuples, arrays, vectors) map element-wise and unit maps to no
/// arguments. Anything else, or a value whose `Serialize` impl fails, is
/// rejected as [`CodecError::InvalidArgs`].
pub fn encode_args<A: Serialize + ?Sized>(args: &A) -> Result<Vec<Value>, CodecError> {
    match serde_json::to_value(args) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(other) => Err(CodecError::InvalidArgs(format!(
            "expected a sequence of arguments, got {}",
            kind_of(&other)
        ))),
        Err(err) => Err(CodecError::InvalidArgs(err.to_string())),
    }
}

/// Decodes a channel message
///
/// Returns `Ok(None)` when the message does not carry [`BRIDGE_PREFIX`]:
/// such traffic is not ours and is never an error.
pub fn decode(message: &str) -> Result<Option<Envelope>, CodecError> {
    let Some(body) = message.strip_prefix(BRIDGE_PREFIX) else {
        return Ok(None);
    };

    let value: Value = serde_json::from_str(body).map_err(|source| CodecError::Parse {
        body: body.to_string(),
        source,
    })?;

    let Value::Object(fields) = value else {
        return Err(CodecError::Malformed(format!(
            "expected an object, got {}",
            kind_of(&value)
        )));
    };

    let envelope = if fields.contains_key("result") {
        Envelope::Success(from_fields(fields)?)
    } else if fields.contains_key("errorMessage") {
        Envelope::Error(from_fields(fields)?)
    } else {
        Envelope::Invocation(from_fields(fields)?)
    };
    Ok(Some(envelope))
}

fn from_fields<T: for<'de> Deserialize<'de>>(
    fields: serde_json::Map<String, Value>,
) -> Result<T, CodecError> {
    serde_json::from_value(Value::Object(fields)).map_err(|err| CodecError::Malformed(err.to_string()))
}

fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ErrorCode, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(ErrorCode::from_wire_lenient(&name))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
