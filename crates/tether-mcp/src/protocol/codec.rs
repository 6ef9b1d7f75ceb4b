//! Strict JSON-RPC 2.0 wire codec
//!
//! Free functions for turning messages into compact UTF-8 bytes and back.
//! Encoding always emits the defined fields only; decoding validates the
//! one-of-four-shapes invariant from the JSON-RPC 2.0 specification:
//!
//! - request: `method` + `id`
//! - response: `result` + `id`
//! - error response: `error` + `id` (null id only for parse errors)
//! - notification: `method`, no `id`
//!
//! Batch arrays are rejected. Unknown extra top-level fields are ignored
//! on decode. Ids are preserved exactly as received (string vs integer).

use bytes::Bytes;
use serde_json::{Map, Value};

use super::errors::{ProtocolError, ProtocolResult};
use super::message::{
    JsonRpcError, JsonRpcMessage, JsonRpcMessageExt, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};

/// Encode a request as compact JSON bytes
pub fn encode_request(
    method: &str,
    params: Option<Value>,
    id: RequestId,
) -> ProtocolResult<Bytes> {
    validate_params(params.as_ref())?;
    Ok(JsonRpcRequest::new(method, params, id).to_bytes()?)
}

/// Encode a notification as compact JSON bytes
pub fn encode_notification(method: &str, params: Option<Value>) -> ProtocolResult<Bytes> {
    validate_params(params.as_ref())?;
    Ok(JsonRpcNotification::new(method, params).to_bytes()?)
}

/// Encode a successful response as compact JSON bytes
pub fn encode_response(id: RequestId, result: Value) -> ProtocolResult<Bytes> {
    Ok(JsonRpcResponse::success(result, id).to_bytes()?)
}

/// Encode an error response as compact JSON bytes
///
/// `id` may be `None` only when replying to an unidentifiable message.
pub fn encode_error(
    id: Option<RequestId>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> ProtocolResult<Bytes> {
    Ok(JsonRpcResponse::error(JsonRpcError::new(code, message, data), id).to_bytes()?)
}

/// Decode and validate a single JSON-RPC message from raw bytes
///
/// # Errors
///
/// - [`ProtocolError::Encoding`] when the bytes are not valid UTF-8
/// - [`ProtocolError::Parse`] when the text is not valid JSON
/// - [`ProtocolError::InvalidRequest`] when the JSON violates shape rules
pub fn decode(bytes: &[u8]) -> ProtocolResult<JsonRpcMessage> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ProtocolError::encoding(format!("message is not valid UTF-8: {e}")))?;

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ProtocolError::parse(format!("invalid JSON: {e}")))?;

    decode_value(value)
}

/// Decode and validate a single JSON-RPC message from a parsed JSON value
pub fn decode_value(value: Value) -> ProtocolResult<JsonRpcMessage> {
    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(ProtocolError::invalid_request(
                "batch arrays are not supported",
            ))
        }
        other => {
            return Err(ProtocolError::invalid_request(format!(
                "message must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == "2.0" => {}
        Some(other) => {
            return Err(ProtocolError::invalid_request(format!(
                "jsonrpc field must be \"2.0\", got {other}"
            )))
        }
        None => {
            return Err(ProtocolError::invalid_request(
                "missing required jsonrpc field",
            ))
        }
    }

    let has_method = object.contains_key("method");
    let has_result = object.contains_key("result");
    let has_error = object.contains_key("error");

    match (has_method, has_result, has_error) {
        (true, false, false) => decode_request_or_notification(object),
        (false, true, false) | (false, false, true) => decode_response(object),
        (false, false, false) => Err(ProtocolError::invalid_request(
            "message has none of method, result, or error",
        )),
        _ => Err(ProtocolError::invalid_request(
            "message mixes request and response fields",
        )),
    }
}

fn decode_request_or_notification(object: Map<String, Value>) -> ProtocolResult<JsonRpcMessage> {
    let method = match object.get("method") {
        Some(Value::String(method)) => method.clone(),
        _ => return Err(ProtocolError::invalid_request("method must be a string")),
    };

    let params = decode_params(object.get("params"))?;

    match object.get("id") {
        None => Ok(JsonRpcNotification::new(method, params).into()),
        Some(id) => {
            let id = decode_id(id)?;
            Ok(JsonRpcRequest::new(method, params, id).into())
        }
    }
}

fn decode_response(object: Map<String, Value>) -> ProtocolResult<JsonRpcMessage> {
    let id = match object.get("id") {
        None => {
            return Err(ProtocolError::invalid_request(
                "response is missing the id field",
            ))
        }
        Some(Value::Null) => None,
        Some(id) => Some(decode_id(id)?),
    };

    if let Some(result) = object.get("result") {
        return Ok(JsonRpcResponse::success(
            result.clone(),
            id.ok_or_else(|| {
                ProtocolError::invalid_request("success response must carry a non-null id")
            })?,
        )
        .into());
    }

    // has_error established by the caller
    let error_value = object
        .get("error")
        .cloned()
        .unwrap_or(Value::Null);
    let error: JsonRpcError = serde_json::from_value(error_value).map_err(|e| {
        ProtocolError::invalid_request(format!("malformed error object: {e}"))
    })?;

    Ok(JsonRpcResponse::error(error, id).into())
}

fn decode_id(id: &Value) -> ProtocolResult<RequestId> {
    match id {
        Value::String(s) => Ok(RequestId::String(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(RequestId::Number)
            .ok_or_else(|| ProtocolError::invalid_request("numeric id must be an integer")),
        other => Err(ProtocolError::invalid_request(format!(
            "id must be a string or integer, got {}",
            json_type_name(other)
        ))),
    }
}

fn decode_params(params: Option<&Value>) -> ProtocolResult<Option<Value>> {
    match params {
        None => Ok(None),
        Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(Some(value.clone())),
        Some(Value::Null) => Err(ProtocolError::invalid_request(
            "params must not be null; omit the field instead",
        )),
        Some(other) => Err(ProtocolError::invalid_request(format!(
            "params must be an object or array, got {}",
            json_type_name(other)
        ))),
    }
}

fn validate_params(params: Option<&Value>) -> ProtocolResult<()> {
    match params {
        None | Some(Value::Object(_) | Value::Array(_)) => Ok(()),
        Some(other) => Err(ProtocolError::invalid_request(format!(
            "params must be an object or array, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_request() {
        let message =
            decode(br#"{"jsonrpc":"2.0","method":"tools/list","params":{},"id":1}"#).unwrap();
        match message {
            JsonRpcMessage::Request(request) => {
                assert_eq!(request.method, "tools/list");
                assert_eq!(request.id, RequestId::Number(1));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn decode_notification() {
        let message = decode(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(message.is_notification());
    }

    #[test]
    fn decode_success_and_error_responses() {
        let message = decode(br#"{"jsonrpc":"2.0","result":{"tools":[]},"id":"a"}"#).unwrap();
        match message {
            JsonRpcMessage::Response(response) => {
                assert!(!response.is_error());
                assert_eq!(response.id, Some(RequestId::new_string("a")));
            }
            other => panic!("expected response, got {other:?}"),
        }

        let message = decode(
            br#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":2}"#,
        )
        .unwrap();
        match message {
            JsonRpcMessage::Response(response) => {
                assert_eq!(response.error.unwrap().code, -32601);
            }
            other => panic!("expected error response, got {other:?}"),
        }
    }

    #[test]
    fn decode_parse_error_response_with_null_id() {
        let message = decode(
            br#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}"#,
        )
        .unwrap();
        match message {
            JsonRpcMessage::Response(response) => assert!(response.id.is_none()),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let err = decode(&[0xff, 0xfe, b'{', b'}']).unwrap_err();
        assert!(matches!(err, ProtocolError::Encoding { .. }));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode(b"{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Parse { .. }));
    }

    #[test]
    fn decode_rejects_batch_arrays() {
        let err = decode(br#"[{"jsonrpc":"2.0","method":"ping","id":1}]"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));
    }

    #[test]
    fn decode_rejects_wrong_version() {
        let err = decode(br#"{"jsonrpc":"1.0","method":"ping","id":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));

        let err = decode(br#"{"method":"ping","id":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));
    }

    #[test]
    fn decode_rejects_null_params() {
        let err = decode(br#"{"jsonrpc":"2.0","method":"ping","params":null,"id":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));
    }

    #[test]
    fn decode_rejects_mixed_shapes() {
        let err =
            decode(br#"{"jsonrpc":"2.0","method":"ping","result":{},"id":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));

        let err = decode(
            br#"{"jsonrpc":"2.0","result":{},"error":{"code":1,"message":"x"},"id":1}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));
    }

    #[test]
    fn decode_rejects_fractional_id() {
        let err = decode(br#"{"jsonrpc":"2.0","method":"ping","id":1.5}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let message =
            decode(br#"{"jsonrpc":"2.0","method":"ping","id":1,"x-trace":"abc"}"#).unwrap();
        assert_eq!(message.method(), Some("ping"));
    }

    #[test]
    fn encode_emits_compact_json_without_newlines() {
        let bytes = encode_request(
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"text": "a\nb"}})),
            RequestId::new_number(9),
        )
        .unwrap();

        assert!(!bytes.iter().any(|&b| b == b'\n'));
        let round = decode(&bytes).unwrap();
        assert_eq!(round.method(), Some("tools/call"));
    }

    #[test]
    fn encode_rejects_scalar_params() {
        let err = encode_request("ping", Some(json!(42)), RequestId::new_number(1)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRequest { .. }));
    }

    #[test]
    fn encode_decode_round_trip_preserves_message() {
        let messages: Vec<JsonRpcMessage> = vec![
            JsonRpcRequest::new("a", Some(json!({"k": [1, 2]})), RequestId::new_string("s")).into(),
            JsonRpcNotification::new("b", None).into(),
            JsonRpcResponse::success(json!({"ok": true}), RequestId::new_number(5)).into(),
            JsonRpcResponse::error(JsonRpcError::new(-32000, "boom", Some(json!("d"))), None)
                .into(),
        ];

        for original in messages {
            let bytes = original.to_bytes().unwrap();
            let decoded = decode(&bytes).unwrap();
            assert_eq!(original, decoded);
        }
    }
}
