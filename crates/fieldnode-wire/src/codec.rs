//! Envelope codec
//!
//! Envelope = JSON object with six `msg*` fields. Encoding is
//! deterministic: object keys are emitted in sorted order. Decoding is
//! tolerant of what the coordinator actually sends (null targets, missing
//! payloads) and strict about shape violations.

use fieldnode_core::{
    DecodeError, Envelope, MessageType, Payload, PayloadValue, MAX_PAYLOAD_DEPTH,
};
use serde_json::{Map, Number, Value};

pub const FIELD_ID: &str = "msgID";
pub const FIELD_TYPE: &str = "msgType";
pub const FIELD_SOURCE: &str = "msgSource";
pub const FIELD_TARGET: &str = "msgTarget";
pub const FIELD_TIMESTAMP: &str = "msgTimestamp";
pub const FIELD_PAYLOAD: &str = "msgPayload";

/// Serialize an envelope to its wire bytes
///
/// Non-finite floats have no JSON representation and are written as `null`;
/// the decoder drops `null` payload entries.
pub fn encode(envelope: &Envelope) -> Vec<u8> {
    let mut obj = Map::new();
    obj.insert(FIELD_ID.into(), Value::String(envelope.id.clone()));
    obj.insert(
        FIELD_TYPE.into(),
        Value::String(envelope.message_type.as_wire().to_string()),
    );
    obj.insert(FIELD_SOURCE.into(), Value::String(envelope.source.clone()));
    obj.insert(FIELD_TARGET.into(), Value::String(envelope.target.clone()));
    obj.insert(
        FIELD_TIMESTAMP.into(),
        Value::String(envelope.timestamp.clone()),
    );
    obj.insert(FIELD_PAYLOAD.into(), payload_to_value(&envelope.payload));

    Value::Object(obj).to_string().into_bytes()
}

/// Parse wire bytes into an envelope
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let Value::Object(mut obj) = value else {
        return Err(DecodeError::Malformed(format!(
            "frame is {}, expected object",
            json_kind(&value)
        )));
    };

    let message_type = match obj.remove(FIELD_TYPE) {
        None | Some(Value::Null) => return Err(DecodeError::MissingField(FIELD_TYPE)),
        Some(Value::String(tag)) => MessageType::from_wire(&tag),
        Some(other) => {
            return Err(DecodeError::Malformed(format!(
                "{} is {}, expected string",
                FIELD_TYPE,
                json_kind(&other)
            )))
        }
    };

    let id = header_string(&mut obj, FIELD_ID)?;
    let source = header_string(&mut obj, FIELD_SOURCE)?;
    let target = header_string(&mut obj, FIELD_TARGET)?;
    let timestamp = header_string(&mut obj, FIELD_TIMESTAMP)?;

    let payload = match obj.remove(FIELD_PAYLOAD) {
        None | Some(Value::Null) => Payload::new(),
        Some(Value::Object(map)) => payload_from_map(map, 1)?,
        Some(other) => {
            return Err(DecodeError::Malformed(format!(
                "{} is {}, expected object",
                FIELD_PAYLOAD,
                json_kind(&other)
            )))
        }
    };

    Ok(Envelope {
        id,
        message_type,
        source,
        target,
        timestamp,
        payload,
    })
}

/// Absent and `null` header fields read as the empty string
fn header_string(obj: &mut Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    match obj.remove(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DecodeError::Malformed(format!(
            "{} is {}, expected string",
            field,
            json_kind(&other)
        ))),
    }
}

fn payload_from_map(map: Map<String, Value>, depth: usize) -> Result<Payload, DecodeError> {
    if depth > MAX_PAYLOAD_DEPTH {
        return Err(DecodeError::Malformed(format!(
            "payload nested deeper than {} levels",
            MAX_PAYLOAD_DEPTH
        )));
    }

    let mut payload = Payload::new();
    for (key, value) in map {
        let value = match value {
            Value::Null => continue,
            Value::Bool(b) => PayloadValue::Bool(b),
            Value::Number(n) => number_value(&n),
            Value::String(s) => PayloadValue::Str(s),
            Value::Object(inner) => PayloadValue::Map(payload_from_map(inner, depth + 1)?),
            Value::Array(_) => {
                return Err(DecodeError::Malformed(format!(
                    "payload field '{}' is an array",
                    key
                )))
            }
        };
        payload.insert(key, value);
    }
    Ok(payload)
}

fn number_value(n: &Number) -> PayloadValue {
    match n.as_i64() {
        Some(i) => PayloadValue::Int(i),
        // Integers beyond i64 and all fractional numbers
        None => PayloadValue::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn payload_to_value(payload: &Payload) -> Value {
    let map: Map<String, Value> = payload
        .iter()
        .map(|(key, value)| (key.clone(), payload_value_to_json(value)))
        .collect();
    Value::Object(map)
}

fn payload_value_to_json(value: &PayloadValue) -> Value {
    match value {
        PayloadValue::Str(s) => Value::String(s.clone()),
        PayloadValue::Int(i) => Value::Number((*i).into()),
        PayloadValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        PayloadValue::Bool(b) => Value::Bool(*b),
        PayloadValue::Map(m) => payload_to_value(m),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
