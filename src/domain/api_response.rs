use crate::domain::UserId;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Envelope returned by every endpoint: `{ "code": .., "meta": .., "data": .. }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(skip)]
    pub http_status: u16,
    pub code: u16,
    #[serde(default)]
    pub meta: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum ResponseData<'a> {
    /// A user representation.
    Resource(&'a Map<String, Value>),
    /// Validation failures, in the order the service reported them.
    FieldErrors(Vec<FieldError>),
    /// `{ "message": .. }`, used for auth and not-found failures.
    Message(&'a str),
    Empty,
    Unrecognised(&'a Value),
}

impl ResponseData<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseData::Resource(_) => "resource",
            ResponseData::FieldErrors(_) => "field error list",
            ResponseData::Message(_) => "message",
            ResponseData::Empty => "null",
            ResponseData::Unrecognised(_) => "unrecognised value",
        }
    }
}

impl ApiResponse {
    pub fn data(&self) -> ResponseData<'_> {
        match &self.data {
            Value::Null => ResponseData::Empty,
            Value::Array(entries) => {
                match serde_json::from_value::<Vec<FieldError>>(Value::Array(entries.clone())) {
                    Ok(errors) => ResponseData::FieldErrors(errors),
                    Err(_) => ResponseData::Unrecognised(&self.data),
                }
            }
            Value::Object(fields) => match (fields.get("message"), fields.contains_key("id")) {
                (Some(Value::String(message)), false) => ResponseData::Message(message.as_str()),
                _ => ResponseData::Resource(fields),
            },
            other => ResponseData::Unrecognised(other),
        }
    }

    pub fn resource_id(&self) -> Option<UserId> {
        self.data.get("id").and_then(Value::as_u64).map(UserId::new)
    }
}
