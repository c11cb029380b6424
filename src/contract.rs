//! Expected outcomes of each case and how a response is checked against them.
use crate::domain::{ApiResponse, FieldError, ResponseData, UserId};
use serde_json::{Map, Value};

/// Message texts the service uses for its failure responses.
///
/// They belong to the service version under test, so they come from
/// configuration rather than being baked into the checks.
#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContractMessages {
    pub blank_message: String,
    pub not_found_message: String,
    pub invalid_token_message: String,
}

impl Default for ContractMessages {
    fn default() -> Self {
        Self {
            blank_message: "can't be blank".into(),
            not_found_message: "Resource not found".into(),
            invalid_token_message: "Invalid token".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFieldError {
    /// `None` accepts any field name.
    pub field: Option<String>,
    pub message: String,
}

impl ExpectedFieldError {
    pub fn on(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn any_field(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    fn matches(&self, actual: &FieldError) -> bool {
        self.field.as_ref().is_none_or(|field| *field == actual.field)
            && self.message == actual.message
    }
}

impl std::fmt::Display for ExpectedFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "<any field>: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedBody {
    /// `data` holds every listed field with exactly the listed value.
    /// Extra fields (`id`, ...) are allowed.
    Echoes(Map<String, Value>),
    /// `data.id` equals the given id.
    ResourceId(UserId),
    /// `data` is a non-empty error list starting with these entries, in order.
    FieldErrors(Vec<ExpectedFieldError>),
    /// `data.message` equals the given text.
    Message(String),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedContract {
    pub code: u16,
    pub body: ExpectedBody,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ContractViolation {
    #[error("expected code {expected}, got {actual}")]
    CodeMismatch { expected: u16, actual: u16 },
    #[error("expected data to be a {expected}, got a {actual}")]
    UnexpectedShape {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("field `{0}` is missing from the response data")]
    MissingField(String),
    #[error("field `{field}` is {actual}, expected {expected}")]
    FieldMismatch {
        field: String,
        expected: Value,
        actual: Value,
    },
    #[error("expected at least one field error, the list is empty")]
    EmptyErrorList,
    #[error("expected at least {expected} field errors, got {actual}")]
    ErrorListTooShort { expected: usize, actual: usize },
    #[error("field error #{index} is `{actual}`, expected `{expected}`")]
    FieldErrorMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("message is {actual:?}, expected {expected:?}")]
    MessageMismatch { expected: String, actual: String },
    #[error("expected null data, got {0}")]
    DataNotNull(Value),
}

impl ExpectedContract {
    pub fn created(fields: Map<String, Value>) -> Self {
        Self {
            code: 201,
            body: ExpectedBody::Echoes(fields),
        }
    }

    pub fn updated(fields: Map<String, Value>) -> Self {
        Self {
            code: 200,
            body: ExpectedBody::Echoes(fields),
        }
    }

    pub fn found(id: UserId) -> Self {
        Self {
            code: 200,
            body: ExpectedBody::ResourceId(id),
        }
    }

    pub fn deleted() -> Self {
        Self {
            code: 204,
            body: ExpectedBody::Null,
        }
    }

    pub fn rejected(errors: Vec<ExpectedFieldError>) -> Self {
        Self {
            code: 422,
            body: ExpectedBody::FieldErrors(errors),
        }
    }

    pub fn not_found(messages: &ContractMessages) -> Self {
        Self {
            code: 404,
            body: ExpectedBody::Message(messages.not_found_message.clone()),
        }
    }

    pub fn unauthorized(messages: &ContractMessages) -> Self {
        Self {
            code: 401,
            body: ExpectedBody::Message(messages.invalid_token_message.clone()),
        }
    }

    pub fn verify(&self, response: &ApiResponse) -> Result<(), ContractViolation> {
        if response.code != self.code {
            return Err(ContractViolation::CodeMismatch {
                expected: self.code,
                actual: response.code,
            });
        }
        let data = response.data();
        match &self.body {
            ExpectedBody::Echoes(expected) => {
                let actual = resource(&data)?;
                for (field, value) in expected {
                    match actual.get(field) {
                        None => return Err(ContractViolation::MissingField(field.clone())),
                        Some(actual) if actual != value => {
                            return Err(ContractViolation::FieldMismatch {
                                field: field.clone(),
                                expected: value.clone(),
                                actual: actual.clone(),
                            });
                        }
                        Some(_) => {}
                    }
                }
                Ok(())
            }
            ExpectedBody::ResourceId(id) => {
                let actual = resource(&data)?;
                let actual = actual
                    .get("id")
                    .ok_or_else(|| ContractViolation::MissingField("id".into()))?;
                if actual.as_u64() != Some(id.get()) {
                    return Err(ContractViolation::FieldMismatch {
                        field: "id".into(),
                        expected: Value::from(id.get()),
                        actual: actual.clone(),
                    });
                }
                Ok(())
            }
            ExpectedBody::FieldErrors(expected) => {
                let ResponseData::FieldErrors(actual) = &data else {
                    return Err(ContractViolation::UnexpectedShape {
                        expected: "field error list",
                        actual: data.kind(),
                    });
                };
                if actual.is_empty() {
                    return Err(ContractViolation::EmptyErrorList);
                }
                if actual.len() < expected.len() {
                    return Err(ContractViolation::ErrorListTooShort {
                        expected: expected.len(),
                        actual: actual.len(),
                    });
                }
                for (index, (expected, actual)) in expected.iter().zip(actual).enumerate() {
                    if !expected.matches(actual) {
                        return Err(ContractViolation::FieldErrorMismatch {
                            index,
                            expected: expected.to_string(),
                            actual: format!("{}: {}", actual.field, actual.message),
                        });
                    }
                }
                Ok(())
            }
            ExpectedBody::Message(expected) => match data {
                ResponseData::Message(actual) if actual == expected => Ok(()),
                ResponseData::Message(actual) => Err(ContractViolation::MessageMismatch {
                    expected: expected.clone(),
                    actual: actual.to_owned(),
                }),
                other => Err(ContractViolation::UnexpectedShape {
                    expected: "message",
                    actual: other.kind(),
                }),
            },
            ExpectedBody::Null => match data {
                ResponseData::Empty => Ok(()),
                _ => Err(ContractViolation::DataNotNull(response.data.clone())),
            },
        }
    }
}

fn resource<'a>(data: &ResponseData<'a>) -> Result<&'a Map<String, Value>, ContractViolation> {
    match data {
        ResponseData::Resource(fields) => Ok(*fields),
        other => Err(ContractViolation::UnexpectedShape {
            expected: "resource",
            actual: other.kind(),
        }),
    }
}
