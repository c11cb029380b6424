//! In-process stand-in for the users API, mounted on a wiremock server.
//!
//! Like the real service it answers every request with HTTP 200 and puts the
//! actual outcome into the `{ code, meta, data }` envelope.
use crate::common::test_data::{AUTHENTICATION_FAILED, EMAIL_TAKEN, FIRST_FAKE_USER_ID};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use users_contract::contract::ContractMessages;
use wiremock::{Request, Respond, ResponseTemplate};

const USER_FIELDS: [&str; 4] = ["name", "email", "gender", "status"];

/// Deviations from the behaviour of the real service, used to check that the
/// suite notices them.
#[derive(Debug, Clone, Default)]
pub struct FakeBehaviour {
    pub messages: ContractMessages,
    pub reversed_errors: bool,
    pub idempotent_delete: bool,
    pub ignores_updates: bool,
    pub omits_created_id: bool,
}

#[derive(Debug)]
struct FakeState {
    next_id: u64,
    users: BTreeMap<u64, Map<String, Value>>,
}

#[derive(Debug)]
pub struct FakeUsersApi {
    token: String,
    behaviour: FakeBehaviour,
    state: Mutex<FakeState>,
}

impl FakeUsersApi {
    pub fn new(token: String, behaviour: FakeBehaviour) -> Self {
        Self {
            token,
            behaviour,
            state: Mutex::new(FakeState {
                next_id: FIRST_FAKE_USER_ID,
                users: BTreeMap::new(),
            }),
        }
    }

    fn not_found(&self) -> ResponseTemplate {
        envelope(
            404,
            json!({ "message": self.behaviour.messages.not_found_message }),
        )
    }

    fn authenticate(&self, request: &Request, required: bool) -> Result<(), ResponseTemplate> {
        let bearer = request
            .headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned);
        let query = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "access-token")
            .map(|(_, value)| value.into_owned());
        match bearer.or(query) {
            None if required => Err(envelope(401, json!({ "message": AUTHENTICATION_FAILED }))),
            None => Ok(()),
            Some(token) if token == self.token => Ok(()),
            Some(_) => Err(envelope(
                401,
                json!({ "message": self.behaviour.messages.invalid_token_message }),
            )),
        }
    }

    fn field_errors(&self, mut errors: Vec<Value>) -> ResponseTemplate {
        if self.behaviour.reversed_errors {
            errors.reverse();
        }
        envelope(422, Value::Array(errors))
    }

    fn blank_fields(&self, body: &Map<String, Value>, required: bool) -> Vec<Value> {
        USER_FIELDS
            .iter()
            .filter(|field| match body.get(**field) {
                None => required,
                Some(value) => value.as_str().is_none_or(|v| v.trim().is_empty()),
            })
            .map(|field| json!({ "field": field, "message": self.behaviour.messages.blank_message }))
            .collect()
    }

    fn create(&self, request: &Request) -> ResponseTemplate {
        if let Err(rejection) = self.authenticate(request, true) {
            return rejection;
        }
        let body = parse_body(request);
        let mut errors = self.blank_fields(&body, true);
        let mut state = self.state.lock().unwrap();
        let email_taken = state
            .users
            .values()
            .any(|user| Some(&user["email"]) == body.get("email"));
        if email_taken && errors.is_empty() {
            errors.push(json!({ "field": "email", "message": EMAIL_TAKEN }));
        }
        if !errors.is_empty() {
            return self.field_errors(errors);
        }

        let id = state.next_id;
        state.next_id += 1;
        let mut user = Map::new();
        user.insert("id".into(), Value::from(id));
        for field in USER_FIELDS {
            user.insert(field.into(), body[field].clone());
        }
        state.users.insert(id, user.clone());
        if self.behaviour.omits_created_id {
            user.remove("id");
        }
        envelope(201, Value::Object(user))
    }

    fn get(&self, request: &Request, id: u64) -> ResponseTemplate {
        if let Err(rejection) = self.authenticate(request, false) {
            return rejection;
        }
        match self.state.lock().unwrap().users.get(&id) {
            Some(user) => envelope(200, Value::Object(user.clone())),
            None => self.not_found(),
        }
    }

    fn update(&self, request: &Request, id: u64) -> ResponseTemplate {
        if let Err(rejection) = self.authenticate(request, true) {
            return rejection;
        }
        let body = parse_body(request);
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.users.get_mut(&id) else {
            return self.not_found();
        };
        let errors = self.blank_fields(&body, false);
        if !errors.is_empty() {
            return self.field_errors(errors);
        }
        if !self.behaviour.ignores_updates {
            for (field, value) in body {
                if USER_FIELDS.contains(&field.as_str()) {
                    user.insert(field, value);
                }
            }
        }
        envelope(200, Value::Object(user.clone()))
    }

    fn delete(&self, request: &Request, id: u64) -> ResponseTemplate {
        if let Err(rejection) = self.authenticate(request, true) {
            return rejection;
        }
        let removed = self.state.lock().unwrap().users.remove(&id);
        if removed.is_some() || self.behaviour.idempotent_delete {
            envelope(204, Value::Null)
        } else {
            self.not_found()
        }
    }
}

impl Respond for FakeUsersApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<&str> = request.url.path().trim_matches('/').split('/').collect();
        let id = match segments.as_slice() {
            ["users"] => None,
            ["users", id] => match id.parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => return self.not_found(),
            },
            _ => return self.not_found(),
        };
        match (request.method.as_str(), id) {
            ("POST", None) => self.create(request),
            ("GET", Some(id)) => self.get(request, id),
            ("PUT", Some(id)) => self.update(request, id),
            ("DELETE", Some(id)) => self.delete(request, id),
            _ => self.not_found(),
        }
    }
}

fn parse_body(request: &Request) -> Map<String, Value> {
    serde_json::from_slice(&request.body).unwrap_or_default()
}

pub fn envelope(code: u16, data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": code, "meta": null, "data": data }))
}
