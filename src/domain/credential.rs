use secrecy::{ExposeSecret, Secret};

/// Bearer token used for every authenticated request of a run.
#[derive(Clone, Debug)]
pub struct Credential(Secret<String>);

impl Credential {
    pub fn new(token: Secret<String>) -> Self {
        Self(token)
    }

    /// A copy of this credential with `suffix` appended, guaranteed not to
    /// match the original token.
    pub fn corrupted(&self, suffix: &str) -> Self {
        let suffix = if suffix.is_empty() { "+" } else { suffix };
        Self(Secret::new(format!("{}{}", self.0.expose_secret(), suffix)))
    }

    pub fn expose_token(&self) -> &str {
        self.0.expose_secret()
    }
}
