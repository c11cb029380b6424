use rand::Rng;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEmail(String);

impl UserEmail {
    pub fn parse(s: String) -> Result<UserEmail, String> {
        if s.validate_email() {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid user email.", s))
        }
    }

    /// Builds `<prefix><n>@<domain>` with a random `n`, so that repeated runs
    /// against the same account rarely collide on the unique email constraint.
    pub fn random(prefix: &str, domain: &str) -> Result<UserEmail, String> {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self::parse(format!("{}{}@{}", prefix, suffix, domain))
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
