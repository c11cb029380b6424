use crate::contract::ContractMessages;
use crate::domain::{Credential, Gender, UserStatus};
use crate::users_client::UsersClient;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub scenario: ScenarioSettings,
    pub contract: ContractMessages,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Secret<String>,
}

impl ApiSettings {
    pub fn credential(&self) -> Credential {
        Credential::new(self.token.clone())
    }

    pub fn client(&self) -> Result<UsersClient, reqwest::Error> {
        UsersClient::new(self.base_url.clone())
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ScenarioSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub invalid_id_factor: u64,
    pub token_corruption_suffix: String,
    pub user: UserFixtureSettings,
    pub update: UpdateFixtureSettings,
    pub unauthorized_update: UnauthorizedUpdateSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct UserFixtureSettings {
    pub name: String,
    pub email_prefix: String,
    pub email_domain: String,
    pub gender: Gender,
    pub status: UserStatus,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct UpdateFixtureSettings {
    pub name: String,
    pub status: UserStatus,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct UnauthorizedUpdateSettings {
    pub name: String,
    pub gender: Gender,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");
    let environment = parse_environment(std::env::var("APP_ENVIRONMENT").ok())?;
    let environment_filename = format!("{}.yaml", environment.as_str());
    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_API__TOKEN=abc` would set `Settings.api.token`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        // `TOKEN` is what existing `.env` files and CI secrets provide
        .set_override_option("api.token", std::env::var("TOKEN").ok())?
        .build()?;
    settings.try_deserialize::<Settings>()
}

/// Detect the running environment.
/// Default to `local` if unspecified.
fn parse_environment(raw: Option<String>) -> Result<Environment, config::ConfigError> {
    raw.unwrap_or_else(|| "local".into())
        .try_into()
        .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {}", e)))
}

/// The possible runtime environment for our suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Ci,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Ci => "ci",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "ci" => Ok(Self::Ci),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `ci`.",
                other
            )),
        }
    }
}
