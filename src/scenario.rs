//! The ordered create → read → update → delete run against the users resource.
//!
//! Later groups depend on the user created by the first one, so the groups are
//! not independent tests: `UsersScenario::run` drives them in order and hands
//! the created id from one group to the next.
use crate::configuration::{ScenarioSettings, Settings};
use crate::contract::{ContractMessages, ContractViolation, ExpectedContract, ExpectedFieldError};
use crate::domain::{Credential, NewUser, UserEmail, UserId, UserUpdate};
use crate::telemetry::error_chain_fmt;
use crate::users_client::{Authorization, ClientError, UsersClient};

pub const CREATE_VALID_USER: &str = "creates a user from valid data";
pub const CREATE_BLANK_USER: &str = "rejects a user with blank name and email";
pub const GET_EXISTING_USER: &str = "fetches the created user by id";
pub const GET_MISSING_USER: &str = "reports an unknown id as not found";
pub const UPDATE_USER: &str = "updates the created user";
pub const UPDATE_WITH_INVALID_TOKEN: &str = "rejects an update with an invalid token";
pub const UPDATE_WITH_BLANK_NAME: &str = "rejects an update with a blank name";
pub const DELETE_USER: &str = "deletes the created user";
pub const DELETE_DELETED_USER: &str = "reports a repeated delete as not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Create,
    Read,
    Update,
    Delete,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Create => "POST users",
            Group::Read => "GET users/{id}",
            Group::Update => "PUT users/{id}",
            Group::Delete => "DELETE users/{id}",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(thiserror::Error)]
pub enum CaseFailure {
    #[error("The request to the users API failed")]
    Transport(#[from] ClientError),
    #[error("The response does not match the expected contract")]
    Contract(#[from] ContractViolation),
    #[error("No user was created earlier in the run, so there is no id to use")]
    MissingFixture,
    #[error("The request payload could not be built: {0}")]
    InvalidPayload(String),
}

impl std::fmt::Debug for CaseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug)]
pub struct CaseOutcome {
    pub group: Group,
    pub case: &'static str,
    pub result: Result<(), CaseFailure>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Pass/fail result of every case, in execution order.
#[derive(Debug, Default)]
pub struct ScenarioReport {
    outcomes: Vec<CaseOutcome>,
}

impl ScenarioReport {
    fn record(&mut self, group: Group, case: &'static str, result: Result<(), CaseFailure>) {
        match &result {
            Ok(()) => tracing::info!(group = %group, case, "Case passed"),
            Err(error) => tracing::error!(
                group = %group,
                case,
                error.cause_chain = ?error,
                error.message = %error,
                "Case failed"
            ),
        }
        self.outcomes.push(CaseOutcome {
            group,
            case,
            result,
        });
    }

    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, case: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|outcome| outcome.case == case)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed())
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.passed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }
}

impl std::fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(()) => writeln!(f, "PASS  {} :: {}", outcome.group, outcome.case)?,
                Err(error) => {
                    write!(f, "FAIL  {} :: {}\n{:?}", outcome.group, outcome.case, error)?
                }
            }
        }
        write!(
            f,
            "{} passed, {} failed",
            self.passed_count(),
            self.outcomes.len() - self.passed_count()
        )
    }
}

pub struct UsersScenario {
    client: UsersClient,
    credential: Credential,
    settings: ScenarioSettings,
    messages: ContractMessages,
}

impl UsersScenario {
    pub fn new(
        client: UsersClient,
        credential: Credential,
        settings: ScenarioSettings,
        messages: ContractMessages,
    ) -> Self {
        Self {
            client,
            credential,
            settings,
            messages,
        }
    }

    pub fn build(configuration: Settings) -> Result<Self, reqwest::Error> {
        let client = configuration.api.client()?;
        let credential = configuration.api.credential();
        Ok(Self::new(
            client,
            credential,
            configuration.scenario,
            configuration.contract,
        ))
    }

    #[tracing::instrument(name = "Running users contract scenario", skip(self), fields(base_url = %self.client.base_url()))]
    pub async fn run(&self) -> ScenarioReport {
        let mut report = ScenarioReport::default();
        let fixture = self.create_group(&mut report).await;
        self.read_group(fixture, &mut report).await;
        self.update_group(fixture, &mut report).await;
        self.delete_group(fixture, &mut report).await;
        report
    }

    /// Runs the create cases and returns the id of the user they created.
    pub async fn create_group(&self, report: &mut ScenarioReport) -> Option<UserId> {
        let created = self.create_valid_user().await;
        let fixture = created.as_ref().ok().copied();
        report.record(Group::Create, CREATE_VALID_USER, created.map(|_| ()));
        report.record(
            Group::Create,
            CREATE_BLANK_USER,
            self.create_blank_user().await,
        );
        fixture
    }

    pub async fn read_group(&self, fixture: Option<UserId>, report: &mut ScenarioReport) {
        report.record(
            Group::Read,
            GET_EXISTING_USER,
            self.get_existing_user(fixture).await,
        );
        report.record(
            Group::Read,
            GET_MISSING_USER,
            self.get_missing_user(fixture).await,
        );
    }

    pub async fn update_group(&self, fixture: Option<UserId>, report: &mut ScenarioReport) {
        report.record(Group::Update, UPDATE_USER, self.update_user(fixture).await);
        report.record(
            Group::Update,
            UPDATE_WITH_INVALID_TOKEN,
            self.update_with_invalid_token(fixture).await,
        );
        report.record(
            Group::Update,
            UPDATE_WITH_BLANK_NAME,
            self.update_with_blank_name(fixture).await,
        );
    }

    pub async fn delete_group(&self, fixture: Option<UserId>, report: &mut ScenarioReport) {
        report.record(Group::Delete, DELETE_USER, self.delete_user(fixture).await);
        // Same request again, the user is gone by now
        report.record(
            Group::Delete,
            DELETE_DELETED_USER,
            self.delete_deleted_user(fixture).await,
        );
    }

    #[tracing::instrument(name = "Creating a valid user", skip(self), err)]
    async fn create_valid_user(&self) -> Result<UserId, CaseFailure> {
        let fixture = &self.settings.user;
        let email = UserEmail::random(&fixture.email_prefix, &fixture.email_domain)
            .map_err(CaseFailure::InvalidPayload)?;
        let user = NewUser::new(fixture.name.clone(), &email, fixture.gender, fixture.status);
        let response = self
            .client
            .create_user(&user, Authorization::BearerHeader(&self.credential))
            .await?;
        ExpectedContract::created(user.fields()).verify(&response)?;
        let id = response
            .resource_id()
            .ok_or_else(|| ContractViolation::MissingField("id".into()))?;
        Ok(id)
    }

    #[tracing::instrument(name = "Creating a blank user", skip(self), err)]
    async fn create_blank_user(&self) -> Result<(), CaseFailure> {
        let fixture = &self.settings.user;
        let user = NewUser::blank(fixture.gender, fixture.status);
        let response = self
            .client
            .create_user(&user, Authorization::BearerHeader(&self.credential))
            .await?;
        let blank = &self.messages.blank_message;
        ExpectedContract::rejected(vec![
            ExpectedFieldError::on("name", blank.as_str()),
            ExpectedFieldError::on("email", blank.as_str()),
        ])
        .verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetching the created user", skip(self), err)]
    async fn get_existing_user(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture.ok_or(CaseFailure::MissingFixture)?;
        let response = self
            .client
            .get_user(id, Authorization::AccessTokenQuery(&self.credential))
            .await?;
        ExpectedContract::found(id).verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetching an unknown user", skip(self), err)]
    async fn get_missing_user(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture
            .ok_or(CaseFailure::MissingFixture)?
            .scaled(self.settings.invalid_id_factor);
        let response = self
            .client
            .get_user(id, Authorization::AccessTokenQuery(&self.credential))
            .await?;
        ExpectedContract::not_found(&self.messages).verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Updating the created user", skip(self), err)]
    async fn update_user(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture.ok_or(CaseFailure::MissingFixture)?;
        let update = UserUpdate::default()
            .name(self.settings.update.name.as_str())
            .status(self.settings.update.status);
        let response = self
            .client
            .update_user(id, &update, Authorization::BearerHeader(&self.credential))
            .await?;
        ExpectedContract::updated(update.fields()).verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Updating with an invalid token", skip(self), err)]
    async fn update_with_invalid_token(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture.ok_or(CaseFailure::MissingFixture)?;
        let update = UserUpdate::default()
            .name(self.settings.unauthorized_update.name.as_str())
            .gender(self.settings.unauthorized_update.gender);
        let invalid = self
            .credential
            .corrupted(&self.settings.token_corruption_suffix);
        let response = self
            .client
            .update_user(id, &update, Authorization::BearerHeader(&invalid))
            .await?;
        ExpectedContract::unauthorized(&self.messages).verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Updating with a blank name", skip(self), err)]
    async fn update_with_blank_name(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture.ok_or(CaseFailure::MissingFixture)?;
        let update = UserUpdate::default()
            .name("")
            .status(self.settings.update.status);
        let response = self
            .client
            .update_user(id, &update, Authorization::BearerHeader(&self.credential))
            .await?;
        ExpectedContract::rejected(vec![ExpectedFieldError::any_field(
            self.messages.blank_message.as_str(),
        )])
        .verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Deleting the created user", skip(self), err)]
    async fn delete_user(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture.ok_or(CaseFailure::MissingFixture)?;
        let response = self
            .client
            .delete_user(id, Authorization::BearerHeader(&self.credential))
            .await?;
        ExpectedContract::deleted().verify(&response)?;
        Ok(())
    }

    #[tracing::instrument(name = "Deleting the user again", skip(self), err)]
    async fn delete_deleted_user(&self, fixture: Option<UserId>) -> Result<(), CaseFailure> {
        let id = fixture.ok_or(CaseFailure::MissingFixture)?;
        let response = self
            .client
            .delete_user(id, Authorization::BearerHeader(&self.credential))
            .await?;
        ExpectedContract::not_found(&self.messages).verify(&response)?;
        Ok(())
    }
}
