use crate::domain::{ApiResponse, Credential, NewUser, UserId, UserUpdate};
use crate::telemetry::error_chain_fmt;
use reqwest::{Client, RequestBuilder};

/// How a request proves its identity. The API accepts both styles.
#[derive(Clone, Copy, Debug)]
pub enum Authorization<'a> {
    /// `Authorization: Bearer <token>`
    BearerHeader(&'a Credential),
    /// `?access-token=<token>`
    AccessTokenQuery(&'a Credential),
}

#[derive(thiserror::Error)]
pub enum ClientError {
    #[error("Failed to reach the users API")]
    Transport(#[from] reqwest::Error),
    #[error("The users API answered HTTP {status} with a body that is not a response envelope: {body}")]
    InvalidBody {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl std::fmt::Debug for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Clone, Debug)]
pub struct UsersClient {
    base_url: String,
    http_client: Client,
}

impl UsersClient {
    pub fn new(base_url: String) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(name = "Creating user", skip(self, authorization))]
    pub async fn create_user(
        &self,
        user: &NewUser,
        authorization: Authorization<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .post(format!("{}/users", self.base_url))
            .json(user);
        self.send(request, authorization).await
    }

    #[tracing::instrument(name = "Fetching user", skip(self, authorization))]
    pub async fn get_user(
        &self,
        id: UserId,
        authorization: Authorization<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .get(format!("{}/users/{}", self.base_url, id));
        self.send(request, authorization).await
    }

    #[tracing::instrument(name = "Updating user", skip(self, authorization))]
    pub async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        authorization: Authorization<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .put(format!("{}/users/{}", self.base_url, id))
            .json(update);
        self.send(request, authorization).await
    }

    #[tracing::instrument(name = "Deleting user", skip(self, authorization))]
    pub async fn delete_user(
        &self,
        id: UserId,
        authorization: Authorization<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .http_client
            .delete(format!("{}/users/{}", self.base_url, id));
        self.send(request, authorization).await
    }

    async fn send(
        &self,
        request: RequestBuilder,
        authorization: Authorization<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let request = match authorization {
            Authorization::BearerHeader(credential) => {
                request.bearer_auth(credential.expose_token())
            }
            Authorization::AccessTokenQuery(credential) => {
                request.query(&[("access-token", credential.expose_token())])
            }
        };
        // The request url may carry the token as a query parameter
        let response = request.send().await.map_err(reqwest::Error::without_url)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        let mut envelope: ApiResponse = serde_json::from_str(&body)
            .map_err(|source| ClientError::InvalidBody {
                status,
                body: body.clone(),
                source,
            })?;
        envelope.http_status = status;
        tracing::info!(
            http_status = status,
            code = envelope.code,
            body = %body,
            "Received response from users API"
        );
        Ok(envelope)
    }
}
