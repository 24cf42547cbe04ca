use tuition_auth::auth::{AuthPayload, AuthUser, LoginRequest, LOGIN_PATH, LOGOUT_PATH, PROBE_PATH};

use crate::http::{ApiClient, ApiError, ApiRequest};
use crate::validation::Checks;

/// Signs the session in and out. The cookies set by the API are picked up
/// by the client's jar on the way.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, ApiError> {
        let email = email.trim();
        Checks::default()
            .required("email", email)
            .email("email", Some(email))
            .required("password", password)
            .finish()?;

        let session = self.client.session();
        // a rejected login must not count as an expired session
        session.navigate(session.settings().login_route.clone());

        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = self
            .client
            .fetch::<AuthPayload>(ApiRequest::post(LOGIN_PATH).json(&body)?)
            .await?
            .into_user();

        log::info!("Signed in as {} ({})", user.name, user.role);
        session.set_user(Some(user.clone()));
        session.navigate("/");
        Ok(user)
    }

    /// The local session is dropped whatever the API answers.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.client.execute(ApiRequest::post(LOGOUT_PATH)).await;
        let session = self.client.session();
        session.clear();
        session.navigate(session.settings().login_route.clone());
        if let Err(err) = &result {
            log::warn!("Logout failed on the server: {}", err);
        }
        result
    }

    /// Who the API thinks is signed in. `None` when the session is not
    /// (or no longer) valid.
    pub async fn probe(&self) -> Result<Option<AuthUser>, ApiError> {
        let session = self.client.session();
        match self.client.fetch::<AuthPayload>(ApiRequest::get(PROBE_PATH)).await {
            Ok(payload) => {
                let user = payload.into_user();
                session.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(ApiError::Unauthorized { .. }) => {
                session.set_user(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
