use std::sync::Arc;

use log::{info, warn};

use crate::{
    api::{ApiError, AtlasApi, UserSummary},
    context::SessionStore,
};

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },
}

/// Login, registration and logout against the shared session cache.
pub struct AuthService<A: AtlasApi> {
    api: Arc<A>,
    session: Arc<SessionStore>,
}

impl<A: AtlasApi> AuthService<A> {
    pub fn new(api: Arc<A>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Exchanges credentials for a token and stores it in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self.api.login(email, password).await {
            Ok(token) => {
                self.session.store_token(token.access_token);
                info!("Logged in as {}", email);
                Ok(())
            }
            Err(source) => {
                warn!("Login for {} rejected: {}", email, source);
                Err(AuthError::Rejected {
                    message: source.user_message(LOGIN_FAILED),
                    source,
                })
            }
        }
    }

    /// Creates an account. Does not log in.
    pub async fn register(&self, email: &str, password: &str) -> Result<UserSummary, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        self.api
            .register(email, password)
            .await
            .map(|user| {
                info!("Registered {}", user.email);
                user
            })
            .map_err(|source| {
                warn!("Registration for {} failed: {}", email, source);
                AuthError::Rejected {
                    message: source.user_message(REGISTER_FAILED),
                    source,
                }
            })
    }

    pub fn logout(&self) {
        self.session.clear();
        info!("Logged out");
    }
}
