//! Account endpoints and sign-out.

use super::{ApiClient, ApiError, ApiResult};
use crate::models::{Account, Credentials, TokenGrant};
use crate::session::{EndReason, SessionEnded};

impl ApiClient {
    /// Exchanges credentials for a token and stores it as the session.
    ///
    /// # Errors
    /// Returns the classified request failure; a rejected sign-in is
    /// [`super::ApiErrorKind::Unauthorized`] with the server detail.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<TokenGrant> {
        let grant: TokenGrant = self.post_json("/auth/login", credentials).await?;
        if grant.access_token.trim().is_empty() {
            return Err(ApiError::malformed(200, "empty access token"));
        }

        self.session()
            .set_session(&grant.access_token)
            .map_err(|e| ApiError::validation(format!("Failed to store session: {e:#}")))?;
        tracing::info!(email = credentials.email(), "signed in");
        Ok(grant)
    }

    /// Creates an account. Does not sign in.
    ///
    /// # Errors
    /// Returns the classified request failure (409 when the email exists).
    pub async fn register(&self, credentials: &Credentials) -> ApiResult<Account> {
        self.post_json("/auth/register", credentials).await
    }

    /// Returns the account the stored credential belongs to.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn me(&self) -> ApiResult<Account> {
        self.get_json("/auth/me").await
    }

    /// Clears the session and tells every watcher the user signed out.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn logout(&self) -> anyhow::Result<()> {
        self.session().clear_session()?;
        self.events().emit(SessionEnded {
            reason: EndReason::Logout,
        });
        Ok(())
    }
}
