//! Authentication Endpoints
//!
//! Login/logout against the backend plus session persistence. Logout
//! clears the local session even when the backend call fails, so the
//! client never keeps a token the user asked to discard.

use super::{ApiClient, ApiError, ApiResult, Session};
use crate::model::User;
use serde::Deserialize;
use serde_json::json;

/// Response shape of `POST auth/login`.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    user: User,
}

impl ApiClient {
    /// Authenticate and persist the returned session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Rejected {
                status: 400,
                message: "username and password must not be empty".to_string(),
            });
        }

        let response: LoginResponse = self
            .post("auth/login", &json!({ "username": username, "password": password }))
            .await?;

        let user = response.user.clone();
        self.session().store(Session {
            token: response.access_token,
            user: response.user,
        })?;

        Ok(user)
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> ApiResult<()> {
        self.post_empty(
            "auth/register",
            &json!({ "username": username, "password": password, "email": email }),
        )
        .await
    }

    /// Profile of the authenticated account, from the backend.
    pub async fn current_user(&self) -> ApiResult<User> {
        self.get("auth/me", &[]).await
    }

    /// End the session on the backend and locally.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.post_empty("auth/logout", &json!({})).await;
        // Local teardown happens regardless of the backend's answer
        self.session().clear();
        result
    }
}
