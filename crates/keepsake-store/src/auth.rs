//! Identity operations against the store's auth service.
//!
//! No token refresh and no session persistence: every request to the
//! API re-verifies its bearer token here.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use keepsake_core::{Error, Result};

use crate::client::StoreClient;

/// A verified auth user as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

impl StoreClient {
    /// Exchange email/password credentials for an access token.
    ///
    /// Must be called on the anon-tier client; the service tier does
    /// not support password grants.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let response = self
            .request(self.http.post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| Error::Store(format!("sign-in request failed: {}", e)))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Unauthorized(format!("login failed: {}", body)));
        }

        response
            .json::<Session>()
            .await
            .map_err(|e| Error::Serialization(format!("session decode failed: {}", e)))
    }

    /// Verify a bearer token, returning the user it identifies.
    pub async fn get_user(&self, token: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Store(format!("token verification failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Unauthorized("invalid or expired token".into()));
        }

        response
            .json::<AuthUser>()
            .await
            .map_err(|e| Error::Serialization(format!("auth user decode failed: {}", e)))
    }

    /// Create a confirmed auth user. Service tier only.
    pub async fn admin_create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/admin/users", self.base_url);
        let response = self
            .request(self.http.post(&url))
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await
            .map_err(|e| Error::Store(format!("user creation request failed: {}", e)))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidInput(format!("user creation failed: {}", body)));
        }

        response
            .json::<AuthUser>()
            .await
            .map_err(|e| Error::Serialization(format!("auth user decode failed: {}", e)))
    }
}
