//! Types for the store client API

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted project (REST and auth live below it)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Public anon key sent as `apikey` on every request
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            anon_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// REST endpoint for a table
    pub fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(table)
        )
    }

    /// Auth endpoint below `/auth/v1`
    pub fn auth_url(&self, path: &str) -> String {
        format!(
            "{}/auth/v1/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Authenticated user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User ID (UUID)
    pub id: String,
    /// Login e-mail, absent for anonymous providers
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form profile data (`full_name`, `avatar_url`, ...)
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Display name from profile metadata, falling back to the e-mail local part
    pub fn display_name(&self) -> String {
        for key in ["full_name", "name", "user_name"] {
            if let Some(name) = self.user_metadata.get(key).and_then(|v| v.as_str()) {
                let name = name.trim();
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("Anonim")
            .to_string()
    }
}

/// Session issued by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for REST calls
    pub access_token: String,
    /// Token used to obtain a new access token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// The signed-in user
    pub user: AuthUser,
}

/// Password grant body
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Error body returned by the auth service
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AuthErrorBody {
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_trims_slash() {
        let config = StoreConfig {
            base_url: "https://project.example.co/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.table_url("smartphones"),
            "https://project.example.co/rest/v1/smartphones"
        );
        assert_eq!(
            config.auth_url("/token"),
            "https://project.example.co/auth/v1/token"
        );
    }

    #[test]
    fn test_display_name_fallbacks() {
        let user = AuthUser {
            id: "u1".into(),
            email: Some("budi@example.com".into()),
            user_metadata: serde_json::json!({ "full_name": "Budi Santoso" }),
        };
        assert_eq!(user.display_name(), "Budi Santoso");

        let user = AuthUser {
            user_metadata: serde_json::Value::Null,
            ..user
        };
        assert_eq!(user.display_name(), "budi");

        let user = AuthUser {
            email: None,
            ..user
        };
        assert_eq!(user.display_name(), "Anonim");
    }
}
