use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use diary_sync_config::{StoredToken, TokenStore, TraktConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Create a reqwest Client identifying this tool
pub fn create_trakt_client() -> Client {
    Client::builder()
        .user_agent(concat!("diarysync/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
}

impl TokenResponse {
    fn into_stored(self, now: DateTime<Utc>) -> Result<StoredToken, AuthError> {
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(AuthError::InvalidExpiry {
                expires_in: self.expires_in,
            })?;
        Ok(StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            scope: self.scope,
            expires_in: Some(self.expires_in),
            created_at: Some(self.created_at.unwrap_or_else(|| now.timestamp())),
            expires_at: Some(expires_at.timestamp() as f64),
        })
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

/// Hands out a valid Trakt access token, refreshing the stored pair when it
/// has expired.
pub struct TokenManager {
    client: Arc<Client>,
    token_url: String,
    authorize_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    store: TokenStore,
}

impl TokenManager {
    pub fn new(config: &TraktConfig, store: TokenStore) -> Self {
        Self {
            client: Arc::new(create_trakt_client()),
            token_url: format!("{}/oauth/token", config.api_url.trim_end_matches('/')),
            authorize_url: config.authorize_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            store,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Current access token. An expired token is refreshed and the new pair
    /// written back before returning; a failed refresh leaves the file as it was.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let stored = self
            .store
            .load()?
            .ok_or_else(|| AuthError::MissingToken {
                path: self.store.path().to_path_buf(),
            })?;

        let state = stored.to_state();
        if !state.is_expired_at(Utc::now()) {
            debug!(
                operation = "token",
                expires_at = %state.expires_at,
                "Using saved Trakt access token"
            );
            return Ok(state.access_token);
        }

        info!(
            operation = "token_refresh",
            expired_at = %state.expires_at,
            "Trakt access token expired, refreshing"
        );
        let refreshed = self.refresh(&state.refresh_token).await?;
        Ok(refreshed.access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError> {
        let request = TokenRequest {
            code: None,
            refresh_token: Some(refresh_token),
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "refresh_token",
        };

        let token = self.request_token(&request).await?;
        self.store.save(&token)?;
        info!(operation = "token_refresh", "Token refreshed successfully");
        Ok(token)
    }

    /// Page the user opens to approve the app and obtain a code
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri)
        )
    }

    /// Trade an authorization code for a token pair and persist it
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::EmptyCode);
        }

        let request = TokenRequest {
            code: Some(code),
            refresh_token: None,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        };

        let token = self.request_token(&request).await?;
        self.store.save(&token)?;
        info!(
            operation = "token_exchange",
            path = %self.store.path().display(),
            "Saved Trakt token"
        );
        Ok(token)
    }

    async fn request_token(&self, request: &TokenRequest<'_>) -> Result<StoredToken, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                operation = request.grant_type,
                status = status.as_u16(),
                "Token request rejected"
            );
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await.map_err(AuthError::Transport)?;
        token.into_stored(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(api_url: &str, token_file: &Path) -> TokenManager {
        let config = TraktConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            api_url: api_url.to_string(),
            ..TraktConfig::default()
        };
        TokenManager::new(&config, TokenStore::new(token_file.to_path_buf()))
    }

    fn write_token(path: &Path, expires_at: DateTime<Utc>) {
        let token = StoredToken {
            access_token: "old-access".to_string(),
            refresh_token: "old-refresh".to_string(),
            token_type: Some("bearer".to_string()),
            scope: None,
            expires_in: None,
            created_at: None,
            expires_at: Some(expires_at.timestamp() as f64),
        };
        TokenStore::new(path.to_path_buf()).save(&token).unwrap();
    }

    fn refreshed_body() -> serde_json::Value {
        json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "expires_in": 7776000,
            "token_type": "bearer",
            "scope": "public",
            "created_at": 1700000000
        })
    }

    #[tokio::test]
    async fn test_valid_token_is_not_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");
        write_token(&file, Utc::now() + Duration::days(30));

        let token = manager(&server.uri(), &file).access_token().await.unwrap();
        assert_eq!(token, "old-access");
    }

    #[tokio::test]
    async fn test_expiry_derived_from_created_at_is_honoured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");
        std::fs::write(
            &file,
            json!({
                "access_token": "old-access",
                "refresh_token": "old-refresh",
                "created_at": Utc::now().timestamp(),
                "expires_in": 3600
            })
            .to_string(),
        )
        .unwrap();

        let token = manager(&server.uri(), &file).access_token().await.unwrap();
        assert_eq!(token, "old-access");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({
                "grant_type": "refresh_token",
                "refresh_token": "old-refresh",
                "client_id": "client-id",
                "client_secret": "client-secret",
                "redirect_uri": "urn:ietf:wg:oauth:2.0:oob"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");
        write_token(&file, Utc::now() - Duration::hours(1));

        let manager = manager(&server.uri(), &file);
        let token = manager.access_token().await.unwrap();
        assert_eq!(token, "new-access");

        let saved = manager.store().load().unwrap().unwrap();
        assert_eq!(saved.access_token, "new-access");
        assert_eq!(saved.refresh_token, "new-refresh");
        assert!(saved.expiry().unwrap() > Utc::now() + Duration::days(89));

        // The saved pair is now valid, so no second refresh
        assert_eq!(manager.access_token().await.unwrap(), "new-access");
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_file_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");
        write_token(&file, Utc::now() - Duration::hours(1));
        let before = std::fs::read(&file).unwrap();

        let err = manager(&server.uri(), &file).access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
        assert_eq!(std::fs::read(&file).unwrap(), before);
    }

    #[tokio::test]
    async fn test_refresh_with_unusable_lifetime_is_rejected() {
        let server = MockServer::start().await;
        let mut body = refreshed_body();
        body["expires_in"] = json!(1_000_000_000_000_000_i64);
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");
        write_token(&file, Utc::now() - Duration::hours(1));
        let before = std::fs::read(&file).unwrap();

        let err = manager(&server.uri(), &file).access_token().await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidExpiry {
                expires_in: 1_000_000_000_000_000
            }
        ));
        assert_eq!(std::fs::read(&file).unwrap(), before);
    }

    #[test]
    fn test_token_response_lifetime_bounds() {
        let now = Utc::now();
        let response = |expires_in: i64| TokenResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in,
            token_type: None,
            scope: None,
            created_at: None,
        };

        let stored = response(3600).into_stored(now).unwrap();
        assert_eq!(stored.expires_at, Some((now.timestamp() + 3600) as f64));
        assert!(matches!(
            response(i64::MAX).into_stored(now),
            Err(AuthError::InvalidExpiry { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");

        let err = manager("http://127.0.0.1:9", &file)
            .access_token()
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken { .. }));
    }

    #[tokio::test]
    async fn test_exchange_code_saves_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({
                "grant_type": "authorization_code",
                "code": "abc123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trakt_token.json");
        let manager = manager(&server.uri(), &file);

        let token = manager.exchange_code("  abc123\n").await.unwrap();
        assert_eq!(token.access_token, "new-access");
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_code() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager("http://127.0.0.1:9", &dir.path().join("t.json"));
        let err = manager.exchange_code("   ").await.unwrap_err();
        assert!(matches!(err, AuthError::EmptyCode));
    }

    #[test]
    fn test_authorize_url() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager("https://api.trakt.tv", &dir.path().join("t.json"));
        assert_eq!(
            manager.authorize_url(),
            "https://trakt.tv/oauth/authorize?response_type=code&client_id=client-id&redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"
        );
    }
}
