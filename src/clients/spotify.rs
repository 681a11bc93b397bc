use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use log::debug;
use reqwest::{RequestBuilder, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tokio::time::{Instant, timeout_at};

use crate::clients::{
    entities::{Token, Track, TrackListing},
    errors::{Error, Result},
};

/// Environment variable holding the application client id.
pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the application client secret.
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_API_URL: &str = "https://api.spotify.com";

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TracksPage {
    items: Vec<Track>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SearchResponse {
    tracks: TracksPage,
}

/// Application credentials for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Application client id.
    pub client_id: String,
    /// Application client secret, never logged.
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from an id and a secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Resolve credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        match (non_empty(CLIENT_ID_VAR), non_empty(CLIENT_SECRET_VAR)) {
            (Some(id), Some(secret)) => Ok(Credentials::new(id, secret)),
            _ => Err(Error::ConfigurationError(format!(
                "Missing {CLIENT_ID_VAR} or {CLIENT_SECRET_VAR} in env"
            ))),
        }
    }

    /// Value of the `Authorization` header for the token exchange.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", general_purpose::STANDARD.encode(raw.as_bytes()))
    }
}

/// Base URLs of the two Spotify hosts the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyEndpoints {
    /// Host of the token endpoint.
    pub accounts_url: String,
    /// Host of the Web API.
    pub api_url: String,
}

impl Default for SpotifyEndpoints {
    fn default() -> Self {
        SpotifyEndpoints {
            accounts_url: DEFAULT_ACCOUNTS_URL.into(),
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

impl SpotifyEndpoints {
    /// Point both hosts at one base URL, e.g. a local mock server.
    pub fn with_base(base: impl Into<String>) -> Self {
        let base = base.into();
        SpotifyEndpoints {
            accounts_url: base.clone(),
            api_url: base,
        }
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url.trim_end_matches('/'))
    }

    fn search_url(&self) -> String {
        format!("{}/v1/search", self.api_url.trim_end_matches('/'))
    }
}

/// Client for the token exchange and the track search.
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: SpotifyEndpoints,
}

impl SpotifyClient {
    /// Build a client that authenticates with `credentials` against `endpoints`.
    pub fn new(credentials: Credentials, endpoints: SpotifyEndpoints) -> Self {
        SpotifyClient {
            http: reqwest::Client::new(),
            credentials,
            endpoints,
        }
    }

    /// Hosts this client talks to.
    pub fn endpoints(&self) -> &SpotifyEndpoints {
        &self.endpoints
    }

    /// Exchange the client credentials for an app-scoped bearer token.
    pub async fn request_token(&self, deadline: Instant) -> Result<Token> {
        let url = self.endpoints.token_url();
        debug!("Requesting client-credentials token from {url}");

        let request = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.credentials.basic_auth_header())
            .form(&[("grant_type", "client_credentials")]);

        let (status, body) = Self::send(request, deadline).await?;

        if status != StatusCode::OK {
            return Err(Error::AuthError { status, body });
        }

        let token: Token = serde_json::from_str(&body)?;
        debug!(
            "Obtained {} token valid for {}s",
            token.token_type, token.expires_in
        );
        Ok(token)
    }

    /// Search the catalog for tracks matching `term`, keeping upstream order.
    pub async fn search_tracks(
        &self,
        token: &str,
        term: &str,
        limit: u32,
        deadline: Instant,
    ) -> Result<TrackListing> {
        if limit == 0 {
            return Err(Error::InvalidInputError(
                "search limit must be positive".into(),
            ));
        }

        let url = self.endpoints.search_url();
        debug!("Searching tracks for {term:?} (limit {limit})");

        let limit = limit.to_string();
        let request = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", term), ("type", "track"), ("limit", limit.as_str())]);

        let (status, body) = Self::send(request, deadline).await?;

        if !status.is_success() {
            return Err(Error::SearchError { status, body });
        }

        let response: SearchResponse = serde_json::from_str(&body)?;
        debug!("Search returned {} tracks", response.tracks.items.len());
        Ok(TrackListing::new(response.tracks.items))
    }

    // Send `request` and read the whole body, bounded by `deadline`
    async fn send(request: RequestBuilder, deadline: Instant) -> Result<(StatusCode, String)> {
        timeout_at(deadline, async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, Error>((status, body))
        })
        .await?
    }
}
