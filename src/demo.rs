use std::io::Write;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::Instant;

use crate::cadence;
use crate::clients::{
    errors::{Error, Result},
    spotify::{Credentials, SpotifyClient, SpotifyEndpoints},
};

/// Search term used when none is given.
pub const DEFAULT_QUERY: &str = "Daft Punk";
/// Number of tracks listed when no limit is given.
pub const DEFAULT_LIMIT: u32 = 5;
/// Height in meters for the default cadence estimate.
pub const DEFAULT_HEIGHT_M: f64 = 1.75;
/// 6 mph.
pub const DEFAULT_SPEED_MPS: f64 = 2.68224;
/// Deadline shared by the token and search requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Input to the cadence estimate printed at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gait {
    /// Height in meters.
    pub height_m: f64,
    /// Speed in meters per second.
    pub speed_mps: f64,
}

impl Default for Gait {
    fn default() -> Self {
        Gait {
            height_m: DEFAULT_HEIGHT_M,
            speed_mps: DEFAULT_SPEED_MPS,
        }
    }
}

/// Configuration for the [`Demo`] struct
pub struct Config {
    /// Authenticated API client.
    pub spotify: SpotifyClient,
    /// Free-text search term.
    pub query: String,
    /// Number of tracks to list, at least 1.
    pub limit: u32,
    /// Input to the cadence estimate.
    pub gait: Gait,
    /// Deadline for both requests, counted from the start of the run.
    pub timeout: Duration,
}

/// Assembles a [`Config`], falling back to defaults and the environment.
pub struct ConfigBuilder {
    credentials: Option<Credentials>,
    endpoints: Option<SpotifyEndpoints>,
    query: Option<String>,
    limit: Option<u32>,
    gait: Option<Gait>,
    timeout: Option<Duration>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Builder with nothing set.
    pub fn new() -> Self {
        Self {
            credentials: None, // Read from the environment when not set
            endpoints: None,
            query: None,
            limit: None,
            gait: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn endpoints(mut self, endpoints: SpotifyEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn gait(mut self, gait: Gait) -> Self {
        self.gait = Some(gait);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the config, reading credentials from the process environment
    /// when none were set.
    pub fn build(self) -> Result<Config> {
        self.build_with_env(|key| std::env::var(key).ok())
    }

    /// Like [`ConfigBuilder::build`], resolving missing credentials through `lookup`.
    ///
    /// Fails with [`Error::ConfigurationError`] when either credential is
    /// missing, before any client exists.
    pub fn build_with_env<F>(self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match self.credentials {
            Some(c) => c,
            None => Credentials::from_lookup(lookup)?,
        };
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(Error::InvalidInputError(
                "search limit must be at least 1".into(),
            ));
        }
        Ok(Config {
            spotify: SpotifyClient::new(credentials, self.endpoints.unwrap_or_default()),
            query: self.query.unwrap_or_else(|| DEFAULT_QUERY.to_string()),
            limit,
            gait: self.gait.unwrap_or_default(),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// Runs token exchange, search and the cadence estimate in sequence
pub struct Demo {
    config: Config,
}

impl Demo {
    /// Wrap a built [`Config`].
    pub fn new(config: Config) -> Self {
        Demo { config }
    }

    /// Write the run's console output to `out`.
    ///
    /// A failed token exchange is reported and ends the run without an
    /// error. A failed search is reported and the cadence estimate is still
    /// printed.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = &self.config;
        // One deadline covers both requests
        let deadline = Instant::now() + config.timeout;

        info!("Requesting access token ...");
        let token = match config.spotify.request_token(deadline).await {
            Ok(token) => token,
            Err(e) => {
                error!("Token request failed: {e}");
                writeln!(out, "Token fetch failed: {e}")?;
                return Ok(());
            }
        };
        writeln!(out, "token length: {}", token.access_token.len())?;
        writeln!(out, "expires_in (sec): {}", token.expires_in)?;

        info!("Searching tracks for {:?} ...", config.query);
        match config
            .spotify
            .search_tracks(&token.access_token, &config.query, config.limit, deadline)
            .await
        {
            Ok(listing) => {
                debug!("Printing {} tracks", listing.tracks.len());
                for line in listing.lines() {
                    writeln!(out, "{line}")?;
                }
            }
            Err(e) => {
                warn!("Search failed: {e}");
                writeln!(out, "API call failed: {e}")?;
            }
        }

        let estimate = cadence::estimate(config.gait.height_m, config.gait.speed_mps)?;
        writeln!(out, "{estimate}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const TOKEN_BODY: &str = r#"{"access_token":"tok-123","expires_in":3600,"token_type":"Bearer"}"#;

    fn demo_for(server: &MockServer) -> Demo {
        let config = ConfigBuilder::new()
            .credentials(Credentials::new("id", "secret"))
            .endpoints(SpotifyEndpoints::with_base(server.base_url()))
            .build()
            .unwrap();
        Demo::new(config)
    }

    async fn run_to_string(demo: &Demo) -> (Result<()>, String) {
        let mut out = Vec::new();
        let res = demo.run(&mut out).await;
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn builder_defaults() {
        let config = ConfigBuilder::new()
            .credentials(Credentials::new("id", "secret"))
            .build()
            .unwrap();
        assert_eq!(config.query, "Daft Punk");
        assert_eq!(config.limit, 5);
        assert_eq!(config.gait, Gait::default());
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.spotify.endpoints(), &SpotifyEndpoints::default());
    }

    #[test]
    fn builder_rejects_zero_limit() {
        let res = ConfigBuilder::new()
            .credentials(Credentials::new("id", "secret"))
            .limit(0)
            .build();
        assert!(matches!(res, Err(Error::InvalidInputError(_))));
    }

    #[test]
    fn builder_without_credentials_fails_before_any_request() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(200).body(TOKEN_BODY);
        });

        let only_id = |key: &str| (key == "SPOTIFY_CLIENT_ID").then(|| "id".to_string());
        let res = ConfigBuilder::new()
            .endpoints(SpotifyEndpoints::with_base(server.base_url()))
            .build_with_env(only_id);

        match res {
            Err(Error::ConfigurationError(msg)) => assert_eq!(
                msg,
                "Missing SPOTIFY_CLIENT_ID or SPOTIFY_CLIENT_SECRET in env"
            ),
            Err(e) => panic!("expected ConfigurationError, got: {e}"),
            Ok(_) => panic!("expected ConfigurationError, got a config"),
        }
        token_mock.assert_calls(0);
    }

    #[test]
    fn builder_resolves_credentials_from_env_lookup() {
        let config = ConfigBuilder::new()
            .build_with_env(|key| Some(format!("{key}-value")))
            .unwrap();
        assert_eq!(config.limit, 5);
    }

    #[tokio::test]
    async fn full_run_prints_token_tracks_and_cadence() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(200).body(TOKEN_BODY);
        });
        let search_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/search")
                .query_param("q", "Daft Punk")
                .query_param("limit", "5");
            then.status(200).body(
                r#"{"tracks":{"items":[
                    {"name":"One More Time","artists":[{"name":"Daft Punk"}]},
                    {"name":"Aerodynamic","artists":[]}
                ]}}"#,
            );
        });

        let (res, out) = run_to_string(&demo_for(&server)).await;

        res.unwrap();
        assert_eq!(
            out,
            "token length: 7\n\
             expires_in (sec): 3600\n \
             1) Daft Punk — One More Time\n \
             2) Unknown — Aerodynamic\n\
             Estimated cadence: 208 spm (step length: 0.77 m)\n"
        );
        token_mock.assert();
        search_mock.assert();
    }

    #[tokio::test]
    async fn empty_search_prints_notice() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(200).body(TOKEN_BODY);
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/search");
            then.status(200).body(r#"{"tracks":{"items":[]}}"#);
        });

        let (res, out) = run_to_string(&demo_for(&server)).await;

        res.unwrap();
        assert!(out.contains("\nNo tracks found.\n"), "{out}");
    }

    #[tokio::test]
    async fn search_failure_still_prints_cadence() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(200).body(TOKEN_BODY);
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/search");
            then.status(503).body("upstream unavailable");
        });

        let (res, out) = run_to_string(&demo_for(&server)).await;

        res.unwrap();
        assert!(
            out.contains("API call failed: search failed: 503 Service Unavailable: upstream unavailable"),
            "{out}"
        );
        assert!(out.ends_with("Estimated cadence: 208 spm (step length: 0.77 m)\n"));
    }

    #[tokio::test]
    async fn token_failure_is_reported_and_ends_run() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/token");
            then.status(401).body(r#"{"error":"invalid_client"}"#);
        });
        let search_mock = server.mock(|when, then| {
            when.method(GET).path("/v1/search");
            then.status(200).body(r#"{"tracks":{"items":[]}}"#);
        });

        let (res, out) = run_to_string(&demo_for(&server)).await;

        res.unwrap();
        assert_eq!(
            out,
            "Token fetch failed: status 401 Unauthorized: {\"error\":\"invalid_client\"}\n"
        );
        search_mock.assert_calls(0);
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_reported() {
        // Nothing listens on port 9 of localhost
        let config = ConfigBuilder::new()
            .credentials(Credentials::new("id", "secret"))
            .endpoints(SpotifyEndpoints::with_base("http://127.0.0.1:9"))
            .build()
            .unwrap();

        let (res, out) = run_to_string(&Demo::new(config)).await;

        res.unwrap();
        assert!(out.starts_with("Token fetch failed: Network error: "), "{out}");
        assert!(!out.contains("Estimated cadence"), "{out}");
    }
}
