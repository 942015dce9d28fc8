//! Spotify Web API catalog client.
//!
//! Search uses `GET /search` restricted to tracks with a limit of one, so a
//! query yields at most one URI. Audio features come from
//! `GET /audio-features`, which accepts up to 100 comma-separated bare ids
//! and answers with a parallel array containing `null` for unknown tracks.
//!
//! The client takes an already-issued bearer token; obtaining one is left to
//! the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use cadenza_core::{FeatureSet, TrackId};

use crate::catalog::resilience::{RateLimiter, RetryPolicy};
use crate::catalog::{CatalogService, TrackQuery};
use crate::config::Config;
use crate::error::{CatalogError, CatalogResult};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

// ---------------------------------------------------------------------------
// API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<FeatureSet>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Spotify Web API client.
///
/// Every request goes through a [`RateLimiter`] and is retried with
/// exponential backoff while it fails transiently (429, 5xx, timeouts,
/// refused connections).
#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    api_base: String,
    access_token: String,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl SpotifyClient {
    /// Create a client with default pacing (10 req/sec, 3 retries).
    pub fn new(access_token: impl Into<String>) -> CatalogResult<Self> {
        let http = Client::builder()
            .user_agent("cadenza/0.1.0 (https://github.com/oxur/cadenza)")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_base: SPOTIFY_API_BASE.to_string(),
            access_token: access_token.into(),
            rate_limiter: RateLimiter::new(10),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns [`CatalogError::Unauthorized`] when no access token is
    /// configured.
    pub fn from_config(config: &Config) -> CatalogResult<Self> {
        let token = config
            .spotify_access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CatalogError::Unauthorized {
                message: "no Spotify access token configured".to_string(),
            })?;

        Ok(Self::new(token)?
            .with_api_base(config.spotify_api_base.clone())
            .with_rate_limit(config.requests_per_second)
            .with_retry(RetryPolicy::new(config.max_retries)))
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limiter = RateLimiter::new(requests_per_second);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> CatalogResult<T> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(format!("{}/{}", self.api_base, endpoint))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Unauthorized {
                message: format!("{status}: {message}"),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Http {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json().await.map_err(|e| CatalogError::Parse {
            message: e.to_string(),
        })
    }

    async fn search_once(&self, query: &TrackQuery) -> CatalogResult<Option<TrackId>> {
        let q = query.to_string();
        let result: SearchResponse = self
            .get_json("search", &[("q", q.as_str()), ("type", "track"), ("limit", "1")])
            .await?;

        Ok(result
            .tracks
            .items
            .into_iter()
            .next()
            .map(|item| TrackId::new(item.uri)))
    }

    async fn features_once(&self, ids: &[TrackId]) -> CatalogResult<Vec<Option<FeatureSet>>> {
        let joined = ids.iter().map(TrackId::bare).collect::<Vec<_>>().join(",");
        let result: AudioFeaturesResponse = self
            .get_json("audio-features", &[("ids", joined.as_str())])
            .await?;

        Ok(result.audio_features)
    }
}

#[async_trait]
impl CatalogService for SpotifyClient {
    async fn search_track(&self, query: &TrackQuery) -> CatalogResult<Option<TrackId>> {
        self.retry
            .run("track search", || self.search_once(query))
            .await
    }

    async fn audio_features(&self, ids: &[TrackId]) -> CatalogResult<Vec<Option<FeatureSet>>> {
        self.retry
            .run("audio-features lookup", || self.features_once(ids))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::TrackIdentity;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a local port and return the
    /// base URL to point the client at.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: String) -> SpotifyClient {
        SpotifyClient {
            http: Client::builder().no_proxy().build().unwrap(),
            api_base: base,
            access_token: "test-token".to_string(),
            rate_limiter: RateLimiter::new(1000),
            retry: RetryPolicy::new(0),
        }
    }

    /// Accept one connection and never answer it.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{addr}")
    }

    fn query() -> TrackQuery {
        TrackQuery::from_identity(&TrackIdentity::new("Artist A", "Song X"))
    }

    #[test]
    fn test_from_config_requires_token() {
        let config = Config::default();
        let err = SpotifyClient::from_config(&config).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_from_config_with_token() {
        let config = Config {
            spotify_access_token: Some("abc".to_string()),
            ..Config::default()
        };
        let client = SpotifyClient::from_config(&config).unwrap();
        assert_eq!(client.api_base, SPOTIFY_API_BASE);
    }

    #[test]
    fn test_with_api_base_trims_trailing_slash() {
        let client = SpotifyClient::new("t")
            .unwrap()
            .with_api_base("http://localhost:9999/v1/");
        assert_eq!(client.api_base, "http://localhost:9999/v1");
    }

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{"tracks": {"items": [{"uri": "spotify:track:abc", "name": "Song X"}]}}"#;
        let result: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.tracks.items[0].uri, "spotify:track:abc");
    }

    #[test]
    fn test_audio_features_response_with_nulls() {
        let json = r#"{"audio_features": [null, {"danceability": 0.5, "energy": 0.4,
            "loudness": -5.0, "speechiness": 0.1, "acousticness": 0.2,
            "instrumentalness": 0.0, "liveness": 0.3, "valence": 0.6, "tempo": 120.0,
            "id": "abc", "type": "audio_features"}]}"#;
        let result: AudioFeaturesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.audio_features.len(), 2);
        assert!(result.audio_features[0].is_none());
        assert_eq!(result.audio_features[1].unwrap().tempo, 120.0);
    }

    #[tokio::test]
    async fn test_search_returns_first_uri() {
        let base = serve_once(
            "200 OK",
            r#"{"tracks": {"items": [{"uri": "spotify:track:abc"}]}}"#,
        )
        .await;
        let found = client(base).search_track(&query()).await.unwrap();
        assert_eq!(found, Some(TrackId::new("spotify:track:abc")));
    }

    #[tokio::test]
    async fn test_search_without_match() {
        let base = serve_once("200 OK", r#"{"tracks": {"items": []}}"#).await;
        let found = client(base).search_track(&query()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_fatal() {
        let base = serve_once("401 Unauthorized", r#"{"error": "expired"}"#).await;
        let err = client(base).search_track(&query()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_client_error_is_per_item() {
        let base = serve_once("404 Not Found", "{}").await;
        let err = client(base)
            .audio_features(&[TrackId::new("spotify:track:abc")])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Http { status: Some(404), .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_timeout_is_fatal() {
        let base = serve_silence().await;
        let mut client = client(base);
        client.http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let err = client.search_track(&query()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Connection { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_server_error_after_retries_is_fatal() {
        let base = serve_once("503 Service Unavailable", "{}").await;
        let err = client(base)
            .audio_features(&[TrackId::new("spotify:track:abc")])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Http { status: Some(503), .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let base = serve_once("200 OK", "not json").await;
        let err = client(base).search_track(&query()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
