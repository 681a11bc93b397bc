use std::fmt;

use serde::Deserialize;

/// Placeholder shown when a track comes back without any artist.
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// Artist credited on a track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Artist {
    /// Display name.
    pub name: String,
}

/// A catalog track as returned by the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Track {
    /// Track title.
    pub name: String,
    /// Credited artists, main artist first.
    pub artists: Vec<Artist>,
}

impl Track {
    /// Name of the first listed artist, or [`UNKNOWN_ARTIST`].
    pub fn primary_artist(&self) -> &str {
        self.artists
            .first()
            .map_or(UNKNOWN_ARTIST, |a| a.name.as_str())
    }
}

/// Bearer token returned by the client-credentials exchange.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Token {
    /// Opaque bearer credential.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// Usually `Bearer`.
    pub token_type: String,
}

// Keep the token itself out of logs
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &format!("<{} chars>", self.access_token.len()))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Ranked search results, in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackListing {
    /// Tracks in upstream order.
    pub tracks: Vec<Track>,
}

impl TrackListing {
    /// Wrap `tracks` without reordering them.
    pub fn new(tracks: Vec<Track>) -> Self {
        TrackListing { tracks }
    }

    /// True when the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// One display line per track, 1-indexed, or a single "no results" notice.
    pub fn lines(&self) -> Vec<String> {
        if self.tracks.is_empty() {
            return vec!["No tracks found.".to_string()];
        }
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{:2}) {} — {}", i + 1, t.primary_artist(), t.name))
            .collect()
    }
}

impl From<Vec<Track>> for TrackListing {
    fn from(tracks: Vec<Track>) -> Self {
        TrackListing::new(tracks)
    }
}
