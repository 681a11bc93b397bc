/// Data entities for tracks, artists and tokens
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Spotify Web API client
pub mod spotify;

pub use spotify::SpotifyClient;
