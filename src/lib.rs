//! Spotify Cadence - search the Spotify catalog and estimate running cadence
//!
//! This library exchanges Spotify client credentials for a bearer token,
//! runs a single track search, and computes a closed-form cadence estimate
//! from height and speed.

/// Closed-form cadence estimate
pub mod cadence;
/// Client modules for interacting with the Spotify Web API
pub mod clients;
/// Sequential run of token exchange, search and cadence estimate
pub mod demo;
