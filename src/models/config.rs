//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    /// Signs session and flash cookies; at least 64 bytes.
    pub secret: String,
    pub upload_path: String,
    /// Base URL under which stored images are publicly reachable.
    pub public_base_url: String,
    /// Base URL of the images API (`{api_base_url}/api/images`).
    pub api_base_url: String,
    #[serde(default)]
    pub secure_cookies: bool,
}
