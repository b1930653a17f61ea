//! Configuration management for Docforge Server

use serde::Deserialize;
use std::env;

/// Default request body limit for uploads (100 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL advertised in the service index
    pub public_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required on every request when set
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserConfig {
    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub executable_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                public_url: "http://localhost:3000".to_string(),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            auth: AuthConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = parse_or_default("PORT", 3000u16);

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
                public_url: env::var("API_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{}", port)),
                max_upload_bytes: parse_or_default("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            auth: AuthConfig {
                api_key: non_empty_var("API_KEY"),
            },
            browser: BrowserConfig {
                executable_path: non_empty_var("BROWSER_EXECUTABLE_PATH")
                    .or_else(|| non_empty_var("PUPPETEER_EXECUTABLE_PATH")),
            },
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.auth.api_key.is_none());
        assert!(config.browser.executable_path.is_none());
    }

    #[test]
    fn test_parse_or_default_falls_back() {
        // Unset key
        assert_eq!(parse_or_default("DOCFORGE_TEST_UNSET_KEY", 42u16), 42);
    }
}
