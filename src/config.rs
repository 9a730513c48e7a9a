//! Backend configuration

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;
use tracing::debug;

/// Environment variable selecting the backend origin
pub const BACKEND_URL_ENV: &str = "STOPOVER_BACKEND_URL";

/// Backend used when nothing is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8084";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    backend_url: String,
}

impl Config {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
        }
    }

    /// Read `STOPOVER_BACKEND_URL`, falling back to the local development backend
    pub fn from_env() -> Self {
        match std::env::var(BACKEND_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                debug!(backend_url = %url, "Using backend from environment");
                Self::new(url.trim())
            }
            _ => Self::default(),
        }
    }

    /// The backend address as configured, used in connection error messages
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// API root, always ending in `/api`.
    ///
    /// `http://localhost:8084`, `http://localhost:8084/` and
    /// `http://localhost:8080/api/flights` all resolve to `<origin>/api`.
    pub fn api_base(&self) -> String {
        normalize_api_base(&self.backend_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

fn api_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/api(?:/.*)?$").expect("valid api segment regex"))
}

fn normalize_api_base(raw: &str) -> String {
    if let Some(url) = Url::parse(raw).ok().filter(|u| u.has_host()) {
        return format!("{}/api", url.origin().ascii_serialization());
    }

    // Not an absolute URL: treat it as an origin string
    let origin = raw.trim_end_matches('/');
    if api_segment().is_match(origin) {
        api_segment().replace(origin, "/api").into_owned()
    } else {
        format!("{}/api", origin)
    }
}
