//! Submission and extractor configuration

use std::path::PathBuf;
use std::time::Duration;

/// Public AcousticBrainz server
pub const DEFAULT_API_URL: &str = "https://acousticbrainz.org";

/// Tracks this long or longer are never analyzed
pub const THIRTY_MINUTES_MS: u32 = 1000 * 60 * 30;

/// Essentia build the bundled extractor was compiled from
#[cfg(target_os = "macos")]
pub const DEFAULT_ESSENTIA_BUILD_SHA: &str = "cead25079874084f62182a551b7393616cd33d87";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_ESSENTIA_BUILD_SHA: &str = "2d9f1f26377add8aeb1075a9c2973f962c4f09fd";

/// How the submission body relates to its `Content-Encoding: gzip` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadEncoding {
    /// Header is sent, bytes go out uncompressed (what existing clients do)
    #[default]
    Declared,

    /// Body is gzip-compressed on the fly
    Gzip,
}

/// Configuration for talking to the AcousticBrainz API
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Base URL, without trailing `/api/...`
    pub api_url: String,

    /// Sent as `User-Agent`
    pub user_agent: String,

    pub connect_timeout: Duration,

    pub read_timeout: Duration,

    /// Tracks with `duration_ms >= max_duration_ms` are skipped
    pub max_duration_ms: u32,

    pub payload_encoding: PayloadEncoding,

    /// Upper bound on how much of an error response body is read
    pub error_body_limit: u64,
}

impl SubmitConfig {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("abz-submit/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            max_duration_ms: THIRTY_MINUTES_MS,
            payload_encoding: PayloadEncoding::Declared,
            error_body_limit: 4 * 1024,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_payload_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.payload_encoding = encoding;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the extractor comes from and how its profile is generated
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Extractor binary to install into the scratch directory
    pub binary: PathBuf,

    /// Written into the profile as `essentia_build_sha`
    pub build_sha: String,
}

impl ExtractorConfig {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            build_sha: DEFAULT_ESSENTIA_BUILD_SHA.to_string(),
        }
    }

    pub fn with_build_sha(mut self, sha: impl Into<String>) -> Self {
        self.build_sha = sha.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SubmitConfig::default();
        assert_eq!(config.api_url, "https://acousticbrainz.org");
        assert_eq!(config.max_duration_ms, 1_800_000);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.payload_encoding, PayloadEncoding::Declared);
        assert!(config.user_agent.starts_with("abz-submit/"));
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let config = SubmitConfig::new().with_api_url("http://127.0.0.1:8080/");
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
    }
}
