use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where the grading/auth service lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// When set, signup requires every email to end with `@<domain>`.
    pub allowed_email_domain: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_url(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            allowed_email_domain: None,
        }
    }
}

/// # Panics
///
/// Panics if `DEFAULT_API_URL` does not parse; covered by tests.
fn default_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default api url is valid")
}

impl ApiConfig {
    /// Read `CICADA_API_URL`, `CICADA_API_TIMEOUT_SECS` and `CICADA_EMAIL_DOMAIN`.
    ///
    /// Invalid values are logged and replaced with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("CICADA_API_URL").filter(|raw| !raw.trim().is_empty()) {
            match Url::parse(raw.trim()) {
                Ok(url) => config.base_url = url,
                Err(err) => warn!(value = %raw, error = %err, "invalid CICADA_API_URL, using default"),
            }
        }

        if let Some(raw) = lookup("CICADA_API_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "invalid CICADA_API_TIMEOUT_SECS, using default"),
            }
        }

        config.allowed_email_domain = lookup("CICADA_EMAIL_DOMAIN")
            .map(|raw| raw.trim().trim_start_matches('@').to_ascii_lowercase())
            .filter(|domain| !domain.is_empty());

        config
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Delays used by the progression controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionTiming {
    /// Interval between countdown ticks.
    pub tick: Duration,
    /// Pause between a solved part and showing the next one.
    pub advance_delay: Duration,
    /// Pause between a solved level and returning to the map.
    pub completion_delay: Duration,
}

impl Default for ProgressionTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            advance_delay: Duration::from_secs(1),
            completion_delay: Duration::from_millis(1200),
        }
    }
}

impl ProgressionTiming {
    /// No waiting at all.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            tick: Duration::ZERO,
            advance_delay: Duration::ZERO,
            completion_delay: Duration::ZERO,
        }
    }
}
