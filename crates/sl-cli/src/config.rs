//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::FixedOffset;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sl_core::checkin::{DEFAULT_ANNOUNCE_THRESHOLD_MINUTES, DEFAULT_GRACE_PERIOD_MINUTES};
use sl_core::{CheckInWindow, Locale};

/// Upper bound for the countdown refresh; the display has minute granularity.
const MAX_REFRESH_INTERVAL_SECS: u64 = 60;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the booking backend.
    pub api_url: String,

    /// Bearer token for the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Locale for day labels, e.g. `en_US` or `fr_FR`.
    pub locale: String,

    /// Fixed display offset such as `+02:00`. System local time when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,

    /// Minutes before start when check-in opens, unless the exhibition overrides it.
    pub grace_period_minutes: u32,

    /// Longest wait, in minutes, for which a countdown is shown.
    pub announce_threshold_minutes: u32,

    /// Seconds between countdown refreshes in `sl watch`.
    pub refresh_interval_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("locale", &self.locale)
            .field("utc_offset", &self.utc_offset)
            .field("grace_period_minutes", &self.grace_period_minutes)
            .field("announce_threshold_minutes", &self.announce_threshold_minutes)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            api_token: None,
            locale: "en_US".to_string(),
            utc_offset: None,
            grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
            announce_threshold_minutes: DEFAULT_ANNOUNCE_THRESHOLD_MINUTES,
            refresh_interval_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SL_*)
        figment = figment.merge(Env::prefixed("SL_"));

        figment.extract()
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_REFRESH_INTERVAL_SECS).contains(&self.refresh_interval_secs) {
            bail!(
                "refresh_interval_secs must be between 1 and {MAX_REFRESH_INTERVAL_SECS}, got {}",
                self.refresh_interval_secs
            );
        }
        self.locale()?;
        self.display_offset()?;
        Ok(())
    }

    pub fn locale(&self) -> Result<Locale> {
        self.locale
            .parse::<Locale>()
            .map_err(|_| anyhow::anyhow!("unknown locale: {}", self.locale))
    }

    /// The fixed display offset, or `None` for system local time.
    pub fn display_offset(&self) -> Result<Option<FixedOffset>> {
        self.utc_offset
            .as_deref()
            .map(|raw| {
                raw.parse::<FixedOffset>()
                    .with_context(|| format!("invalid utc_offset: {raw}"))
            })
            .transpose()
    }

    /// Check-in window used unless an exhibition sets its own grace period.
    pub const fn check_in_window(&self) -> CheckInWindow {
        CheckInWindow {
            grace_period_minutes: self.grace_period_minutes,
            announce_threshold_minutes: self.announce_threshold_minutes,
        }
    }

    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Builds the API client, requiring a configured token.
    pub fn client(&self) -> Result<sl_api::Client> {
        let token = self
            .api_token
            .as_deref()
            .context("api_token is not configured (set it in config.toml or SL_API_TOKEN)")?;
        sl_api::Client::new(&self.api_url, token).context("failed to create API client")
    }
}

/// Returns the platform-specific config directory for sl.
///
/// On Linux: `~/.config/sl`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sl"))
}
