use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TravelError};

/// Top-level configuration for Travel Buddy.
///
/// Loaded from `~/.travel-buddy/config.toml` by default. Credentials are
/// usually left out of the file and supplied through the environment
/// (see [`TravelConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl TravelConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TravelConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay credentials and endpoints from process environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.completion.endpoint = v;
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT_NAME") {
            self.completion.deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.completion.api_version = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.completion.api_key = v;
        }
        if let Some(v) = get("GOOGLE_PLACES_API_KEY") {
            self.places.api_key = v;
        }
        if let Some(v) = get("TRAVEL_BUDDY_API_TOKEN") {
            self.general.api_token = Some(v);
        }
        if let Some(v) = get("TRAVEL_BUDDY_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.general.port = port,
                Err(_) => warn!(value = %v, "Ignoring invalid TRAVEL_BUDDY_PORT"),
            }
        }
    }

    /// Check that the configuration is complete enough to serve requests.
    ///
    /// Any error here is fatal: the binary refuses to start rather than run
    /// with a partially configured client.
    pub fn validate(&self) -> Result<()> {
        let c = &self.completion;
        if c.endpoint.trim().is_empty() {
            return Err(TravelError::Config("completion.endpoint is not set".into()));
        }
        if !(c.endpoint.starts_with("https://") || c.endpoint.starts_with("http://")) {
            return Err(TravelError::Config(format!(
                "completion.endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.deployment.trim().is_empty() {
            return Err(TravelError::Config("completion.deployment is not set".into()));
        }
        if c.api_key.trim().is_empty() {
            return Err(TravelError::Config("completion.api_key is not set".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(TravelError::Config(format!(
                "completion.temperature must be within 0.0..=2.0, got {}",
                c.temperature
            )));
        }

        if self.places.api_key.trim().is_empty() {
            return Err(TravelError::Config("places.api_key is not set".into()));
        }
        if self.places.max_requests_per_second == 0 || self.places.max_requests_per_day == 0 {
            return Err(TravelError::Config("places request limits must be positive".into()));
        }
        if self.places.max_results == 0 {
            return Err(TravelError::Config("places.max_results must be positive".into()));
        }

        let s = &self.search;
        if s.min_radius_m == 0 || s.min_radius_m > s.max_radius_m {
            return Err(TravelError::Config(format!(
                "search radius bounds are invalid: min {} m, max {} m",
                s.min_radius_m, s.max_radius_m
            )));
        }
        s.check_radius(s.default_radius_m)?;

        if self.session.max_history_turns == 0 {
            return Err(TravelError::Config("session.max_history_turns must be positive".into()));
        }
        if self.session.retained_turns == 0 {
            return Err(TravelError::Config("session.retained_turns must be positive".into()));
        }
        if self.http.request_timeout_secs == 0 {
            return Err(TravelError::Config("http.request_timeout_secs must be positive".into()));
        }
        if self.http.max_retries > MAX_RETRIES {
            return Err(TravelError::Config(format!(
                "http.max_retries must be at most {}, got {}",
                MAX_RETRIES, self.http.max_retries
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the HTTP API binds to.
    pub bind_address: String,
    pub port: u16,
    /// Bearer token required on API calls. `None` disables authentication.
    pub api_token: Option<String>,
    /// Inbound API requests allowed per second.
    pub requests_per_second: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            api_token: None,
            requests_per_second: 50,
        }
    }
}

/// Azure OpenAI chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// Deployment (model) name.
    pub deployment: String,
    pub api_version: String,
    pub api_key: String,
    pub temperature: f32,
    /// Token cap for conversational replies.
    pub max_tokens: u32,
    /// Token cap for the intent classification call.
    pub classification_max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: String::new(),
            api_version: "2023-12-01-preview".to_string(),
            api_key: String::new(),
            temperature: 0.7,
            max_tokens: 1500,
            classification_max_tokens: 300,
        }
    }
}

/// Google Places settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub base_url: String,
    pub api_key: String,
    pub max_requests_per_second: u32,
    pub max_requests_per_day: u32,
    /// Results kept after filtering and ranking.
    pub max_results: usize,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            api_key: String::new(),
            max_requests_per_second: 10,
            max_requests_per_day: 100_000,
            max_results: 10,
        }
    }
}

/// Search radius bounds, in meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_radius_m: u32,
    pub min_radius_m: u32,
    pub max_radius_m: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_m: 50_000,
            min_radius_m: 100,
            max_radius_m: 100_000,
        }
    }
}

impl SearchConfig {
    /// Return `radius_m` if it lies within the configured bounds.
    pub fn check_radius(&self, radius_m: u32) -> Result<u32> {
        if radius_m < self.min_radius_m || radius_m > self.max_radius_m {
            return Err(TravelError::RadiusOutOfBounds {
                value: radius_m,
                min: self.min_radius_m,
                max: self.max_radius_m,
            });
        }
        Ok(radius_m)
    }

    /// Force `radius_m` into the configured bounds.
    pub fn clamp_radius(&self, radius_m: u32) -> u32 {
        radius_m.clamp(self.min_radius_m, self.max_radius_m)
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Most recent turns sent to the completion client as context.
    pub max_history_turns: usize,
    /// Turns kept per session before the oldest are dropped.
    pub retained_turns: usize,
    /// Sessions idle longer than this are expired by the sweep.
    pub idle_timeout_minutes: u32,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
            retained_turns: 20,
            idle_timeout_minutes: 60,
            sweep_interval_secs: 300,
        }
    }
}

/// Upper bound on [`HttpConfig::max_retries`]: one retry of a transient
/// failure, never more.
pub const MAX_RETRIES: u32 = 1;

/// Outbound HTTP behaviour shared by both API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    /// Delay before the single retry of a transient failure.
    pub retry_backoff_ms: u64,
    /// Retries after the first attempt, at most [`MAX_RETRIES`]; 0 disables
    /// retrying.
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            retry_backoff_ms: 500,
            max_retries: 1,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
