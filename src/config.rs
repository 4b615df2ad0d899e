use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Start offset applied when a video does not carry a usable one (seconds)
pub const DEFAULT_START_OFFSET_SECONDS: f64 = 15.0;

/// Stop this many seconds before the end when a video does not say otherwise
pub const DEFAULT_END_OFFSET_SECONDS: f64 = 3.0;

/// Configuration for the workout player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Default playback offsets
    pub offsets: OffsetConfig,

    /// Readiness, polling and fallback timers
    pub timing: TimingConfig,

    /// Embed platform settings
    pub embed: EmbedConfig,

    /// Catalog location
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetConfig {
    /// Seconds into the video where playback starts
    pub default_start_offset: f64,

    /// Seconds before the end where playback is paused
    pub default_end_offset: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait after the embed load signal before registering (ms)
    pub settle_delay_ms: u64,

    /// Start settling anyway if no load signal arrived by then (ms)
    pub load_fallback_ms: u64,

    /// Delay before the autoplay command (ms)
    pub autoplay_delay_ms: u64,

    /// Duration / current-time poll period (ms)
    pub telemetry_poll_ms: u64,

    /// Player-state poll period while auto-advance is engaged (ms)
    pub state_poll_ms: u64,

    /// Wall-clock completion fallback for auto-advancing sessions (ms)
    pub completion_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Base path the video identifier is appended to
    pub embed_base: String,

    /// Thumbnail base, `<base>/<id>/hqdefault.jpg`
    pub thumbnail_base: String,

    /// Origins accepted verbatim for inbound messages
    pub trusted_origins: Vec<String>,

    /// Any origin containing this string is also accepted
    pub trusted_domain: String,

    /// Reference sent with the `listening` registration
    pub page_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the catalog JSON file
    pub path: PathBuf,
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn load_fallback(&self) -> Duration {
        Duration::from_millis(self.load_fallback_ms)
    }

    pub fn autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.autoplay_delay_ms)
    }

    /// Never shorter than 1 ms
    pub fn telemetry_poll(&self) -> Duration {
        Duration::from_millis(self.telemetry_poll_ms.max(1))
    }

    /// Never shorter than 1 ms
    pub fn state_poll(&self) -> Duration {
        Duration::from_millis(self.state_poll_ms.max(1))
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }
}

impl PlayerConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "workout-player.toml",
            "config/workout-player.toml",
            "/etc/workout-player/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load a configuration file from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(offset) = std::env::var("WORKOUT_PLAYER_START_OFFSET") {
            config.offsets.default_start_offset = offset
                .parse()
                .unwrap_or(DEFAULT_START_OFFSET_SECONDS);
        }

        if let Ok(offset) = std::env::var("WORKOUT_PLAYER_END_OFFSET") {
            config.offsets.default_end_offset = offset
                .parse()
                .unwrap_or(DEFAULT_END_OFFSET_SECONDS);
        }

        if let Ok(timeout) = std::env::var("WORKOUT_PLAYER_COMPLETION_TIMEOUT_MS") {
            config.timing.completion_timeout_ms = timeout.parse().unwrap_or(65_000);
        }

        if let Ok(catalog) = std::env::var("WORKOUT_PLAYER_CATALOG") {
            config.catalog.path = PathBuf::from(catalog);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let offsets = [
            ("default_start_offset", self.offsets.default_start_offset),
            ("default_end_offset", self.offsets.default_end_offset),
        ];
        for (name, value) in offsets {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("{} must be a non-negative number", name));
            }
        }

        if self.timing.telemetry_poll_ms == 0 || self.timing.state_poll_ms == 0 {
            return Err(anyhow!("poll periods must be greater than 0"));
        }

        if self.timing.completion_timeout_ms == 0 {
            return Err(anyhow!("completion_timeout_ms must be greater than 0"));
        }

        url::Url::parse(&self.embed.embed_base)
            .map_err(|e| anyhow!("Invalid embed_base {}: {}", self.embed.embed_base, e))?;

        if self.embed.trusted_origins.is_empty() && self.embed.trusted_domain.is_empty() {
            return Err(anyhow!("At least one trusted origin is required"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Workout Player Configuration:\n\
            - Start Offset: {}s\n\
            - End Offset: {}s\n\
            - Settle Delay: {}ms\n\
            - Telemetry Poll: {}ms\n\
            - Completion Timeout: {}ms\n\
            - Embed Base: {}\n\
            - Catalog: {}",
            self.offsets.default_start_offset,
            self.offsets.default_end_offset,
            self.timing.settle_delay_ms,
            self.timing.telemetry_poll_ms,
            self.timing.completion_timeout_ms,
            self.embed.embed_base,
            self.catalog.path.display()
        )
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            offsets: OffsetConfig {
                default_start_offset: DEFAULT_START_OFFSET_SECONDS,
                default_end_offset: DEFAULT_END_OFFSET_SECONDS,
            },
            timing: TimingConfig {
                settle_delay_ms: 1500,
                load_fallback_ms: 1500,
                autoplay_delay_ms: 800,
                telemetry_poll_ms: 500,
                state_poll_ms: 2000,
                completion_timeout_ms: 65_000, // Shorts rarely report ENDED
            },
            embed: EmbedConfig {
                embed_base: "https://www.youtube.com/embed".to_string(),
                thumbnail_base: "https://img.youtube.com/vi".to_string(),
                trusted_origins: vec![
                    "https://www.youtube.com".to_string(),
                    "https://www.youtube-nocookie.com".to_string(),
                ],
                trusted_domain: "youtube.com".to_string(),
                page_reference: "workout-player".to_string(),
            },
            catalog: CatalogConfig {
                path: PathBuf::from("data/catalog.json"),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: PlayerConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PlayerConfig::default(),
        }
    }

    pub fn with_default_offsets(mut self, start: f64, end: f64) -> Self {
        self.config.offsets.default_start_offset = start;
        self.config.offsets.default_end_offset = end;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.config.timing.settle_delay_ms = whole_millis(delay);
        self
    }

    pub fn with_load_fallback(mut self, delay: Duration) -> Self {
        self.config.timing.load_fallback_ms = whole_millis(delay);
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.timing.completion_timeout_ms = whole_millis(timeout);
        self
    }

    pub fn with_poll_periods(mut self, telemetry: Duration, state: Duration) -> Self {
        self.config.timing.telemetry_poll_ms = whole_millis(telemetry);
        self.config.timing.state_poll_ms = whole_millis(state);
        self
    }

    pub fn with_page_reference(mut self, reference: impl Into<String>) -> Self {
        self.config.embed.page_reference = reference.into();
        self
    }

    pub fn with_catalog(mut self, path: PathBuf) -> Self {
        self.config.catalog.path = path;
        self
    }

    pub fn build(self) -> PlayerConfig {
        self.config
    }
}

/// Milliseconds rounded up, so a non-zero duration never becomes 0
fn whole_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis() as u64;
    if Duration::from_millis(millis) < duration {
        millis + 1
    } else {
        millis
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.offsets.default_start_offset, 15.0);
        assert_eq!(config.offsets.default_end_offset, 3.0);
        assert_eq!(config.timing.completion_timeout(), Duration::from_secs(65));
        assert_eq!(config.timing.settle_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_default_offsets(10.0, 5.0)
            .with_completion_timeout(Duration::from_secs(5))
            .with_page_reference("https://example.test/#/category/legs")
            .build();

        assert_eq!(config.offsets.default_start_offset, 10.0);
        assert_eq!(config.offsets.default_end_offset, 5.0);
        assert_eq!(config.timing.completion_timeout_ms, 5000);
        assert_eq!(config.embed.page_reference, "https://example.test/#/category/legs");
    }

    #[test]
    fn test_config_validation() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());

        let negative = ConfigBuilder::new().with_default_offsets(-1.0, 3.0).build();
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_sub_millisecond_periods_round_up() {
        let config = ConfigBuilder::new()
            .with_poll_periods(Duration::from_micros(500), Duration::from_millis(2000))
            .with_settle_delay(Duration::from_micros(1500))
            .build();
        assert_eq!(config.timing.telemetry_poll_ms, 1);
        assert_eq!(config.timing.state_poll_ms, 2000);
        assert_eq!(config.timing.settle_delay_ms, 2);
        assert!(config.validate().is_ok());

        let mut zero = PlayerConfig::default();
        zero.timing.telemetry_poll_ms = 0;
        assert_eq!(zero.timing.telemetry_poll(), Duration::from_millis(1));
    }

    #[test]
    fn test_config_toml_roundtrip_keeps_timing() {
        let config = ConfigBuilder::new()
            .with_settle_delay(Duration::from_millis(250))
            .build();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: PlayerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.timing.settle_delay_ms, 250);
        assert_eq!(parsed.embed.trusted_origins.len(), 2);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("workout-player.toml");

        let config = ConfigBuilder::new()
            .with_default_offsets(20.0, 4.0)
            .with_catalog(PathBuf::from("/srv/catalog.json"))
            .build();
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = PlayerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.offsets.default_start_offset, 20.0);
        assert_eq!(loaded.offsets.default_end_offset, 4.0);
        assert_eq!(loaded.catalog.path, PathBuf::from("/srv/catalog.json"));

        assert!(PlayerConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
