//! Layered configuration for the Courier client.
//!
//! Configuration sources in order of precedence (later sources override earlier):
//! 1. Bundled defaults (courier.toml shipped with the library)
//! 2. User config in home directory (~/.config/courier/courier.toml)
//! 3. User config in current directory (./courier.toml)

use config::{Config, File, FileFormat};
use courier_cache::ResponseCacheConfig;
use courier_error::{ConfigError, CourierError, CourierResult};
use courier_fetch::{FetchConfig, RelayBuilder, RelayDirectory};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Upstream API endpoints and paging.
///
/// # Example
///
/// ```toml
/// [api]
/// base_url = "https://www.reddit.com"
/// page_size = 25
/// more_children_chunk = 20
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ApiConfig {
    /// Scheme and host of the upstream API, without trailing slash
    #[serde(default = "default_base_url")]
    #[builder(default = "default_base_url()")]
    base_url: String,

    /// Entries requested per listing or search page
    #[serde(default = "default_page_size")]
    #[builder(default = "default_page_size()")]
    page_size: u32,

    /// Child ids per batch expansion request
    #[serde(default = "default_more_children_chunk")]
    #[builder(default = "default_more_children_chunk()")]
    more_children_chunk: usize,
}

fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_more_children_chunk() -> usize {
    20
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            more_children_chunk: default_more_children_chunk(),
        }
    }
}

/// External scoring service.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ClassifierConfig {
    /// Scoring endpoint; classification is unavailable when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    endpoint: Option<String>,

    /// Item text is truncated to this many characters before sending
    #[serde(default = "default_max_text_chars")]
    #[builder(default = "default_max_text_chars()")]
    max_text_chars: usize,
}

fn default_max_text_chars() -> usize {
    500
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_text_chars: default_max_text_chars(),
        }
    }
}

/// Top-level Courier configuration.
///
/// # Example
///
/// ```no_run
/// use courier::CourierConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CourierConfig::load()?;
/// println!("Relays: {}", config.relays().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct CourierConfig {
    /// Admission, retry and deadline settings
    #[serde(default)]
    fetch: FetchConfig,

    /// Response cache settings
    #[serde(default)]
    cache: ResponseCacheConfig,

    /// Relay endpoints
    #[serde(default)]
    relays: Vec<RelayBuilder>,

    /// Upstream API settings
    #[serde(default)]
    api: ApiConfig,

    /// Scoring service settings
    #[serde(default)]
    classifier: ClassifierConfig,
}

impl CourierConfig {
    /// Assemble a configuration from its sections.
    pub fn new(
        fetch: FetchConfig,
        cache: ResponseCacheConfig,
        relays: Vec<RelayBuilder>,
        api: ApiConfig,
        classifier: ClassifierConfig,
    ) -> Self {
        Self {
            fetch,
            cache,
            relays,
            api,
            classifier,
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// Sections missing from the file take their defaults; the file must
    /// list its own relays.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> CourierResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                CourierError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                CourierError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed.
    #[instrument]
    pub fn load() -> CourierResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../courier.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/courier/courier.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("courier").required(false));

        builder
            .build()
            .map_err(|e| {
                CourierError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                CourierError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Build the relay directory described by `[[relays]]` and `[fetch]`.
    ///
    /// # Errors
    ///
    /// Returns an error if no relays are configured or none forwards bodies.
    pub fn relay_directory(&self) -> Result<RelayDirectory, ConfigError> {
        RelayDirectory::new(self.relays.clone(), *self.fetch.relay_ordering())
    }
}
