use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the checkout client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Payment backend settings
    pub backend: BackendConfig,
    /// Checkout defaults
    pub checkout: CheckoutDefaults,
    /// Reader discovery settings
    pub terminal: TerminalConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the payment backend
    pub host: String,
    /// Per-request timeout for backend calls
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutDefaults {
    /// Amount in the currency's minor unit
    pub amount: u64,
    /// Three-letter ISO currency code, lowercase
    pub currency: String,
    /// Prefix of the generated intent description, followed by a timestamp
    pub description_prefix: String,
    /// Report backend transport failures in the status text as well as the log
    pub surface_backend_errors: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Discover simulated readers instead of physical ones
    pub simulated: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of human readable ones
    pub json_logs: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:4567".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for CheckoutDefaults {
    fn default() -> Self {
        Self {
            amount: 4800,
            currency: "usd".to_string(),
            description_prefix: "Test at".to_string(),
            surface_backend_errors: true,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self { simulated: true }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            checkout: CheckoutDefaults::default(),
            terminal: TerminalConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (terminal-checkout.toml, .terminal-checkout-rc)
    /// 3. Environment variables (prefixed with TERMINAL_CHECKOUT__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`CheckoutConfig::load`] but looks for the files in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_path = dir.join("terminal-checkout.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".terminal-checkout-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("TERMINAL_CHECKOUT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let checkout_config: CheckoutConfig = config.try_deserialize()?;

        Ok(checkout_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CheckoutConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = CheckoutConfig::load_env_file();
        CheckoutConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static CheckoutConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let config = config()?;
    tracing::info!(backend = %config.backend.host, "Configuration loaded successfully");
    Ok(())
}
