//! Vortex Configuration
//!
//! Shared configuration crate for the Vortex client components.
//!
//! Handles loading configuration from:
//! 1. VX_CONFIG env var (explicit path)
//! 2. ./vortex.toml (current directory)
//! 3. ~/.vortex/vortex.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<VortexConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "vortex.toml";
const CONFIG_DIR_NAME: &str = ".vortex";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_GRAPHQL_URL: &str = "https://sui-testnet.mystenlabs.com/graphql";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_COIN_TYPE: &str = "0x2::sui::SUI";
const DEFAULT_PAGE_SIZE: usize = 50;
const DEFAULT_PAGE_BUDGET: usize = 20;
const DEFAULT_INBOX_PATH: &str = "./vortex-inbox.json";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VortexConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Event source endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn default_graphql_url() -> String {
    DEFAULT_GRAPHQL_URL.into()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Shielded pool identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Package that emits `vortex_events::NewCommitment`
    #[serde(default)]
    pub package_id: String,
    #[serde(default = "default_coin_type")]
    pub coin_type: String,
    /// Pool object id (hex), reduced into the field as the vortex id
    #[serde(default)]
    pub vortex_id: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            package_id: String::new(),
            coin_type: DEFAULT_COIN_TYPE.into(),
            vortex_id: String::new(),
        }
    }
}

impl PoolConfig {
    pub fn is_configured(&self) -> bool {
        !self.package_id.is_empty() && !self.vortex_id.is_empty()
    }
}

fn default_coin_type() -> String {
    DEFAULT_COIN_TYPE.into()
}

/// Event scanning policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Page ceiling for interactive scans
    #[serde(default = "default_page_budget")]
    pub page_budget: usize,
    /// Stop an interactive scan at the first page holding an owned note
    #[serde(default = "default_true")]
    pub stop_on_owned: bool,
    /// Scan the whole history before building a spend
    #[serde(default = "default_true")]
    pub full_scan_before_spend: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_budget: DEFAULT_PAGE_BUDGET,
            stop_on_owned: true,
            full_scan_before_spend: true,
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_page_budget() -> usize {
    DEFAULT_PAGE_BUDGET
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProverConfig {
    #[serde(default)]
    pub proving_key_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_inbox_path")]
    pub inbox_path: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            inbox_path: DEFAULT_INBOX_PATH.into(),
        }
    }
}

fn default_inbox_path() -> String {
    DEFAULT_INBOX_PATH.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from variable if present
fn env_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut String) {
    if let Some(v) = lookup(key) {
        *field = v;
    }
}

/// Set Option<String> from variable if present
fn env_option_string(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut Option<String>,
) {
    if let Some(v) = lookup(key) {
        *field = Some(v);
    }
}

/// Set field from variable if present and parseable
fn env_parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut T,
) {
    if let Some(parsed) = lookup(key).and_then(|v| v.parse().ok()) {
        *field = parsed;
    }
}

/// Truthy ("1" / "true") or falsy value of a variable, if set
fn env_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl VortexConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("VX_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply `VX_*` overrides read through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Network
        env_string(&lookup, "VX_GRAPHQL_URL", &mut self.network.graphql_url);
        env_parse(
            &lookup,
            "VX_REQUEST_TIMEOUT_SECS",
            &mut self.network.request_timeout_secs,
        );

        // Pool
        env_string(&lookup, "VX_PACKAGE_ID", &mut self.pool.package_id);
        env_string(&lookup, "VX_COIN_TYPE", &mut self.pool.coin_type);
        env_string(&lookup, "VX_VORTEX_ID", &mut self.pool.vortex_id);

        // Scan
        env_parse(&lookup, "VX_PAGE_SIZE", &mut self.scan.page_size);
        env_parse(&lookup, "VX_PAGE_BUDGET", &mut self.scan.page_budget);
        if let Some(v) = env_bool(&lookup, "VX_STOP_ON_OWNED") {
            self.scan.stop_on_owned = v;
        }
        if let Some(v) = env_bool(&lookup, "VX_FULL_SCAN") {
            self.scan.full_scan_before_spend = v;
        }

        // Prover / wallet
        env_option_string(&lookup, "VX_PROVING_KEY", &mut self.prover.proving_key_path);
        env_string(&lookup, "VX_INBOX_PATH", &mut self.wallet.inbox_path);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.pool.package_id = "0x<package-id>".into();
        sample.pool.vortex_id = "0x<vortex-pool-object-id>".into();
        sample.prover.proving_key_path = Some("./keys/proving_key.bin".into());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static VortexConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: VortexConfig) -> Result<(), VortexConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `VortexConfig::global()`.
#[inline]
pub fn global_config() -> &'static VortexConfig {
    VortexConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
